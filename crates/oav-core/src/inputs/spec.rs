//! Control inference: mapping a parameter's effective schema to a typed,
//! bounded UI control descriptor.

use serde_json::Value;

use crate::document::parameter::{Parameter, ParameterLocation};
use crate::document::schema::{Schema, SchemaType};

use super::value::ScalarValue;

/// Item-enum size above which a checkbox group becomes a multi-select.
pub const MULTI_SELECT_THRESHOLD: usize = 7;
/// `maxLength` above which free text gets a textarea.
pub const TEXTAREA_MAX_LENGTH_THRESHOLD: f64 = 240.0;
/// Largest `maximum - minimum` range rendered as a slider.
pub const SLIDER_RANGE_LIMIT: f64 = 100.0;

/// The control a parameter or body field renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Text,
    Textarea,
    Number,
    Boolean,
    Select,
    MultiSelect,
    CheckboxGroup,
    RadioGroup,
    Date,
    Time,
    Slider,
}

/// The logical kind of value the control edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Date,
    DateTime,
    Time,
    Unknown,
}

/// Element kind for multi-valued controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayItemKind {
    String,
    Number,
    Integer,
    Boolean,
}

/// How an array parameter serializes onto the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayStyle {
    /// One key, comma-joined values.
    Csv,
    /// The key repeats once per value.
    Multi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializationHint {
    pub array_style: ArrayStyle,
    pub explode: bool,
}

/// One selectable option derived from an enum.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamOption {
    pub label: String,
    pub value: ScalarValue,
}

/// Derived, immutable control descriptor for one parameter or body field.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParameterInputSpec {
    pub control: ControlKind,
    pub value_kind: ValueKind,
    pub array_item_kind: Option<ArrayItemKind>,
    pub multiple: bool,
    pub format: Option<String>,
    pub placeholder: String,
    pub options: Vec<ParamOption>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
    pub hint: SerializationHint,
}

impl ResolvedParameterInputSpec {
    pub fn array_item_kind(&self) -> ArrayItemKind {
        self.array_item_kind.unwrap_or(ArrayItemKind::String)
    }
}

fn infer_explode(location: ParameterLocation, parameter: &Parameter) -> bool {
    if let Some(explode) = parameter.explode {
        return explode;
    }
    !matches!(
        location,
        ParameterLocation::Path | ParameterLocation::Header
    )
}

fn build_serialization_hint(
    location: ParameterLocation,
    parameter: &Parameter,
) -> SerializationHint {
    let explode = infer_explode(location, parameter);
    let array_style = if location == ParameterLocation::Query && explode {
        ArrayStyle::Multi
    } else {
        ArrayStyle::Csv
    };
    SerializationHint {
        array_style,
        explode,
    }
}

/// Map enum values to options; `null` entries are dropped.
fn map_enum_to_options(values: &[Value]) -> Vec<ParamOption> {
    values
        .iter()
        .filter_map(|value| match value {
            Value::Null => None,
            Value::String(text) => Some(ScalarValue::Text(text.clone())),
            Value::Number(number) => number.as_f64().filter(|n| n.is_finite()).map(|n| {
                if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
                    ScalarValue::Integer(n as i64)
                } else {
                    ScalarValue::Number(n)
                }
            }),
            Value::Bool(flag) => Some(ScalarValue::Bool(*flag)),
            other => Some(ScalarValue::Text(other.to_string())),
        })
        .map(|value| ParamOption {
            label: value.to_display_string(),
            value,
        })
        .collect()
}

fn resolve_array_control(options_count: usize) -> ControlKind {
    if options_count == 0 {
        ControlKind::Text
    } else if options_count <= MULTI_SELECT_THRESHOLD {
        ControlKind::CheckboxGroup
    } else {
        ControlKind::MultiSelect
    }
}

fn scalar_value_kind(raw_type: SchemaType) -> ValueKind {
    match raw_type {
        SchemaType::Integer => ValueKind::Integer,
        SchemaType::Number => ValueKind::Number,
        SchemaType::Boolean => ValueKind::Boolean,
        SchemaType::String => ValueKind::String,
        _ => ValueKind::Unknown,
    }
}

fn array_item_kind(raw_type: SchemaType) -> ArrayItemKind {
    match raw_type {
        SchemaType::Integer => ArrayItemKind::Integer,
        SchemaType::Number => ArrayItemKind::Number,
        SchemaType::Boolean => ArrayItemKind::Boolean,
        _ => ArrayItemKind::String,
    }
}

/// Derive the control descriptor for a parameter at a location.
///
/// Pure over the parameter's effective schema; the same parameter always
/// yields the same spec.
pub fn resolve_parameter_input_spec(
    parameter: &Parameter,
    location: ParameterLocation,
) -> ResolvedParameterInputSpec {
    let empty = Schema::default();
    let schema = parameter.schema.as_ref().unwrap_or(&empty);
    let format = schema.format.clone();
    let raw_type = schema.primary_type().unwrap_or(SchemaType::String);
    let enum_options = map_enum_to_options(&schema.enum_values);
    let hint = build_serialization_hint(location, parameter);

    if raw_type == SchemaType::Array {
        let item_schema = schema.items.as_deref();
        let item_type = item_schema
            .and_then(Schema::primary_type)
            .unwrap_or(SchemaType::String);
        let item_options = map_enum_to_options(
            item_schema.map(|s| s.enum_values.as_slice()).unwrap_or(&[]),
        );

        return ResolvedParameterInputSpec {
            control: resolve_array_control(item_options.len()),
            value_kind: ValueKind::Array,
            array_item_kind: Some(array_item_kind(item_type)),
            multiple: true,
            format: item_schema.and_then(|s| s.format.clone()),
            placeholder: "Comma-separated values".to_string(),
            options: item_options,
            min: item_schema.and_then(|s| s.minimum),
            max: item_schema.and_then(|s| s.maximum),
            step: item_schema.and_then(|s| s.multiple_of),
            hint,
        };
    }

    if !enum_options.is_empty() {
        return ResolvedParameterInputSpec {
            control: ControlKind::Select,
            value_kind: scalar_value_kind(raw_type),
            array_item_kind: None,
            multiple: false,
            format,
            placeholder: "Select value".to_string(),
            options: enum_options,
            min: schema.minimum,
            max: schema.maximum,
            step: schema.multiple_of,
            hint,
        };
    }

    if raw_type == SchemaType::Boolean {
        return ResolvedParameterInputSpec {
            control: ControlKind::Boolean,
            value_kind: ValueKind::Boolean,
            array_item_kind: None,
            multiple: false,
            format,
            placeholder: "Toggle value".to_string(),
            options: Vec::new(),
            min: None,
            max: None,
            step: None,
            hint,
        };
    }

    if matches!(raw_type, SchemaType::Integer | SchemaType::Number) {
        let min = schema.minimum;
        let max = schema.maximum;
        let is_bounded_slider = match (min, max) {
            (Some(min), Some(max)) => max > min && (max - min) <= SLIDER_RANGE_LIMIT,
            _ => false,
        };

        return ResolvedParameterInputSpec {
            control: if is_bounded_slider {
                ControlKind::Slider
            } else {
                ControlKind::Number
            },
            value_kind: scalar_value_kind(raw_type),
            array_item_kind: None,
            multiple: false,
            format,
            placeholder: raw_type.as_str().to_string(),
            options: Vec::new(),
            min,
            max,
            step: schema.multiple_of,
            hint,
        };
    }

    if raw_type == SchemaType::String {
        match format.as_deref() {
            Some("date") | Some("date-time") => {
                let value_kind = if format.as_deref() == Some("date") {
                    ValueKind::Date
                } else {
                    ValueKind::DateTime
                };
                return ResolvedParameterInputSpec {
                    control: ControlKind::Date,
                    value_kind,
                    array_item_kind: None,
                    multiple: false,
                    placeholder: format.clone().unwrap_or_default(),
                    format,
                    options: Vec::new(),
                    min: None,
                    max: None,
                    step: None,
                    hint,
                };
            }
            Some("time") => {
                return ResolvedParameterInputSpec {
                    control: ControlKind::Time,
                    value_kind: ValueKind::Time,
                    array_item_kind: None,
                    multiple: false,
                    format,
                    placeholder: "HH:mm:ss".to_string(),
                    options: Vec::new(),
                    min: None,
                    max: None,
                    step: None,
                    hint,
                };
            }
            _ => {}
        }
    }

    let max_length = schema.max_length.map(|n| n as f64);
    ResolvedParameterInputSpec {
        control: if max_length.is_some_and(|n| n > TEXTAREA_MAX_LENGTH_THRESHOLD) {
            ControlKind::Textarea
        } else {
            ControlKind::Text
        },
        value_kind: ValueKind::String,
        array_item_kind: None,
        multiple: false,
        placeholder: format
            .clone()
            .unwrap_or_else(|| raw_type.as_str().to_string()),
        format,
        options: Vec::new(),
        min: None,
        max: None,
        step: None,
        hint,
    }
}
