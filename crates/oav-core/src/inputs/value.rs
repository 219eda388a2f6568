//! The closed value model for UI-bound parameter and body-form values, and
//! the permissive coercion ladder that turns arbitrary JSON seeds into it.
//!
//! Coercion never fails: genuinely unusable seeds (non-finite numbers, wrong
//! shape for a multi-valued control) collapse to empty with a logged
//! diagnostic.

use serde_json::Value;

use super::spec::{ArrayItemKind, ControlKind, ResolvedParameterInputSpec, ValueKind};

/// One scalar a control can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Text(String),
    Number(f64),
    Integer(i64),
    Bool(bool),
}

impl ScalarValue {
    /// Render for display or option labels.
    pub fn to_display_string(&self) -> String {
        match self {
            ScalarValue::Text(text) => text.clone(),
            ScalarValue::Number(number) => number.to_string(),
            ScalarValue::Integer(integer) => integer.to_string(),
            ScalarValue::Bool(flag) => flag.to_string(),
        }
    }
}

/// A live parameter/body-field value: nothing, one scalar, or a list.
///
/// A spec with `multiple=true` always pairs with `List`, never a bare
/// scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Null,
    Scalar(ScalarValue),
    List(Vec<ScalarValue>),
}

impl ParamValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ParamValue::Null)
    }
}

/// Parse a finite number out of a JSON number or numeric string.
pub fn to_finite_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64().filter(|n| n.is_finite()),
        Value::String(text) => text.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Parse a boolean out of a JSON bool, the words true/false, or 0/1.
pub fn to_bool_or_none(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) => match text.trim().to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        Value::Number(number) => match number.as_f64() {
            Some(n) if n == 1.0 => Some(true),
            Some(n) if n == 0.0 => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Integer-valued floats canonicalize to `Integer` so option matching and
/// serialization treat `2` and `2.0` alike.
fn canonical_number(number: f64) -> ScalarValue {
    if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
        ScalarValue::Integer(number as i64)
    } else {
        ScalarValue::Number(number)
    }
}

/// Coerce one JSON value into a scalar suitable for a collection entry.
/// Blank strings, nulls, and non-finite numbers drop out.
pub fn normalize_collection_item(value: &Value) -> Option<ScalarValue> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(ScalarValue::Text(trimmed.to_string()))
            }
        }
        Value::Number(number) => number
            .as_f64()
            .filter(|n| n.is_finite())
            .map(canonical_number),
        Value::Bool(flag) => Some(ScalarValue::Bool(*flag)),
        Value::Null => None,
        other => Some(ScalarValue::Text(other.to_string())),
    }
}

fn scalar_to_finite_number(value: &ScalarValue) -> Option<f64> {
    match value {
        ScalarValue::Number(number) if number.is_finite() => Some(*number),
        ScalarValue::Number(_) => None,
        ScalarValue::Integer(integer) => Some(*integer as f64),
        ScalarValue::Text(text) => text.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        ScalarValue::Bool(_) => None,
    }
}

fn scalar_to_bool(value: &ScalarValue) -> Option<bool> {
    match value {
        ScalarValue::Bool(flag) => Some(*flag),
        ScalarValue::Text(text) => match text.trim().to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        ScalarValue::Integer(1) => Some(true),
        ScalarValue::Integer(0) => Some(false),
        ScalarValue::Number(n) if *n == 1.0 => Some(true),
        ScalarValue::Number(n) if *n == 0.0 => Some(false),
        _ => None,
    }
}

/// Re-type a collection entry for the declared array item kind; entries the
/// kind cannot absorb drop out.
pub fn normalize_array_item_by_kind(
    item_kind: ArrayItemKind,
    value: ScalarValue,
) -> Option<ScalarValue> {
    match item_kind {
        ArrayItemKind::Integer => {
            scalar_to_finite_number(&value).map(|n| ScalarValue::Integer(n.trunc() as i64))
        }
        ArrayItemKind::Number => scalar_to_finite_number(&value).map(canonical_number),
        ArrayItemKind::Boolean => scalar_to_bool(&value).map(ScalarValue::Bool),
        ArrayItemKind::String => match value {
            ScalarValue::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(ScalarValue::Text(trimmed.to_string()))
                }
            }
            other => Some(other),
        },
    }
}

/// Build a list value from an arbitrary seed: arrays element-wise, strings
/// by comma-splitting, any other scalar as a single entry.
pub fn normalize_array_seed(seed: &Value, item_kind: ArrayItemKind) -> Vec<ScalarValue> {
    let normalize_list = |items: Vec<ScalarValue>| -> Vec<ScalarValue> {
        items
            .into_iter()
            .filter_map(|item| normalize_array_item_by_kind(item_kind, item))
            .collect()
    };

    match seed {
        Value::Array(entries) => normalize_list(
            entries
                .iter()
                .filter_map(normalize_collection_item)
                .collect(),
        ),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Vec::new();
            }
            if trimmed.contains(',') {
                return normalize_list(
                    trimmed
                        .split(',')
                        .map(str::trim)
                        .filter(|part| !part.is_empty())
                        .map(|part| ScalarValue::Text(part.to_string()))
                        .collect(),
                );
            }
            normalize_list(vec![ScalarValue::Text(trimmed.to_string())])
        }
        other => match normalize_collection_item(other) {
            Some(single) => normalize_list(vec![single]),
            None => Vec::new(),
        },
    }
}

/// Render an arbitrary seed as editor text.
pub fn normalize_string_seed(seed: &Value) -> String {
    match seed {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

fn normalize_scalar_by_spec(spec: &ResolvedParameterInputSpec, seed: &Value) -> ParamValue {
    if seed.is_null()
        && matches!(spec.control, ControlKind::Select | ControlKind::RadioGroup)
    {
        return ParamValue::Null;
    }

    if spec.value_kind == ValueKind::Boolean {
        return match to_bool_or_none(seed) {
            Some(flag) => ParamValue::Scalar(ScalarValue::Bool(flag)),
            None => ParamValue::Null,
        };
    }

    if matches!(spec.value_kind, ValueKind::Number | ValueKind::Integer) {
        let Some(numeric) = to_finite_number(seed) else {
            // Sliders always have a position; everything else stays unset.
            if spec.control == ControlKind::Slider {
                let fallback = spec.min.unwrap_or(0.0);
                return ParamValue::Scalar(numeric_scalar(spec.value_kind, fallback));
            }
            return ParamValue::Null;
        };
        return ParamValue::Scalar(numeric_scalar(spec.value_kind, numeric));
    }

    let mut text = normalize_string_seed(seed);
    if spec.control == ControlKind::Date {
        if let Some((date, _)) = text.split_once('T') {
            text = date.to_string();
        }
    }
    ParamValue::Scalar(ScalarValue::Text(text))
}

fn numeric_scalar(kind: ValueKind, numeric: f64) -> ScalarValue {
    if kind == ValueKind::Integer {
        ScalarValue::Integer(numeric.trunc() as i64)
    } else {
        canonical_number(numeric)
    }
}

/// Seed a control's initial value from a schema default/example.
pub fn resolve_initial_value(spec: &ResolvedParameterInputSpec, seed: Option<&Value>) -> ParamValue {
    let seed = seed.unwrap_or(&Value::Null);
    if spec.multiple {
        return ParamValue::List(normalize_array_seed(seed, spec.array_item_kind()));
    }
    normalize_scalar_by_spec(spec, seed)
}

fn stringify_collection_item(value: &ScalarValue) -> String {
    match value {
        ScalarValue::Text(text) => text.trim().to_string(),
        ScalarValue::Number(number) => {
            if number.is_finite() {
                number.to_string()
            } else {
                String::new()
            }
        }
        ScalarValue::Integer(integer) => integer.to_string(),
        ScalarValue::Bool(flag) => flag.to_string(),
    }
}

/// Serialize a value into the wire strings for its control.
///
/// Multi-valued controls yield one entry per element; scalars yield zero or
/// one entries. Shape mismatches are logged and treated as empty.
pub fn serialize_value(spec: &ResolvedParameterInputSpec, value: &ParamValue) -> Vec<String> {
    if spec.multiple {
        return match value {
            ParamValue::List(entries) => entries
                .iter()
                .map(stringify_collection_item)
                .filter(|entry| !entry.is_empty())
                .collect(),
            ParamValue::Null => Vec::new(),
            ParamValue::Scalar(_) => {
                log::warn!(
                    "expected array value for multi-valued {:?} control",
                    spec.control
                );
                Vec::new()
            }
        };
    }

    match value {
        ParamValue::Null => Vec::new(),
        ParamValue::Scalar(ScalarValue::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Vec::new()
            } else {
                vec![trimmed.to_string()]
            }
        }
        ParamValue::Scalar(ScalarValue::Number(number)) => {
            if number.is_finite() {
                vec![number.to_string()]
            } else {
                log::warn!("non-finite numeric parameter value dropped during serialization");
                Vec::new()
            }
        }
        ParamValue::Scalar(ScalarValue::Integer(integer)) => vec![integer.to_string()],
        ParamValue::Scalar(ScalarValue::Bool(flag)) => vec![flag.to_string()],
        ParamValue::List(_) => {
            log::warn!(
                "unexpected list value for single-valued {:?} control",
                spec.control
            );
            Vec::new()
        }
    }
}

/// Whether a value counts as "not filled in" for payload assembly and
/// missing-parameter checks.
pub fn is_value_empty(spec: &ResolvedParameterInputSpec, value: &ParamValue) -> bool {
    if spec.multiple {
        return match value {
            ParamValue::List(entries) => entries.is_empty(),
            _ => true,
        };
    }

    match spec.value_kind {
        ValueKind::Boolean => !matches!(value, ParamValue::Scalar(ScalarValue::Bool(_))),
        ValueKind::Number | ValueKind::Integer => match value {
            ParamValue::Scalar(ScalarValue::Number(number)) => !number.is_finite(),
            ParamValue::Scalar(ScalarValue::Integer(_)) => false,
            _ => true,
        },
        _ => match value {
            ParamValue::Scalar(ScalarValue::Text(text)) => text.trim().is_empty(),
            _ => true,
        },
    }
}

/// Convert a live value back into JSON for payload assembly.
pub fn param_value_to_json(value: &ParamValue) -> Value {
    match value {
        ParamValue::Null => Value::Null,
        ParamValue::Scalar(scalar) => scalar_to_json(scalar),
        ParamValue::List(entries) => Value::Array(entries.iter().map(scalar_to_json).collect()),
    }
}

fn scalar_to_json(value: &ScalarValue) -> Value {
    match value {
        ScalarValue::Text(text) => Value::String(text.clone()),
        ScalarValue::Number(number) => serde_json::Number::from_f64(*number)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ScalarValue::Integer(integer) => Value::Number((*integer).into()),
        ScalarValue::Bool(flag) => Value::Bool(*flag),
    }
}
