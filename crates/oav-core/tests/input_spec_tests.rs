use oav_core::document;
use oav_core::document::parameter::{Parameter, ParameterLocation};
use oav_core::inputs::{
    ArrayItemKind, ArrayStyle, ControlKind, ParamValue, ScalarValue, ValueKind,
    resolve_initial_value, resolve_parameter_input_spec, serialize_value,
};
use serde_json::json;

const PETSTORE: &str = include_str!("fixtures/petstore.yaml");

fn list_pets_parameters() -> Vec<Parameter> {
    let spec = document::from_yaml(PETSTORE).unwrap();
    spec.paths["/pets"].get.as_ref().unwrap().parameters.clone()
}

fn parameter(yaml: &str) -> Parameter {
    serde_yaml_ng::from_str(yaml).unwrap()
}

#[test]
fn bounded_integer_becomes_slider() {
    let params = list_pets_parameters();
    let spec = resolve_parameter_input_spec(&params[0], ParameterLocation::Query);
    assert_eq!(spec.control, ControlKind::Slider);
    assert_eq!(spec.value_kind, ValueKind::Integer);
    assert_eq!(spec.min, Some(1.0));
    assert_eq!(spec.max, Some(50.0));
}

#[test]
fn wide_range_falls_back_to_number() {
    let param = parameter(
        "{ name: count, in: query, schema: { type: integer, minimum: 0, maximum: 5000 } }",
    );
    let spec = resolve_parameter_input_spec(&param, ParameterLocation::Query);
    assert_eq!(spec.control, ControlKind::Number);
}

#[test]
fn enum_becomes_select() {
    let params = list_pets_parameters();
    let spec = resolve_parameter_input_spec(&params[1], ParameterLocation::Query);
    assert_eq!(spec.control, ControlKind::Select);
    assert_eq!(spec.options.len(), 3);
    assert_eq!(spec.options[0].value, ScalarValue::Text("available".to_string()));
    assert_eq!(spec.placeholder, "Select value");
}

#[test]
fn small_item_enum_becomes_checkbox_group() {
    let params = list_pets_parameters();
    let spec = resolve_parameter_input_spec(&params[2], ParameterLocation::Query);
    assert_eq!(spec.control, ControlKind::CheckboxGroup);
    assert!(spec.multiple);
    assert_eq!(spec.array_item_kind(), ArrayItemKind::String);
    // Query with explode serializes one key per entry.
    assert_eq!(spec.hint.array_style, ArrayStyle::Multi);
}

#[test]
fn large_item_enum_becomes_multi_select() {
    let param = parameter(
        "{ name: fields, in: query, schema: { type: array, items: { type: string, enum: [a, b, c, d, e, f, g, h] } } }",
    );
    let spec = resolve_parameter_input_spec(&param, ParameterLocation::Query);
    assert_eq!(spec.control, ControlKind::MultiSelect);
}

#[test]
fn plain_array_is_comma_separated_text() {
    let param = parameter("{ name: ids, in: query, schema: { type: array, items: { type: integer } } }");
    let spec = resolve_parameter_input_spec(&param, ParameterLocation::Query);
    assert_eq!(spec.control, ControlKind::Text);
    assert_eq!(spec.placeholder, "Comma-separated values");
    assert_eq!(spec.array_item_kind(), ArrayItemKind::Integer);
}

#[test]
fn boolean_becomes_toggle() {
    let params = list_pets_parameters();
    let spec = resolve_parameter_input_spec(&params[3], ParameterLocation::Query);
    assert_eq!(spec.control, ControlKind::Boolean);
    assert_eq!(spec.value_kind, ValueKind::Boolean);
}

#[test]
fn explode_defaults_by_location() {
    let array = "{ name: x, schema: { type: array, items: { type: string } } }";

    let query = resolve_parameter_input_spec(&parameter(array), ParameterLocation::Query);
    assert!(query.hint.explode);
    assert_eq!(query.hint.array_style, ArrayStyle::Multi);

    let header = resolve_parameter_input_spec(&parameter(array), ParameterLocation::Header);
    assert!(!header.hint.explode);
    assert_eq!(header.hint.array_style, ArrayStyle::Csv);

    let path = resolve_parameter_input_spec(&parameter(array), ParameterLocation::Path);
    assert!(!path.hint.explode);
}

#[test]
fn date_formats_get_date_control() {
    let date = parameter("{ name: from, in: query, schema: { type: string, format: date } }");
    let spec = resolve_parameter_input_spec(&date, ParameterLocation::Query);
    assert_eq!(spec.control, ControlKind::Date);
    assert_eq!(spec.value_kind, ValueKind::Date);

    let stamp = parameter("{ name: at, in: query, schema: { type: string, format: date-time } }");
    let spec = resolve_parameter_input_spec(&stamp, ParameterLocation::Query);
    assert_eq!(spec.value_kind, ValueKind::DateTime);
}

#[test]
fn long_max_length_gets_textarea() {
    let param = parameter("{ name: notes, in: query, schema: { type: string, maxLength: 500 } }");
    let spec = resolve_parameter_input_spec(&param, ParameterLocation::Query);
    assert_eq!(spec.control, ControlKind::Textarea);
}

#[test]
fn initial_values_follow_the_spec_shape() {
    let params = list_pets_parameters();

    // Multi-valued: comma-split string seeds.
    let tags = resolve_parameter_input_spec(&params[2], ParameterLocation::Query);
    let value = resolve_initial_value(&tags, Some(&json!("cute, fast")));
    assert_eq!(
        value,
        ParamValue::List(vec![
            ScalarValue::Text("cute".to_string()),
            ScalarValue::Text("fast".to_string()),
        ])
    );

    // Slider without a seed snaps to its minimum.
    let limit = resolve_parameter_input_spec(&params[0], ParameterLocation::Query);
    assert_eq!(
        resolve_initial_value(&limit, None),
        ParamValue::Scalar(ScalarValue::Integer(1))
    );

    // Select without a seed stays unset.
    let status = resolve_parameter_input_spec(&params[1], ParameterLocation::Query);
    assert_eq!(resolve_initial_value(&status, None), ParamValue::Null);
}

#[test]
fn serialization_drops_blank_entries() {
    let params = list_pets_parameters();
    let tags = resolve_parameter_input_spec(&params[2], ParameterLocation::Query);

    let value = ParamValue::List(vec![
        ScalarValue::Text("cute".to_string()),
        ScalarValue::Text("  ".to_string()),
        ScalarValue::Integer(3),
    ]);
    assert_eq!(serialize_value(&tags, &value), vec!["cute", "3"]);

    let limit = resolve_parameter_input_spec(&params[0], ParameterLocation::Query);
    assert_eq!(
        serialize_value(&limit, &ParamValue::Scalar(ScalarValue::Integer(25))),
        vec!["25"]
    );
    assert!(serialize_value(&limit, &ParamValue::Null).is_empty());
}
