use oav_core::document;
use oav_core::inputs::{
    ControlKind, ParamValue, ROOT_BODY_PATH, ScalarValue, build_initial_values,
    build_payload_from_values, hydrate_values_from_payload, resolve_body_form_inputs,
};
use serde_json::json;

const PETSTORE: &str = include_str!("fixtures/petstore.yaml");

fn fixture() -> oav_core::document::spec::OpenApiDocument {
    document::from_yaml(PETSTORE).expect("fixture should parse")
}

fn body_schema(yaml: &str) -> oav_core::document::schema::Schema {
    serde_yaml_ng::from_str(yaml).unwrap()
}

#[test]
fn object_schema_flattens_to_leaf_inputs() {
    let spec = fixture();
    let components = spec.components_or_default();

    let resolution =
        resolve_body_form_inputs(Some(&components.schemas["NewPet"]), &components);
    let paths: Vec<&str> = resolution
        .inputs
        .iter()
        .map(|input| input.path.as_str())
        .collect();

    assert!(paths.contains(&"id"));
    assert!(paths.contains(&"name"));
    assert!(paths.contains(&"category.id"));
    assert!(paths.contains(&"category.name"));
    assert!(paths.contains(&"status"));

    let status = resolution
        .inputs
        .iter()
        .find(|input| input.path == "status")
        .unwrap();
    assert_eq!(status.spec.control, ControlKind::Select);
    assert_eq!(status.seed, Some(json!("available")));
    assert!(status.required);
    assert_eq!(status.label, "status");

    // Optional branch: category is not in NewPet's required list, so its
    // leaves are optional even though nothing inside says so.
    let category_name = resolution
        .inputs
        .iter()
        .find(|input| input.path == "category.name")
        .unwrap();
    assert!(!category_name.required);
}

#[test]
fn self_referential_property_warns_instead_of_recursing() {
    let spec = fixture();
    let components = spec.components_or_default();

    let resolution = resolve_body_form_inputs(Some(&components.schemas["NewPet"]), &components);
    assert!(
        resolution
            .warnings
            .iter()
            .any(|warning| warning.contains("circular $ref")),
        "expected a cycle warning, got {:?}",
        resolution.warnings
    );
}

#[test]
fn scalar_body_becomes_single_root_input() {
    let spec = fixture();
    let components = spec.components_or_default();

    let resolution =
        resolve_body_form_inputs(Some(&body_schema("type: string")), &components);
    assert_eq!(resolution.inputs.len(), 1);
    assert_eq!(resolution.inputs[0].path, ROOT_BODY_PATH);
    assert_eq!(resolution.inputs[0].label, "Body");
}

#[test]
fn array_of_objects_synthesizes_first_element() {
    let spec = fixture();
    let components = spec.components_or_default();

    let schema = body_schema(
        "{ type: array, items: { type: object, required: [sku], properties: { sku: { type: string } } } }",
    );
    let resolution = resolve_body_form_inputs(Some(&schema), &components);
    assert_eq!(resolution.inputs.len(), 1);
    assert_eq!(resolution.inputs[0].path, "[0].sku");
}

#[test]
fn empty_object_body_warns() {
    let spec = fixture();
    let components = spec.components_or_default();

    let resolution = resolve_body_form_inputs(Some(&body_schema("type: object")), &components);
    assert!(resolution.inputs.is_empty());
    assert!(
        resolution
            .warnings
            .iter()
            .any(|warning| warning.contains("has no properties"))
    );
}

#[test]
fn payload_round_trip_through_flat_values() {
    let spec = fixture();
    let components = spec.components_or_default();

    let schema = body_schema(
        "{ type: object, required: [name], properties: { name: { type: string }, specs: { type: object, properties: { weight: { type: number } } }, tags: { type: array, items: { type: string } } } }",
    );
    let resolution = resolve_body_form_inputs(Some(&schema), &components);
    let mut values = build_initial_values(&resolution.inputs);

    // Nothing filled in yet: no payload at all.
    assert_eq!(build_payload_from_values(&resolution.inputs, &values), None);

    values.insert(
        "name".to_string(),
        ParamValue::Scalar(ScalarValue::Text("Rex".to_string())),
    );
    values.insert(
        "specs.weight".to_string(),
        ParamValue::Scalar(ScalarValue::Number(12.5)),
    );
    values.insert(
        "tags".to_string(),
        ParamValue::List(vec![ScalarValue::Text("cute".to_string())]),
    );

    let payload = build_payload_from_values(&resolution.inputs, &values).unwrap();
    assert_eq!(
        payload,
        json!({ "name": "Rex", "specs": { "weight": 12.5 }, "tags": ["cute"] })
    );

    // Hydrating from an edited payload overwrites the touched paths only.
    let edited = json!({ "name": "Fido" });
    let hydrated = hydrate_values_from_payload(&resolution.inputs, &edited, &values);
    assert!(hydrated.warnings.is_empty());
    assert_eq!(
        hydrated.values["name"],
        ParamValue::Scalar(ScalarValue::Text("Fido".to_string()))
    );
    assert_eq!(
        hydrated.values["specs.weight"],
        ParamValue::Scalar(ScalarValue::Number(12.5))
    );
}

#[test]
fn array_index_paths_build_json_arrays() {
    let spec = fixture();
    let components = spec.components_or_default();

    let schema = body_schema(
        "{ type: array, items: { type: object, properties: { sku: { type: string } } } }",
    );
    let resolution = resolve_body_form_inputs(Some(&schema), &components);
    let mut values = build_initial_values(&resolution.inputs);
    values.insert(
        "[0].sku".to_string(),
        ParamValue::Scalar(ScalarValue::Text("A-1".to_string())),
    );

    let payload = build_payload_from_values(&resolution.inputs, &values).unwrap();
    assert_eq!(payload, json!([{ "sku": "A-1" }]));
}

#[test]
fn non_object_payload_keeps_values_and_warns() {
    let spec = fixture();
    let components = spec.components_or_default();

    let schema = body_schema(
        "{ type: object, properties: { name: { type: string } } }",
    );
    let resolution = resolve_body_form_inputs(Some(&schema), &components);
    let values = build_initial_values(&resolution.inputs);

    let hydrated = hydrate_values_from_payload(&resolution.inputs, &json!([1, 2]), &values);
    assert_eq!(hydrated.values, values);
    assert_eq!(
        hydrated.warnings,
        vec!["JSON payload is not an object; form fields were kept unchanged"]
    );
}
