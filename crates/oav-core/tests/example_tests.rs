use oav_core::document;
use oav_core::example::generate_example;
use serde_json::{Value, json};

const PETSTORE: &str = include_str!("fixtures/petstore.yaml");

fn fixture() -> oav_core::document::spec::OpenApiDocument {
    document::from_yaml(PETSTORE).expect("fixture should parse")
}

#[test]
fn explicit_examples_win() {
    let spec = fixture();
    let components = spec.components_or_default();

    let value = generate_example(Some(&components.schemas["Pet"]), &components);
    let object = value.as_object().expect("should be an object");
    assert_eq!(object["id"], json!(7));
    assert_eq!(object["name"], json!("Rex"));
    // Nested ref with its own example.
    assert_eq!(object["category"]["name"], json!("dogs"));
}

#[test]
fn all_of_unions_member_examples() {
    let spec = fixture();
    let components = spec.components_or_default();

    let value = generate_example(Some(&components.schemas["NewPet"]), &components);
    let object = value.as_object().expect("should be an object");
    assert_eq!(object["id"], json!(7));
    // The second member's default is the status example.
    assert_eq!(object["status"], json!("available"));
}

#[test]
fn circular_refs_degrade_to_null() {
    let spec = fixture();
    let components = spec.components_or_default();

    let value = generate_example(Some(&components.schemas["Loop"]), &components);
    assert_eq!(value["next"], Value::Null);
}

#[test]
fn one_of_uses_first_variant() {
    let spec = fixture();
    let components = spec.components_or_default();

    let value = generate_example(Some(&components.schemas["PetOrError"]), &components);
    assert_eq!(value["name"], json!("Rex"));
    assert!(value.get("message").is_none());
}

#[test]
fn type_fallbacks() {
    let spec = fixture();
    let components = spec.components_or_default();

    let schema = |yaml: &str| -> oav_core::document::schema::Schema {
        serde_yaml_ng::from_str(yaml).unwrap()
    };

    assert_eq!(
        generate_example(Some(&schema("type: string")), &components),
        json!("string")
    );
    assert_eq!(
        generate_example(Some(&schema("type: integer")), &components),
        json!(123)
    );
    assert_eq!(
        generate_example(Some(&schema("type: boolean")), &components),
        json!(true)
    );
    assert_eq!(
        generate_example(Some(&schema("{ type: array, items: { type: integer } }")), &components),
        json!([123])
    );
    assert_eq!(generate_example(None, &components), Value::Null);

    let timestamp =
        generate_example(Some(&schema("{ type: string, format: date-time }")), &components);
    let text = timestamp.as_str().expect("date-time example is a string");
    assert!(text.contains('T'), "expected RFC 3339 text, got {text}");
}
