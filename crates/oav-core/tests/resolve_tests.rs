use oav_core::document;
use oav_core::document::schema::SchemaType;
use oav_core::resolve::{ResolveState, resolve_schema_node};

const PETSTORE: &str = include_str!("fixtures/petstore.yaml");

fn fixture() -> oav_core::document::spec::OpenApiDocument {
    document::from_yaml(PETSTORE).expect("fixture should parse")
}

#[test]
fn ref_resolves_with_sibling_overlay() {
    let spec = fixture();
    let components = spec.components_or_default();
    let pet = &components.schemas["Pet"];

    let mut state = ResolveState::new();
    let resolved = resolve_schema_node(&pet.properties["category"], &components, &mut state);

    // Target shape comes through, the ref-site description wins.
    assert_eq!(resolved.primary_type(), Some(SchemaType::Object));
    assert!(resolved.properties.contains_key("id"));
    assert_eq!(
        resolved.description.as_deref(),
        Some("Category override at the reference site")
    );
    assert!(resolved.reference.is_none());
    assert!(state.warnings.is_empty());
}

#[test]
fn all_of_members_merge() {
    let spec = fixture();
    let components = spec.components_or_default();

    let mut state = ResolveState::new();
    let resolved = resolve_schema_node(&components.schemas["NewPet"], &components, &mut state);

    assert!(resolved.all_of.is_empty());
    for key in ["id", "name", "category", "status"] {
        assert!(resolved.properties.contains_key(key), "missing {key}");
    }
    assert_eq!(resolved.required, vec!["id", "name", "status"]);
}

#[test]
fn one_of_picks_first_variant_with_warning() {
    let spec = fixture();
    let components = spec.components_or_default();

    let mut state = ResolveState::new();
    let resolved = resolve_schema_node(&components.schemas["PetOrError"], &components, &mut state);

    assert!(resolved.properties.contains_key("name"));
    assert!(!resolved.properties.contains_key("message"));
    assert!(
        state
            .warnings
            .iter()
            .any(|warning| warning.contains("oneOf detected")),
        "expected a oneOf warning, got {:?}",
        state.warnings.to_messages()
    );
}

#[test]
fn circular_ref_degrades_to_empty_with_warning() {
    let yaml = r##"
openapi: "3.1.0"
paths: {}
components:
  schemas:
    A:
      $ref: "#/components/schemas/A"
"##;
    let spec = document::from_yaml(yaml).unwrap();
    let components = spec.components_or_default();

    // A fresh ref site pointing at the self-referential schema.
    let site: oav_core::document::schema::Schema =
        serde_yaml_ng::from_str("$ref: \"#/components/schemas/A\"").unwrap();

    let mut state = ResolveState::new();
    let resolved = resolve_schema_node(&site, &components, &mut state);

    assert!(resolved.properties.is_empty());
    assert!(resolved.reference.is_none());
    assert!(
        state
            .warnings
            .iter()
            .any(|warning| warning.contains("circular $ref detected for \"A\""))
    );
}

#[test]
fn mutually_referencing_nodes_stop_on_node_cycle() {
    let yaml = r##"
openapi: "3.1.0"
paths: {}
components:
  schemas:
    A:
      $ref: "#/components/schemas/B"
    B:
      $ref: "#/components/schemas/A"
"##;
    let spec = document::from_yaml(yaml).unwrap();
    let components = spec.components_or_default();

    let mut state = ResolveState::new();
    let resolved = resolve_schema_node(&components.schemas["A"], &components, &mut state);

    assert!(resolved.properties.is_empty());
    assert!(
        state
            .warnings
            .iter()
            .any(|warning| warning.contains("circular schema node"))
    );
}

#[test]
fn missing_ref_target_keeps_ref_site() {
    let yaml = r##"
openapi: "3.1.0"
paths: {}
components:
  schemas:
    Orphan:
      $ref: "#/components/schemas/Ghost"
      description: still here
"##;
    let spec = document::from_yaml(yaml).unwrap();
    let components = spec.components_or_default();

    let mut state = ResolveState::new();
    let resolved = resolve_schema_node(&components.schemas["Orphan"], &components, &mut state);

    assert!(resolved.reference.is_none());
    assert_eq!(resolved.description.as_deref(), Some("still here"));
    assert!(
        state
            .warnings
            .iter()
            .any(|warning| warning.contains("$ref target not found for \"Ghost\""))
    );
}

#[test]
fn warnings_deduplicate() {
    let yaml = r##"
openapi: "3.1.0"
paths: {}
components:
  schemas:
    Wrapper:
      type: object
      properties:
        left:
          $ref: "#/components/schemas/Ghost"
        right:
          $ref: "#/components/schemas/Ghost"
"##;
    let spec = document::from_yaml(yaml).unwrap();
    let components = spec.components_or_default();

    let mut state = ResolveState::new();
    let wrapper = &components.schemas["Wrapper"];
    resolve_schema_node(&wrapper.properties["left"], &components, &mut state);
    resolve_schema_node(&wrapper.properties["right"], &components, &mut state);

    assert_eq!(state.warnings.len(), 1);
}
