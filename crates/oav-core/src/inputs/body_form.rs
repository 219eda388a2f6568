//! Flattening a request-body schema into a list of leaf form inputs.
//!
//! Objects recurse per property, arrays of objects synthesize a `[0]`
//! element, and every other node becomes one leaf input keyed by its value
//! path.

use serde_json::Value;

use crate::document::components::Components;
use crate::document::parameter::{Parameter, ParameterLocation};
use crate::document::schema::{Schema, SchemaType};
use crate::resolve::{MAX_RESOLUTION_DEPTH, ResolveState, resolve_schema_node, strip_ref_prefix};

use super::spec::{ResolvedParameterInputSpec, resolve_parameter_input_spec};

/// Path used when the whole body is a single leaf (a bare scalar or an array
/// of scalars).
pub const ROOT_BODY_PATH: &str = "$";

/// One leaf control in the body form.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestBodyFormInput {
    /// Stable identity, equal to `path`.
    pub key: String,
    /// Dot/index value path into the payload, or [`ROOT_BODY_PATH`].
    pub path: String,
    pub label: String,
    pub description: String,
    pub required: bool,
    pub nullable: bool,
    pub spec: ResolvedParameterInputSpec,
    /// Schema `default` or `example`, used to seed the initial value.
    pub seed: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodyFormResolution {
    pub inputs: Vec<RequestBodyFormInput>,
    pub warnings: Vec<String>,
}

/// Flatten a body schema into ordered leaf inputs.
///
/// `required` is conjunctive along the path: a leaf is required only when
/// every ancestor marks it required down from the root.
pub fn resolve_body_form_inputs(
    schema: Option<&Schema>,
    components: &Components,
) -> BodyFormResolution {
    let Some(schema) = schema else {
        return BodyFormResolution::default();
    };

    let mut walk = WalkState {
        resolver: ResolveState::new(),
        ref_trail: Vec::new(),
        depth: 0,
    };
    let mut inputs = Vec::new();
    walk_schema(schema, "", true, components, &mut walk, &mut inputs);

    BodyFormResolution {
        inputs,
        warnings: walk.resolver.warnings.into_messages(),
    }
}

struct WalkState {
    resolver: ResolveState,
    /// `$ref` names currently being expanded along the walk path. The
    /// resolver's own stacks unwind between siblings, so the walk keeps its
    /// own trail to stop self-referential properties.
    ref_trail: Vec<String>,
    depth: usize,
}

fn walk_schema(
    schema: &Schema,
    path: &str,
    required: bool,
    components: &Components,
    walk: &mut WalkState,
    collector: &mut Vec<RequestBodyFormInput>,
) {
    if walk.depth > MAX_RESOLUTION_DEPTH {
        let shown = if path.is_empty() { ROOT_BODY_PATH } else { path };
        walk.resolver.warnings.push(format!(
            "body form flattening depth limit reached at \"{shown}\"; deeper fields skipped"
        ));
        return;
    }

    let ref_name = schema.reference.as_deref().map(strip_ref_prefix);
    if let Some(name) = ref_name {
        if walk.ref_trail.iter().any(|entry| entry == name) {
            walk.resolver
                .warnings
                .push(format!("circular $ref detected for \"{name}\""));
            return;
        }
        walk.ref_trail.push(name.to_string());
    }
    walk.depth += 1;

    walk_resolved(schema, path, required, components, walk, collector);

    walk.depth -= 1;
    if ref_name.is_some() {
        walk.ref_trail.pop();
    }
}

fn walk_resolved(
    schema: &Schema,
    path: &str,
    required: bool,
    components: &Components,
    walk: &mut WalkState,
    collector: &mut Vec<RequestBodyFormInput>,
) {
    let resolved = resolve_schema_node(schema, components, &mut walk.resolver);

    match resolved.effective_type() {
        SchemaType::Object => {
            if resolved.properties.is_empty() {
                let shown = if path.is_empty() { ROOT_BODY_PATH } else { path };
                walk.resolver.warnings.push(format!(
                    "object body at \"{shown}\" has no properties; form controls skipped"
                ));
                return;
            }

            for (name, node) in &resolved.properties {
                let next_path = if path.is_empty() {
                    name.clone()
                } else {
                    format!("{path}.{name}")
                };
                let child_required = required && resolved.required.contains(name);
                walk_schema(node, &next_path, child_required, components, walk, collector);
            }
        }
        SchemaType::Array if resolved.items.is_some() => {
            let items = resolved.items.clone().unwrap_or_default();
            let item = resolve_schema_node(&items, components, &mut walk.resolver);
            if item.effective_type() == SchemaType::Object {
                let nested_path = append_array_index(path, 0);
                walk_schema(&items, &nested_path, required, components, walk, collector);
            } else {
                collector.push(to_body_input(path, &resolved, required));
            }
        }
        _ => collector.push(to_body_input(path, &resolved, required)),
    }
}

fn append_array_index(path: &str, index: usize) -> String {
    if path.is_empty() {
        format!("[{index}]")
    } else {
        format!("{path}[{index}]")
    }
}

fn to_body_input(path: &str, schema: &Schema, required: bool) -> RequestBodyFormInput {
    let path = if path.is_empty() {
        ROOT_BODY_PATH.to_string()
    } else {
        path.to_string()
    };

    // Body leaves borrow parameter control inference via a synthetic query
    // parameter; query defaults give the friendliest controls.
    let parameter = Parameter {
        name: path.clone(),
        location: ParameterLocation::Query,
        description: schema.description.clone(),
        required,
        deprecated: None,
        schema: Some(schema.clone()),
        style: None,
        explode: None,
        example: None,
    };
    let spec = resolve_parameter_input_spec(&parameter, ParameterLocation::Query);

    RequestBodyFormInput {
        key: path.clone(),
        label: humanize_label(&path),
        description: schema.description.clone().unwrap_or_default(),
        required,
        nullable: schema.nullable.unwrap_or(false),
        spec,
        seed: schema
            .default_value
            .clone()
            .or_else(|| schema.example.clone()),
        path,
    }
}

/// Turn the last path segment into a display label. The root path labels as
/// "Body"; degenerate segments fall back to "Item".
fn humanize_label(path: &str) -> String {
    if path == ROOT_BODY_PATH {
        return "Body".to_string();
    }

    let segment = path.rsplit('.').next().unwrap_or(path);
    let mut cleaned = String::with_capacity(segment.len());
    let mut chars = segment.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '[' {
            // Drop bracketed index suffixes like `[0]` or `[]`.
            for inner in chars.by_ref() {
                if inner == ']' {
                    break;
                }
            }
        } else if ch == '_' || ch == '-' {
            cleaned.push(' ');
        } else {
            cleaned.push(ch);
        }
    }

    let label = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if label.is_empty() {
        "Item".to_string()
    } else {
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn humanizes_labels() {
        assert_eq!(humanize_label("$"), "Body");
        assert_eq!(humanize_label("user.first_name"), "first name");
        assert_eq!(humanize_label("tags[0]"), "tags");
        assert_eq!(humanize_label("items[0].sku-code"), "sku code");
        assert_eq!(humanize_label("___"), "Item");
    }

    #[test]
    fn appends_array_index() {
        assert_eq!(append_array_index("", 0), "[0]");
        assert_eq!(append_array_index("items", 0), "items[0]");
    }
}
