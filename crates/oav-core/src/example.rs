//! Representative example values for schema nodes.
//!
//! Shares the resolver's cycle and depth protections but degrades silently:
//! circular nodes are valid in OpenAPI and produce `null` without noise.

use std::collections::HashSet;

use serde_json::{Map, Value, json};

use crate::document::components::Components;
use crate::document::schema::{Schema, SchemaType};
use crate::resolve::{MAX_RESOLUTION_DEPTH, strip_ref_prefix};

#[derive(Debug, Default)]
struct ExampleState {
    depth: usize,
    ref_stack: HashSet<String>,
    node_stack: Vec<usize>,
}

/// Produce a JSON-compatible example value for a schema node.
///
/// Never fails; the worst case is `Value::Null`.
pub fn generate_example(schema: Option<&Schema>, components: &Components) -> Value {
    match schema {
        Some(schema) => generate_inner(schema, components, &mut ExampleState::default()),
        None => Value::Null,
    }
}

fn generate_inner(schema: &Schema, components: &Components, state: &mut ExampleState) -> Value {
    if state.depth > MAX_RESOLUTION_DEPTH {
        log::warn!(
            "example generation depth limit reached at {} levels",
            state.depth
        );
        return Value::Null;
    }

    let address = schema as *const Schema as usize;
    if state.node_stack.contains(&address) {
        // Circular schema nodes are valid in OpenAPI; stop recursion silently.
        return Value::Null;
    }

    state.node_stack.push(address);
    state.depth += 1;
    let value = generate_unguarded(schema, components, state);
    state.depth -= 1;
    state.node_stack.pop();
    value
}

fn generate_unguarded(schema: &Schema, components: &Components, state: &mut ExampleState) -> Value {
    if let Some(example) = &schema.example {
        return example.clone();
    }
    if let Some(default) = &schema.default_value {
        return default.clone();
    }

    if let Some(reference) = schema.reference.as_deref() {
        let name = strip_ref_prefix(reference);
        if state.ref_stack.contains(name) {
            return Value::Null;
        }

        if let Some(target) = components.schemas.get(name) {
            state.ref_stack.insert(name.to_string());
            let value = generate_inner(target, components, state);
            state.ref_stack.remove(name);
            return value;
        }
        // Missing target: fall through to whatever the ref site carries.
    }

    if !schema.all_of.is_empty() {
        return merge_member_examples(&schema.all_of, components, state);
    }

    if let Some(first) = schema.one_of.first() {
        return generate_inner(first, components, state);
    }

    if !schema.any_of.is_empty() {
        return merge_member_examples(&schema.any_of, components, state);
    }

    match schema.primary_type() {
        Some(SchemaType::Object) => {
            let mut result = Map::new();
            for (name, property) in &schema.properties {
                result.insert(name.clone(), generate_inner(property, components, state));
            }
            Value::Object(result)
        }
        Some(SchemaType::Array) => match &schema.items {
            Some(items) => Value::Array(vec![generate_inner(items, components, state)]),
            None => Value::Array(vec![Value::Null]),
        },
        Some(SchemaType::String) => {
            if schema.format.as_deref() == Some("date-time") {
                Value::String(chrono::Utc::now().to_rfc3339())
            } else {
                Value::String("string".to_string())
            }
        }
        Some(SchemaType::Number) | Some(SchemaType::Integer) => json!(123),
        Some(SchemaType::Boolean) => Value::Bool(true),
        _ => Value::Null,
    }
}

/// Key-union of the member examples; non-object members contribute nothing.
fn merge_member_examples(
    members: &[Schema],
    components: &Components,
    state: &mut ExampleState,
) -> Value {
    let mut merged = Map::new();
    for member in members {
        if let Value::Object(part) = generate_inner(member, components, state) {
            for (key, value) in part {
                merged.insert(key, value);
            }
        }
    }
    Value::Object(merged)
}
