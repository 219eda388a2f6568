//! Schema node resolution: `$ref` lookup with sibling-key overlay, `allOf`
//! deep merge, first-variant selection for `oneOf`/`anyOf`, and cycle/depth
//! protection.
//!
//! Resolution is lossy on purpose (it feeds example generation and form
//! derivation, not validation) and it never fails: pathological schemas
//! degrade to an empty node and a recorded warning.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::document::components::Components;
use crate::document::schema::Schema;
use crate::warnings::WarningSink;

/// Recursion bound for mutually-referencing schemas the stack checks miss.
pub const MAX_RESOLUTION_DEPTH: usize = 40;

const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Strip the components prefix from a `$ref` path, yielding the schema name.
pub fn strip_ref_prefix(reference: &str) -> &str {
    reference.strip_prefix(SCHEMA_REF_PREFIX).unwrap_or(reference)
}

/// Mutable bookkeeping for one resolution walk.
///
/// `node_stack` holds the addresses of schema nodes on the current recursion
/// path, catching cycles that are not expressed through `$ref`.
#[derive(Debug, Default)]
pub struct ResolveState {
    depth: usize,
    ref_stack: HashSet<String>,
    node_stack: Vec<usize>,
    pub warnings: WarningSink,
}

impl ResolveState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Resolve a schema node into a concrete shape.
///
/// The source node and components index are never mutated; the result is a
/// fresh value. Cycles and missing targets degrade to an empty schema (or
/// the ref site without its `$ref`) plus a warning.
pub fn resolve_schema_node(
    schema: &Schema,
    components: &Components,
    state: &mut ResolveState,
) -> Schema {
    if state.depth > MAX_RESOLUTION_DEPTH {
        state
            .warnings
            .push("schema resolution depth limit reached; remaining nodes skipped");
        return Schema::default();
    }

    let address = schema as *const Schema as usize;
    if state.node_stack.contains(&address) {
        state
            .warnings
            .push("circular schema node detected; nested traversal skipped");
        return Schema::default();
    }

    state.node_stack.push(address);
    state.depth += 1;
    let resolved = resolve_inner(schema, components, state);
    state.depth -= 1;
    state.node_stack.pop();
    resolved
}

fn resolve_inner(schema: &Schema, components: &Components, state: &mut ResolveState) -> Schema {
    if let Some(reference) = schema.reference.as_deref() {
        let name = strip_ref_prefix(reference);

        if state.ref_stack.contains(name) {
            state
                .warnings
                .push(format!("circular $ref detected for \"{name}\""));
            return Schema::default();
        }

        let Some(target) = components.schemas.get(name) else {
            state
                .warnings
                .push(format!("$ref target not found for \"{name}\""));
            let mut fallback = schema.clone();
            fallback.reference = None;
            return fallback;
        };

        state.ref_stack.insert(name.to_string());
        let resolved = resolve_schema_node(target, components, state);
        state.ref_stack.remove(name);

        // Sibling keys at the ref site overlay the resolved target.
        let mut overlay = schema.clone();
        overlay.reference = None;
        return merge_schemas(&resolved, &overlay);
    }

    if !schema.all_of.is_empty() {
        let mut merged = schema.clone();
        merged.all_of = Vec::new();
        for member in &schema.all_of {
            let resolved = resolve_schema_node(member, components, state);
            merged = merge_schemas(&merged, &resolved);
        }
        return merged;
    }

    if !schema.one_of.is_empty() {
        state.warnings.push(format!(
            "oneOf detected, first of {} variants used for forms and examples",
            schema.one_of.len()
        ));
        let first = resolve_schema_node(&schema.one_of[0], components, state);
        let mut base = schema.clone();
        base.one_of = Vec::new();
        return merge_schemas(&base, &first);
    }

    if !schema.any_of.is_empty() {
        state.warnings.push(format!(
            "anyOf detected, first of {} variants used for forms and examples",
            schema.any_of.len()
        ));
        let first = resolve_schema_node(&schema.any_of[0], components, state);
        let mut base = schema.clone();
        base.any_of = Vec::new();
        return merge_schemas(&base, &first);
    }

    schema.clone()
}

/// Overlay `next` onto `base`.
///
/// Object `properties` are shallow-unioned per key with `next` winning,
/// `required` is unioned as an ordered set, every other key follows
/// last-wins overlay semantics (a key absent from `next` keeps the base
/// value).
pub fn merge_schemas(base: &Schema, next: &Schema) -> Schema {
    let mut properties = base.properties.clone();
    for (name, property) in &next.properties {
        properties.insert(name.clone(), property.clone());
    }

    let mut required = base.required.clone();
    for name in &next.required {
        if !required.contains(name) {
            required.push(name.clone());
        }
    }

    let mut extensions: IndexMap<String, serde_json::Value> = base.extensions.clone();
    for (key, value) in &next.extensions {
        extensions.insert(key.clone(), value.clone());
    }

    Schema {
        reference: next.reference.clone().or_else(|| base.reference.clone()),
        schema_type: next
            .schema_type
            .clone()
            .or_else(|| base.schema_type.clone()),
        format: next.format.clone().or_else(|| base.format.clone()),
        title: next.title.clone().or_else(|| base.title.clone()),
        description: next
            .description
            .clone()
            .or_else(|| base.description.clone()),
        default_value: next
            .default_value
            .clone()
            .or_else(|| base.default_value.clone()),
        example: next.example.clone().or_else(|| base.example.clone()),
        nullable: next.nullable.or(base.nullable),
        properties,
        required,
        items: next.items.clone().or_else(|| base.items.clone()),
        all_of: pick_list(&next.all_of, &base.all_of),
        one_of: pick_list(&next.one_of, &base.one_of),
        any_of: pick_list(&next.any_of, &base.any_of),
        enum_values: pick_list(&next.enum_values, &base.enum_values),
        minimum: next.minimum.or(base.minimum),
        maximum: next.maximum.or(base.maximum),
        multiple_of: next.multiple_of.or(base.multiple_of),
        min_length: next.min_length.or(base.min_length),
        max_length: next.max_length.or(base.max_length),
        extensions,
    }
}

fn pick_list<T: Clone>(next: &[T], base: &[T]) -> Vec<T> {
    if next.is_empty() {
        base.to_vec()
    } else {
        next.to_vec()
    }
}
