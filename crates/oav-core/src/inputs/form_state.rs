//! Flat form values and their conversion to and from nested JSON payloads.
//!
//! Form values live in a flat map keyed by value path. Paths follow a small
//! grammar: dot-separated keys with bracketed numeric indices (`items[0].id`).
//! Index segments materialize JSON arrays, padding gaps with `null`.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::body_form::{ROOT_BODY_PATH, RequestBodyFormInput};
use super::value::{ParamValue, is_value_empty, param_value_to_json, resolve_initial_value};

/// One step of a parsed value path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Flat map from value path to live value, in form display order.
pub type RequestBodyFormValueMap = IndexMap<String, ParamValue>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HydrationResult {
    pub values: RequestBodyFormValueMap,
    pub warnings: Vec<String>,
}

/// Parse a value path into segments. Empty chunks and empty bracket groups
/// drop out; a non-numeric bracket group is treated as a key.
pub fn parse_value_path(path: &str) -> Vec<PathSegment> {
    let mut segments = Vec::new();
    for chunk in path.split('.') {
        push_chunk_segments(chunk, &mut segments);
    }
    segments
}

fn push_chunk_segments(chunk: &str, segments: &mut Vec<PathSegment>) {
    let mut rest = chunk;
    while !rest.is_empty() {
        if let Some(stripped) = rest.strip_prefix('[') {
            match stripped.find(']') {
                Some(close) => {
                    let inner = &stripped[..close];
                    if let Ok(index) = inner.parse::<usize>() {
                        segments.push(PathSegment::Index(index));
                    } else if !inner.is_empty() {
                        segments.push(PathSegment::Key(inner.to_string()));
                    }
                    rest = &stripped[close + 1..];
                }
                None => {
                    if !stripped.is_empty() {
                        segments.push(PathSegment::Key(stripped.to_string()));
                    }
                    rest = "";
                }
            }
        } else {
            let end = rest.find('[').unwrap_or(rest.len());
            segments.push(PathSegment::Key(rest[..end].to_string()));
            rest = &rest[end..];
        }
    }
}

/// Seed every input's initial value from its schema default/example.
pub fn build_initial_values(inputs: &[RequestBodyFormInput]) -> RequestBodyFormValueMap {
    inputs
        .iter()
        .map(|input| {
            (
                input.path.clone(),
                resolve_initial_value(&input.spec, input.seed.as_ref()),
            )
        })
        .collect()
}

/// Assemble a JSON payload from the flat values.
///
/// A root-path form serializes its single value directly; otherwise empty
/// values are omitted and `None` means "no body at all".
pub fn build_payload_from_values(
    inputs: &[RequestBodyFormInput],
    values: &RequestBodyFormValueMap,
) -> Option<Value> {
    if let Some(root) = inputs.iter().find(|input| input.path == ROOT_BODY_PATH) {
        let value = values.get(&root.path).cloned().unwrap_or(ParamValue::Null);
        if is_value_empty(&root.spec, &value) {
            return None;
        }
        return Some(param_value_to_json(&value));
    }

    let mut payload = Value::Object(Map::new());
    let mut has_field = false;
    for input in inputs {
        if input.path == ROOT_BODY_PATH {
            continue;
        }
        let Some(value) = values.get(&input.path) else {
            continue;
        };
        if is_value_empty(&input.spec, value) {
            continue;
        }
        let segments = parse_value_path(&input.path);
        if segments.is_empty() {
            continue;
        }
        set_nested(&mut payload, &segments, param_value_to_json(value));
        has_field = true;
    }

    has_field.then_some(payload)
}

/// Overlay a JSON payload onto existing form values.
///
/// Paths absent from the payload keep their current values; a payload that
/// is not an object (for a multi-field form) leaves everything unchanged and
/// records a warning.
pub fn hydrate_values_from_payload(
    inputs: &[RequestBodyFormInput],
    payload: &Value,
    current: &RequestBodyFormValueMap,
) -> HydrationResult {
    let mut values = current.clone();
    let mut warnings = Vec::new();

    if let Some(root) = inputs.iter().find(|input| input.path == ROOT_BODY_PATH) {
        values.insert(
            root.path.clone(),
            resolve_initial_value(&root.spec, Some(payload)),
        );
        return HydrationResult { values, warnings };
    }

    if !payload.is_object() {
        warnings.push("JSON payload is not an object; form fields were kept unchanged".to_string());
        return HydrationResult { values, warnings };
    }

    for input in inputs {
        let segments = parse_value_path(&input.path);
        if segments.is_empty() {
            continue;
        }
        if let Some(source) = get_nested(payload, &segments) {
            values.insert(
                input.path.clone(),
                resolve_initial_value(&input.spec, Some(source)),
            );
        }
    }

    HydrationResult { values, warnings }
}

fn set_nested(target: &mut Value, segments: &[PathSegment], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };

    match head {
        PathSegment::Key(key) => {
            if !matches!(target, Value::Object(_)) {
                *target = Value::Object(Map::new());
            }
            if let Value::Object(map) = target {
                if rest.is_empty() {
                    map.insert(key.clone(), value);
                } else {
                    let slot = map.entry(key.clone()).or_insert(Value::Null);
                    set_nested(slot, rest, value);
                }
            }
        }
        PathSegment::Index(index) => {
            if !matches!(target, Value::Array(_)) {
                *target = Value::Array(Vec::new());
            }
            if let Value::Array(entries) = target {
                while entries.len() <= *index {
                    entries.push(Value::Null);
                }
                if rest.is_empty() {
                    entries[*index] = value;
                } else {
                    set_nested(&mut entries[*index], rest, value);
                }
            }
        }
    }
}

fn get_nested<'a>(source: &'a Value, segments: &[PathSegment]) -> Option<&'a Value> {
    let mut cursor = source;
    for segment in segments {
        cursor = match segment {
            PathSegment::Key(key) => cursor.as_object()?.get(key)?,
            PathSegment::Index(index) => cursor.as_array()?.get(*index)?,
        };
    }
    Some(cursor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_paths_with_keys_and_indices() {
        assert_eq!(
            parse_value_path("user.tags[0].name"),
            vec![
                PathSegment::Key("user".to_string()),
                PathSegment::Key("tags".to_string()),
                PathSegment::Index(0),
                PathSegment::Key("name".to_string()),
            ]
        );
        assert_eq!(parse_value_path("[2]"), vec![PathSegment::Index(2)]);
        assert_eq!(parse_value_path(""), Vec::<PathSegment>::new());
    }

    #[test]
    fn index_segments_materialize_arrays() {
        let mut payload = Value::Object(Map::new());
        set_nested(
            &mut payload,
            &parse_value_path("items[1].id"),
            json!(7),
        );
        assert_eq!(payload, json!({ "items": [null, { "id": 7 }] }));
    }

    #[test]
    fn nested_lookup_follows_arrays() {
        let payload = json!({ "items": [{ "id": 7 }] });
        assert_eq!(
            get_nested(&payload, &parse_value_path("items[0].id")),
            Some(&json!(7))
        );
        assert_eq!(get_nested(&payload, &parse_value_path("items[1].id")), None);
    }
}
