//! Stable navigation anchors for endpoints and schemas, plus the grouped
//! navigation model and lookup index built from a document.

use heck::ToKebabCase;
use indexmap::IndexMap;
use percent_encoding::percent_decode_str;

use crate::document::operation::{HttpMethod, Operation};
use crate::document::spec::OpenApiDocument;

/// Anchor prefix for schema entries.
pub const SCHEMA_ANCHOR_PREFIX: &str = "schemas/";
/// Older releases emitted this prefix; it still resolves but is never
/// generated.
pub const LEGACY_SCHEMA_ANCHOR_PREFIX: &str = "schema-";

/// Lowercase a tag into a kebab-case anchor segment. Everything outside
/// `[a-z0-9-]` drops out; a segment with nothing left becomes "general".
fn normalize_tag_segment(value: &str) -> String {
    let ascii: String = value.chars().filter(char::is_ascii).collect();
    let normalized = ascii.to_kebab_case();
    if normalized.is_empty() {
        "general".to_string()
    } else {
        normalized
    }
}

fn normalize_schema_name(value: &str) -> String {
    value
        .trim()
        .trim_start_matches('#')
        .trim_start_matches('/')
        .trim_end_matches('/')
        .to_string()
}

fn decode_safe(value: &str) -> String {
    percent_decode_str(value)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| value.to_string())
}

/// Canonicalize raw anchor text: percent-decode, strip leading hashes and
/// edge slashes, collapse duplicate slashes. Empty input yields `None`.
pub fn normalize_navigation_anchor(value: &str) -> Option<String> {
    let decoded = decode_safe(value.trim());
    let without_hash = decoded.trim_start_matches('#');

    let mut collapsed = String::with_capacity(without_hash.len());
    for ch in without_hash.chars() {
        if ch == '/' && collapsed.ends_with('/') {
            continue;
        }
        collapsed.push(ch);
    }
    let trimmed = collapsed.trim_matches('/').trim();

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// `{tag-segment}/{operationId}`, with fallbacks for degenerate input.
pub fn build_endpoint_anchor(tag: &str, operation_id: &str) -> String {
    let tag_segment = normalize_tag_segment(tag);
    let operation_segment = normalize_navigation_anchor(operation_id)
        .unwrap_or_else(|| operation_id.trim().to_string());

    if operation_segment.is_empty() {
        format!("{tag_segment}/operation")
    } else {
        format!("{tag_segment}/{operation_segment}")
    }
}

pub fn build_schema_anchor(schema_name: &str) -> String {
    format!("{SCHEMA_ANCHOR_PREFIX}{}", normalize_schema_name(schema_name))
}

/// Pull a schema name out of an anchor, accepting the current and the
/// legacy prefix.
pub fn extract_schema_name_from_anchor(anchor: &str) -> Option<String> {
    let normalized = normalize_navigation_anchor(anchor)?;

    for prefix in [SCHEMA_ANCHOR_PREFIX, LEGACY_SCHEMA_ANCHOR_PREFIX] {
        if let Some(name) = normalized.strip_prefix(prefix) {
            return (!name.is_empty()).then(|| name.to_string());
        }
    }

    None
}

/// Pull an operation id out of an endpoint anchor (the last path segment).
/// Schema anchors yield `None`.
pub fn extract_operation_id_from_anchor(anchor: &str) -> Option<String> {
    let normalized = normalize_navigation_anchor(anchor)?;
    if normalized.starts_with(SCHEMA_ANCHOR_PREFIX)
        || normalized.starts_with(LEGACY_SCHEMA_ANCHOR_PREFIX)
    {
        return None;
    }

    normalized
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// One navigation entry, either an endpoint or a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationItem {
    pub anchor: String,
    pub title: String,
    pub description: Option<String>,
    pub method: Option<HttpMethod>,
    pub operation_id: String,
}

/// A titled group of navigation entries.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationGroup {
    pub title: String,
    pub children: Vec<NavigationItem>,
}

/// Case-tolerant lookup index over the navigation model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigationIndex {
    by_anchor: IndexMap<String, NavigationItem>,
    by_operation_id: IndexMap<String, NavigationItem>,
    by_schema_name: IndexMap<String, NavigationItem>,
}

impl NavigationIndex {
    fn insert_anchor(&mut self, item: &NavigationItem) {
        if let Some(anchor) = normalize_navigation_anchor(&item.anchor) {
            self.by_anchor.insert(anchor.to_lowercase(), item.clone());
            self.by_anchor.insert(anchor, item.clone());
        }
    }

    pub fn by_anchor(&self, anchor: &str) -> Option<&NavigationItem> {
        let normalized = normalize_navigation_anchor(anchor)?;
        self.by_anchor
            .get(&normalized)
            .or_else(|| self.by_anchor.get(&normalized.to_lowercase()))
    }

    pub fn by_operation_id(&self, operation_id: &str) -> Option<&NavigationItem> {
        self.by_operation_id
            .get(operation_id)
            .or_else(|| self.by_operation_id.get(&operation_id.to_lowercase()))
    }

    pub fn by_schema_name(&self, name: &str) -> Option<&NavigationItem> {
        self.by_schema_name
            .get(name)
            .or_else(|| self.by_schema_name.get(&name.to_lowercase()))
    }
}

/// The full navigation model for a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigationModel {
    pub endpoint_groups: Vec<NavigationGroup>,
    pub schema_group: Option<NavigationGroup>,
    pub index: NavigationIndex,
}

/// Build grouped navigation from a document.
///
/// Endpoints group by first tag ("General" when untagged) in path order;
/// operations without an `operationId` are skipped with a logged warning
/// since they cannot anchor.
pub fn build_navigation(document: &OpenApiDocument) -> NavigationModel {
    let mut groups: IndexMap<String, NavigationGroup> = IndexMap::new();
    let mut index = NavigationIndex::default();

    for (url, path_item) in &document.paths {
        for (method, operation) in path_item.operations() {
            let Some(operation_id) = operation
                .operation_id
                .as_deref()
                .filter(|id| !id.trim().is_empty())
            else {
                log::warn!(
                    "operation without operationId skipped: {} {url}",
                    method.as_upper_str()
                );
                continue;
            };

            let tag = operation
                .tags
                .first()
                .cloned()
                .unwrap_or_else(|| "General".to_string());
            let anchor = build_endpoint_anchor(&tag, operation_id);
            let item = NavigationItem {
                anchor,
                title: operation
                    .summary
                    .clone()
                    .filter(|summary| !summary.is_empty())
                    .unwrap_or_else(|| "No title provided".to_string()),
                description: operation.description.clone(),
                method: Some(method),
                operation_id: operation_id.to_string(),
            };

            index.insert_anchor(&item);
            index
                .by_operation_id
                .insert(operation_id.to_lowercase(), item.clone());
            index
                .by_operation_id
                .insert(operation_id.to_string(), item.clone());

            groups
                .entry(tag.clone())
                .or_insert_with(|| NavigationGroup {
                    title: tag,
                    children: Vec::new(),
                })
                .children
                .push(item);
        }
    }

    let schemas = &document.components_or_default().schemas;
    let schema_group = (!schemas.is_empty()).then(|| {
        let children: Vec<NavigationItem> = schemas
            .keys()
            .map(|name| NavigationItem {
                anchor: build_schema_anchor(name),
                title: name.clone(),
                description: None,
                method: None,
                operation_id: format!("schema-{name}"),
            })
            .collect();

        for item in &children {
            index.insert_anchor(item);
            index
                .by_schema_name
                .insert(item.title.to_lowercase(), item.clone());
            index.by_schema_name.insert(item.title.clone(), item.clone());
        }

        NavigationGroup {
            title: "Schemas".to_string(),
            children,
        }
    });

    NavigationModel {
        endpoint_groups: groups.into_values().collect(),
        schema_group,
        index,
    }
}

/// Find an operation by id, returning its path, method, and definition.
pub fn find_operation<'a>(
    document: &'a OpenApiDocument,
    operation_id: &str,
) -> Option<(&'a str, HttpMethod, &'a Operation)> {
    for (url, path_item) in &document.paths {
        for (method, operation) in path_item.operations() {
            if operation.operation_id.as_deref() == Some(operation_id) {
                return Some((url.as_str(), method, operation));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_segments_kebab_case() {
        assert_eq!(normalize_tag_segment("Pet Store"), "pet-store");
        assert_eq!(normalize_tag_segment("users/admin"), "users-admin");
        assert_eq!(normalize_tag_segment("  ***  "), "general");
    }

    #[test]
    fn endpoint_anchor_shape() {
        assert_eq!(build_endpoint_anchor("Pets", "listPets"), "pets/listPets");
        assert_eq!(build_endpoint_anchor("", ""), "general/operation");
    }

    #[test]
    fn anchor_normalization_strips_hash_and_slashes() {
        assert_eq!(
            normalize_navigation_anchor("#/pets//listPets/"),
            Some("pets/listPets".to_string())
        );
        assert_eq!(normalize_navigation_anchor("  "), None);
        assert_eq!(
            normalize_navigation_anchor("schemas%2FPet"),
            Some("schemas/Pet".to_string())
        );
    }

    #[test]
    fn schema_name_extraction_accepts_legacy_prefix() {
        assert_eq!(
            extract_schema_name_from_anchor("schemas/Pet"),
            Some("Pet".to_string())
        );
        assert_eq!(
            extract_schema_name_from_anchor("#schema-Pet"),
            Some("Pet".to_string())
        );
        assert_eq!(extract_schema_name_from_anchor("pets/listPets"), None);
    }

    #[test]
    fn operation_id_extraction_skips_schema_anchors() {
        assert_eq!(
            extract_operation_id_from_anchor("pets/listPets"),
            Some("listPets".to_string())
        );
        assert_eq!(extract_operation_id_from_anchor("schemas/Pet"), None);
    }
}
