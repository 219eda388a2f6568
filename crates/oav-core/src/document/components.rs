use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::schema::Schema;
use super::security::SecurityScheme;

/// Components object holding the reusable definitions the viewer consumes.
///
/// Shared read-only for the lifetime of a loaded document; resolution never
/// mutates it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Components {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub schemas: IndexMap<String, Schema>,

    #[serde(
        rename = "securitySchemes",
        default,
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub security_schemes: IndexMap<String, SecurityScheme>,
}
