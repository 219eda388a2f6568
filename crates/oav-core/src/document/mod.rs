pub mod components;
pub mod operation;
pub mod parameter;
pub mod request_body;
pub mod schema;
pub mod security;
pub mod spec;

use crate::error::ParseError;
use spec::OpenApiDocument;

/// Parse an OpenAPI document from YAML.
pub fn from_yaml(input: &str) -> Result<OpenApiDocument, ParseError> {
    let document: OpenApiDocument = serde_yaml_ng::from_str(input)?;
    Ok(document)
}

/// Parse an OpenAPI document from JSON.
pub fn from_json(input: &str) -> Result<OpenApiDocument, ParseError> {
    let document: OpenApiDocument = serde_json::from_str(input)?;
    Ok(document)
}
