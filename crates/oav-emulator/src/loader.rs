//! Schema loading: structural validation of raw documents and HTTP fetch.

use oav_core::document::spec::OpenApiDocument;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaLoadError {
    #[error("schema source is empty")]
    MissingSource,

    #[error("schema payload is not a valid OpenAPI document: {0}")]
    InvalidSchema(String),

    #[error("failed to fetch schema: {0}")]
    Fetch(#[from] reqwest::Error),
}

impl SchemaLoadError {
    /// Stable machine-readable code for callers that surface errors.
    pub fn code(&self) -> &'static str {
        match self {
            SchemaLoadError::MissingSource => "missing_source",
            SchemaLoadError::InvalidSchema(_) => "invalid_schema",
            SchemaLoadError::Fetch(_) => "fetch_error",
        }
    }
}

/// Validate and deserialize a raw JSON value into a document.
///
/// The structural gate is deliberately shallow: a string `openapi` key and
/// an object `paths` key. Everything else degrades downstream.
pub fn document_from_value(value: Value) -> Result<OpenApiDocument, SchemaLoadError> {
    let Some(object) = value.as_object() else {
        return Err(SchemaLoadError::InvalidSchema(
            "document root is not an object".to_string(),
        ));
    };

    if !object.get("openapi").is_some_and(Value::is_string) {
        return Err(SchemaLoadError::InvalidSchema(
            "missing string `openapi` key".to_string(),
        ));
    }
    if !object.get("paths").is_some_and(Value::is_object) {
        return Err(SchemaLoadError::InvalidSchema(
            "missing object `paths` key".to_string(),
        ));
    }

    serde_json::from_value(value)
        .map_err(|error| SchemaLoadError::InvalidSchema(error.to_string()))
}

/// Fetches OpenAPI documents over HTTP.
#[derive(Debug, Clone, Default)]
pub struct SchemaLoader {
    client: reqwest::Client,
}

impl SchemaLoader {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetch and validate a document from a URL. A blank source
    /// short-circuits without touching the network.
    pub async fn fetch(&self, source: &str) -> Result<OpenApiDocument, SchemaLoadError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(SchemaLoadError::MissingSource);
        }

        let response = self.client.get(source).send().await?;
        let response = response.error_for_status()?;
        let value: Value = response.json().await?;
        document_from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_minimal_document() {
        let document = document_from_value(json!({ "openapi": "3.1.0", "paths": {} }));
        assert_eq!(document.unwrap().openapi, "3.1.0");
    }

    #[test]
    fn rejects_missing_openapi_key() {
        let error = document_from_value(json!({ "paths": {} })).unwrap_err();
        assert_eq!(error.code(), "invalid_schema");
    }

    #[test]
    fn rejects_non_object_paths() {
        let error =
            document_from_value(json!({ "openapi": "3.1.0", "paths": [] })).unwrap_err();
        assert_eq!(error.code(), "invalid_schema");
    }

    #[test]
    fn rejects_non_object_root() {
        let error = document_from_value(json!("nope")).unwrap_err();
        assert_eq!(error.code(), "invalid_schema");
    }
}
