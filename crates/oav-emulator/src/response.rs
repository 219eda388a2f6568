//! Response classification and the execution state the engine exposes.

use indexmap::IndexMap;
use serde_json::Value;

/// How the response body was interpreted for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    Text,
    Empty,
}

/// A completed exchange, whatever the status code.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseResult {
    pub status: u16,
    pub status_text: String,
    pub ok: bool,
    pub elapsed_ms: u64,
    pub headers: IndexMap<String, String>,
    pub body: Value,
    pub body_text: String,
    pub body_kind: BodyKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionErrorCode {
    InvalidRequest,
    NetworkError,
    UnexpectedError,
}

impl ExecutionErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionErrorCode::InvalidRequest => "invalid_request",
            ExecutionErrorCode::NetworkError => "network_error",
            ExecutionErrorCode::UnexpectedError => "unexpected_error",
        }
    }
}

/// A failed exchange. Failures never escape the engine as `Err`; they land
/// here.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionError {
    pub code: ExecutionErrorCode,
    pub message: String,
}

/// Send lifecycle: at most one of `result`/`error` is set once
/// `is_sending` drops.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionState {
    pub is_sending: bool,
    pub result: Option<ResponseResult>,
    pub error: Option<ExecutionError>,
}

/// Interpret a raw response body.
///
/// Blank bodies are `Empty`. A JSON content type parses and pretty-prints;
/// unparseable JSON degrades to `Text` with a logged warning.
pub fn classify_response_body(text: &str, content_type: Option<&str>) -> (Value, String, BodyKind) {
    if text.trim().is_empty() {
        return (Value::Null, String::new(), BodyKind::Empty);
    }

    let is_json = content_type
        .map(|value| value.to_lowercase().contains("application/json"))
        .unwrap_or(false);
    if is_json {
        match serde_json::from_str::<Value>(text) {
            Ok(parsed) => {
                let pretty =
                    serde_json::to_string_pretty(&parsed).unwrap_or_else(|_| text.to_string());
                return (parsed, pretty, BodyKind::Json);
            }
            Err(_) => {
                log::warn!("response content-type is json but payload parsing failed");
            }
        }
    }

    (
        Value::String(text.to_string()),
        text.to_string(),
        BodyKind::Text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_body_is_empty_kind() {
        let (body, text, kind) = classify_response_body("  ", Some("application/json"));
        assert_eq!(body, Value::Null);
        assert_eq!(text, "");
        assert_eq!(kind, BodyKind::Empty);
    }

    #[test]
    fn json_content_type_parses_and_pretty_prints() {
        let (body, text, kind) =
            classify_response_body("{\"a\":1}", Some("application/json; charset=utf-8"));
        assert_eq!(body, json!({ "a": 1 }));
        assert!(text.contains("\n"));
        assert_eq!(kind, BodyKind::Json);
    }

    #[test]
    fn malformed_json_degrades_to_text() {
        let (body, _, kind) = classify_response_body("{nope", Some("application/json"));
        assert_eq!(body, Value::String("{nope".to_string()));
        assert_eq!(kind, BodyKind::Text);
    }

    #[test]
    fn non_json_content_type_stays_text() {
        let (_, text, kind) = classify_response_body("hello", Some("text/plain"));
        assert_eq!(text, "hello");
        assert_eq!(kind, BodyKind::Text);
    }
}
