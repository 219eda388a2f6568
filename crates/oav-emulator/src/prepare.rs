//! Pure request-assembly helpers: path interpolation, query-string and
//! cookie serialization, URL joining, and curl rendering.

use indexmap::IndexMap;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::form_urlencoded;

/// Everything except unreserved characters gets percent-encoded in path
/// segments.
const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// The outcome of filling a path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathInterpolation {
    /// Template with provided parameters substituted; missing ones keep
    /// their `{name}` placeholder.
    pub path: String,
    pub missing: Vec<String>,
}

/// Substitute `{name}` placeholders with percent-encoded values.
pub fn interpolate_path_params(
    template: &str,
    values: &IndexMap<String, String>,
) -> PathInterpolation {
    let mut path = String::with_capacity(template.len());
    let mut missing = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        path.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find('}') else {
            // Unterminated brace: keep the tail verbatim.
            path.push_str(&rest[open..]);
            rest = "";
            break;
        };

        let name = &after_open[..close];
        let value = values.get(name).map(|value| value.trim()).unwrap_or("");
        if value.is_empty() {
            missing.push(name.to_string());
            path.push('{');
            path.push_str(name);
            path.push('}');
        } else {
            path.extend(utf8_percent_encode(value, PATH_SEGMENT_ENCODE_SET));
        }

        rest = &after_open[close + 1..];
    }
    path.push_str(rest);

    PathInterpolation { path, missing }
}

/// Serialize query pairs into `?key=value&...`. Blank entries drop out; an
/// empty result is the empty string, not a bare `?`.
pub fn serialize_query_params(pairs: &[(String, Vec<String>)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, entries) in pairs {
        for entry in entries {
            let normalized = entry.trim();
            if normalized.is_empty() {
                continue;
            }
            serializer.append_pair(key, normalized);
        }
    }

    let encoded = serializer.finish();
    if encoded.is_empty() {
        String::new()
    } else {
        format!("?{encoded}")
    }
}

/// Join base URL, endpoint path, and query string.
///
/// Absolute and protocol-relative endpoint paths bypass the base entirely.
pub fn build_request_url(base_api_url: &str, endpoint_path: &str, query: &str) -> String {
    let lower = endpoint_path.to_lowercase();
    let absolute_or_protocol_relative = lower.starts_with("http://")
        || lower.starts_with("https://")
        || endpoint_path.starts_with("//");
    if absolute_or_protocol_relative {
        return format!("{endpoint_path}{query}");
    }

    let normalized_path = if endpoint_path.starts_with('/') {
        endpoint_path.to_string()
    } else {
        format!("/{endpoint_path}")
    };
    let normalized_base = base_api_url.trim().trim_end_matches('/');

    if normalized_base.is_empty() {
        format!("{normalized_path}{query}")
    } else {
        format!("{normalized_base}{normalized_path}{query}")
    }
}

/// Join cookie pairs into a `Cookie` header value.
pub fn build_cookie_header(pairs: &[(String, String)]) -> Option<String> {
    if pairs.is_empty() {
        return None;
    }
    Some(
        pairs
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; "),
    )
}

/// Single-quote a value for POSIX shells; embedded quotes become `'"'"'`.
pub fn shell_escape(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\"'\"'"))
}

/// Render the prepared request as a copy-pastable curl invocation.
pub fn build_curl_command(
    method: &str,
    url: &str,
    headers: &IndexMap<String, String>,
    body_text: Option<&str>,
) -> String {
    let mut parts = vec![
        "curl".to_string(),
        "-X".to_string(),
        method.to_uppercase(),
        shell_escape(url),
    ];

    for (key, value) in headers {
        parts.push("-H".to_string());
        parts.push(shell_escape(&format!("{key}: {value}")));
    }

    if let Some(body) = body_text {
        if !body.trim().is_empty() {
            parts.push("--data-raw".to_string());
            parts.push(shell_escape(body));
        }
    }

    parts.join(" ")
}
