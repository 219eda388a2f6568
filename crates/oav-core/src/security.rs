//! Security requirement resolution: normalizing scheme definitions into
//! emulator-usable metadata and mapping stored credentials onto concrete
//! headers, query parameters, and cookies.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use indexmap::IndexMap;

use crate::document::security::{
    ApiKeyLocation, SecurityRequirement, SecurityScheme, SecuritySchemeType,
};

/// The concrete carrier a supported scheme injects a credential into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecuritySchemeKind {
    HttpBearer,
    HttpBasic,
    ApiKeyHeader,
    ApiKeyQuery,
    ApiKeyCookie,
    Oauth2Bearer,
    OpenIdConnectBearer,
    Unsupported,
}

impl SecuritySchemeKind {
    pub fn is_supported(self) -> bool {
        self != SecuritySchemeKind::Unsupported
    }
}

/// A scheme definition reduced to what credential injection needs.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSecuritySchemeMeta {
    pub key: String,
    pub kind: SecuritySchemeKind,
    pub label: String,
    pub description: String,
    pub header_name: Option<String>,
    pub query_name: Option<String>,
    pub cookie_name: Option<String>,
}

impl NormalizedSecuritySchemeMeta {
    pub fn supported(&self) -> bool {
        self.kind.is_supported()
    }
}

/// Headers, query pairs, and cookies contributed by authorization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorizationTarget {
    pub headers: IndexMap<String, String>,
    pub query: IndexMap<String, String>,
    pub cookies: IndexMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorizationResolveResult {
    pub target: AuthorizationTarget,
    pub applied_keys: Vec<String>,
    pub missing_keys: Vec<String>,
    pub warnings: Vec<String>,
    pub has_satisfied_requirement: bool,
}

fn unsupported_meta(key: &str, label: String, description: String) -> NormalizedSecuritySchemeMeta {
    NormalizedSecuritySchemeMeta {
        key: key.to_string(),
        kind: SecuritySchemeKind::Unsupported,
        label,
        description,
        header_name: None,
        query_name: None,
        cookie_name: None,
    }
}

fn bearer_meta(
    key: &str,
    kind: SecuritySchemeKind,
    label: String,
    description: String,
) -> NormalizedSecuritySchemeMeta {
    NormalizedSecuritySchemeMeta {
        key: key.to_string(),
        kind,
        label,
        description,
        header_name: Some("Authorization".to_string()),
        query_name: None,
        cookie_name: None,
    }
}

/// Normalize one scheme definition. `None` marks a key referenced by a
/// requirement that `components.securitySchemes` never defines.
pub fn normalize_security_scheme_meta(
    key: &str,
    scheme: Option<&SecurityScheme>,
) -> NormalizedSecuritySchemeMeta {
    let Some(scheme) = scheme else {
        return unsupported_meta(
            key,
            key.to_string(),
            "Security scheme is not defined in components.securitySchemes.".to_string(),
        );
    };

    let description = |fallback: &str| {
        scheme
            .description
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    };

    match scheme.scheme_type {
        SecuritySchemeType::Http => {
            let http_scheme = scheme.scheme.as_deref().map(str::to_lowercase);
            match http_scheme.as_deref() {
                Some("bearer") => bearer_meta(
                    key,
                    SecuritySchemeKind::HttpBearer,
                    format!("{key} (http bearer)"),
                    description("HTTP Bearer token via Authorization header."),
                ),
                Some("basic") => NormalizedSecuritySchemeMeta {
                    key: key.to_string(),
                    kind: SecuritySchemeKind::HttpBasic,
                    label: format!("{key} (http basic)"),
                    description: description("HTTP Basic credentials in Authorization header."),
                    header_name: Some("Authorization".to_string()),
                    query_name: None,
                    cookie_name: None,
                },
                other => unsupported_meta(
                    key,
                    format!("{key} (http {})", other.unwrap_or("unknown")),
                    description("Unsupported HTTP security scheme."),
                ),
            }
        }
        SecuritySchemeType::ApiKey => match (scheme.location, scheme.name.as_deref()) {
            (Some(ApiKeyLocation::Header), Some(name)) => NormalizedSecuritySchemeMeta {
                key: key.to_string(),
                kind: SecuritySchemeKind::ApiKeyHeader,
                label: format!("{key} (api key header)"),
                description: description("API key sent via header."),
                header_name: Some(name.to_string()),
                query_name: None,
                cookie_name: None,
            },
            (Some(ApiKeyLocation::Query), Some(name)) => NormalizedSecuritySchemeMeta {
                key: key.to_string(),
                kind: SecuritySchemeKind::ApiKeyQuery,
                label: format!("{key} (api key query)"),
                description: description("API key sent via query string."),
                header_name: None,
                query_name: Some(name.to_string()),
                cookie_name: None,
            },
            (Some(ApiKeyLocation::Cookie), Some(name)) => NormalizedSecuritySchemeMeta {
                key: key.to_string(),
                kind: SecuritySchemeKind::ApiKeyCookie,
                label: format!("{key} (api key cookie)"),
                description: description("API key sent via cookie."),
                header_name: None,
                query_name: None,
                cookie_name: Some(name.to_string()),
            },
            _ => unsupported_meta(
                key,
                format!("{key} (api key)"),
                description("Unsupported apiKey location or missing name."),
            ),
        },
        SecuritySchemeType::OAuth2 => bearer_meta(
            key,
            SecuritySchemeKind::Oauth2Bearer,
            format!("{key} (oauth2 bearer)"),
            description("OAuth2 token sent as Bearer Authorization."),
        ),
        SecuritySchemeType::OpenIdConnect => bearer_meta(
            key,
            SecuritySchemeKind::OpenIdConnectBearer,
            format!("{key} (openIdConnect bearer)"),
            description("OpenID Connect token sent as Bearer Authorization."),
        ),
        SecuritySchemeType::MutualTLS => unsupported_meta(
            key,
            format!("{key} ({})", scheme.scheme_type.as_str()),
            description("Unsupported security scheme type."),
        ),
    }
}

/// Normalize every defined scheme, keyed by scheme key.
pub fn build_scheme_meta_map(
    schemes: &IndexMap<String, SecurityScheme>,
) -> IndexMap<String, NormalizedSecuritySchemeMeta> {
    schemes
        .iter()
        .map(|(key, scheme)| (key.clone(), normalize_security_scheme_meta(key, Some(scheme))))
        .collect()
}

fn push_warning(warnings: &mut Vec<String>, message: String) {
    if !warnings.contains(&message) {
        warnings.push(message);
    }
}

fn apply_credential(
    target: &mut AuthorizationTarget,
    meta: &NormalizedSecuritySchemeMeta,
    credential: &str,
    warnings: &mut Vec<String>,
) {
    match meta.kind {
        SecuritySchemeKind::HttpBearer
        | SecuritySchemeKind::Oauth2Bearer
        | SecuritySchemeKind::OpenIdConnectBearer => {
            target
                .headers
                .insert("Authorization".to_string(), format!("Bearer {credential}"));
        }
        SecuritySchemeKind::HttpBasic => {
            let encoded = BASE64_STANDARD.encode(credential.as_bytes());
            target
                .headers
                .insert("Authorization".to_string(), format!("Basic {encoded}"));
        }
        SecuritySchemeKind::ApiKeyHeader => {
            if let Some(name) = &meta.header_name {
                target.headers.insert(name.clone(), credential.to_string());
            }
        }
        SecuritySchemeKind::ApiKeyQuery => {
            if let Some(name) = &meta.query_name {
                target.query.insert(name.clone(), credential.to_string());
            }
        }
        SecuritySchemeKind::ApiKeyCookie => {
            if let Some(name) = &meta.cookie_name {
                target.cookies.insert(name.clone(), credential.to_string());
            }
        }
        SecuritySchemeKind::Unsupported => {
            push_warning(
                warnings,
                format!("Unsupported security scheme for \"{}\"", meta.key),
            );
        }
    }
}

/// Evaluate one requirement: every named scheme must hold a credential.
///
/// An empty requirement (`{}` in the document) means "no auth needed" and is
/// always satisfied.
fn evaluate_requirement(
    requirement: &SecurityRequirement,
    meta_map: &IndexMap<String, NormalizedSecuritySchemeMeta>,
    credentials: &IndexMap<String, String>,
) -> AuthorizationResolveResult {
    let mut result = AuthorizationResolveResult {
        has_satisfied_requirement: true,
        ..AuthorizationResolveResult::default()
    };

    for key in requirement.keys() {
        let Some(meta) = meta_map.get(key) else {
            result.missing_keys.push(key.clone());
            push_warning(
                &mut result.warnings,
                format!("Security scheme \"{key}\" is not defined in OpenAPI components"),
            );
            continue;
        };

        if !meta.supported() {
            result.missing_keys.push(key.clone());
            push_warning(
                &mut result.warnings,
                format!("Security scheme \"{key}\" is not supported in request emulator"),
            );
            continue;
        }

        let credential = credentials
            .get(key)
            .map(|value| value.trim())
            .unwrap_or_default();
        if credential.is_empty() {
            result.missing_keys.push(key.clone());
            continue;
        }

        apply_credential(&mut result.target, meta, credential, &mut result.warnings);
        result.applied_keys.push(key.clone());
    }

    result.has_satisfied_requirement = result.missing_keys.is_empty();
    result
}

/// Resolve a requirement list (a disjunction of conjunctions) against the
/// stored credentials.
///
/// The first fully satisfiable requirement wins; failing that, the
/// requirement applying the most credentials is used as a best partial so
/// the request still carries whatever the user entered.
pub fn resolve_request_authorization(
    requirements: Option<&[SecurityRequirement]>,
    schemes: &IndexMap<String, SecurityScheme>,
    credentials: &IndexMap<String, String>,
) -> AuthorizationResolveResult {
    let requirements = requirements.unwrap_or_default();
    if requirements.is_empty() {
        return AuthorizationResolveResult {
            has_satisfied_requirement: true,
            ..AuthorizationResolveResult::default()
        };
    }

    let meta_map = build_scheme_meta_map(schemes);
    let mut best: Option<AuthorizationResolveResult> = None;

    for requirement in requirements {
        let candidate = evaluate_requirement(requirement, &meta_map, credentials);
        if candidate.has_satisfied_requirement {
            return candidate;
        }

        let improves = best
            .as_ref()
            .is_none_or(|current| candidate.applied_keys.len() > current.applied_keys.len());
        if improves {
            best = Some(candidate);
        }
    }

    best.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheme(yaml: &str) -> SecurityScheme {
        serde_yaml_ng::from_str(yaml).unwrap()
    }

    fn schemes() -> IndexMap<String, SecurityScheme> {
        let mut map = IndexMap::new();
        map.insert(
            "bearerAuth".to_string(),
            scheme("{ type: http, scheme: bearer }"),
        );
        map.insert(
            "apiKeyAuth".to_string(),
            scheme("{ type: apiKey, in: header, name: X-Api-Key }"),
        );
        map.insert(
            "cookieAuth".to_string(),
            scheme("{ type: apiKey, in: cookie, name: session }"),
        );
        map
    }

    fn requirement(keys: &[&str]) -> SecurityRequirement {
        keys.iter()
            .map(|key| (key.to_string(), Vec::new()))
            .collect()
    }

    #[test]
    fn labels_follow_scheme_kind() {
        let map = build_scheme_meta_map(&schemes());
        assert_eq!(map["bearerAuth"].label, "bearerAuth (http bearer)");
        assert_eq!(map["apiKeyAuth"].label, "apiKeyAuth (api key header)");
        assert_eq!(map["cookieAuth"].label, "cookieAuth (api key cookie)");
    }

    #[test]
    fn no_requirements_is_satisfied_with_empty_target() {
        let result = resolve_request_authorization(None, &schemes(), &IndexMap::new());
        assert!(result.has_satisfied_requirement);
        assert!(result.target.headers.is_empty());
    }

    #[test]
    fn first_satisfiable_requirement_wins() {
        let requirements = vec![requirement(&["apiKeyAuth"]), requirement(&["bearerAuth"])];
        let mut credentials = IndexMap::new();
        credentials.insert("bearerAuth".to_string(), "tok".to_string());

        let result =
            resolve_request_authorization(Some(&requirements), &schemes(), &credentials);
        assert!(result.has_satisfied_requirement);
        assert_eq!(result.applied_keys, vec!["bearerAuth"]);
        assert_eq!(result.target.headers["Authorization"], "Bearer tok");
    }

    #[test]
    fn partially_filled_conjunction_is_kept_as_best_effort() {
        let requirements = vec![requirement(&["bearerAuth", "apiKeyAuth"])];
        let mut credentials = IndexMap::new();
        credentials.insert("apiKeyAuth".to_string(), "key".to_string());

        let result =
            resolve_request_authorization(Some(&requirements), &schemes(), &credentials);
        assert!(!result.has_satisfied_requirement);
        assert_eq!(result.applied_keys, vec!["apiKeyAuth"]);
        assert_eq!(result.missing_keys, vec!["bearerAuth"]);
        assert_eq!(result.target.headers["X-Api-Key"], "key");
    }

    #[test]
    fn basic_credentials_are_base64_encoded() {
        let mut schemes = IndexMap::new();
        schemes.insert(
            "basicAuth".to_string(),
            scheme("{ type: http, scheme: basic }"),
        );
        let requirements = vec![requirement(&["basicAuth"])];
        let mut credentials = IndexMap::new();
        credentials.insert("basicAuth".to_string(), "user:pass".to_string());

        let result = resolve_request_authorization(Some(&requirements), &schemes, &credentials);
        assert_eq!(
            result.target.headers["Authorization"],
            format!("Basic {}", BASE64_STANDARD.encode("user:pass"))
        );
    }

    #[test]
    fn unknown_scheme_key_warns_once() {
        let requirements = vec![requirement(&["ghost"])];
        let result =
            resolve_request_authorization(Some(&requirements), &schemes(), &IndexMap::new());
        assert!(!result.has_satisfied_requirement);
        assert_eq!(
            result.warnings,
            vec!["Security scheme \"ghost\" is not defined in OpenAPI components"]
        );
    }
}
