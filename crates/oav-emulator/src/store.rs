//! Best-effort credential persistence: a flat `{ scheme_key: credential }`
//! JSON file. Storage problems never fail a session; they log and fall back
//! to an empty map.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::Value;

/// File name inside the store directory. The `v1` suffix guards against
/// future layout changes.
pub const CREDENTIAL_STORE_FILE: &str = "authorization.v1.json";

#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(CREDENTIAL_STORE_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read persisted credentials. A missing file, unreadable file, or
    /// non-object payload yields an empty map; scalar values are stringified.
    pub fn load(&self) -> IndexMap<String, String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return IndexMap::new();
            }
            Err(error) => {
                log::warn!(
                    "failed to read credential store {}: {error}",
                    self.path.display()
                );
                return IndexMap::new();
            }
        };

        let parsed: Value = match serde_json::from_str(&raw) {
            Ok(parsed) => parsed,
            Err(error) => {
                log::warn!(
                    "credential store {} holds invalid JSON: {error}",
                    self.path.display()
                );
                return IndexMap::new();
            }
        };

        let Value::Object(entries) = parsed else {
            log::warn!(
                "credential store {} is not a JSON object; ignoring it",
                self.path.display()
            );
            return IndexMap::new();
        };

        entries
            .into_iter()
            .map(|(key, value)| {
                let credential = match value {
                    Value::String(text) => text,
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                (key, credential)
            })
            .collect()
    }

    /// Persist the credential map. Failures are logged and swallowed.
    pub fn save(&self, credentials: &IndexMap<String, String>) {
        let payload = match serde_json::to_string_pretty(credentials) {
            Ok(payload) => payload,
            Err(error) => {
                log::warn!("failed to serialize credentials: {error}");
                return;
            }
        };

        if let Some(parent) = self.path.parent() {
            if let Err(error) = fs::create_dir_all(parent) {
                log::warn!(
                    "failed to create credential store directory {}: {error}",
                    parent.display()
                );
                return;
            }
        }

        if let Err(error) = fs::write(&self.path, payload) {
            log::warn!(
                "failed to write credential store {}: {error}",
                self.path.display()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path());

        let mut credentials = IndexMap::new();
        credentials.insert("bearerAuth".to_string(), "tok".to_string());
        store.save(&credentials);

        assert_eq!(store.load(), credentials);
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path());
        assert!(store.load().is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path());
        fs::write(store.path(), "{not json").unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn non_object_payload_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path());
        fs::write(store.path(), "[1, 2]").unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn scalar_values_are_stringified() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path());
        fs::write(store.path(), r#"{ "k": 7, "n": null }"#).unwrap();

        let loaded = store.load();
        assert_eq!(loaded["k"], "7");
        assert_eq!(loaded["n"], "");
    }
}
