//! Persisted Client State
//!
//! Key/value persistence for tokens, tenant override and locale. The portal
//! stores these under fixed string keys; the same keys are kept here so a
//! state file is readable next to the web client's storage dump.

use std::collections::HashMap;
use std::path::PathBuf;

use parking_lot::RwLock;
use tracing::warn;

/// Storage key for the access token.
pub const KEY_ACCESS_TOKEN: &str = "abp_access_token";
/// Storage key for the refresh token.
pub const KEY_REFRESH_TOKEN: &str = "abp_refresh_token";
/// Storage key for the access token expiry (RFC 3339).
pub const KEY_EXPIRES_AT: &str = "abp_expires_at";
/// Storage key for the tenant override.
pub const KEY_TENANT_ID: &str = "abp_tenant_id";
/// Storage key for the preferred culture.
pub const KEY_CULTURE: &str = "abp_culture";

/// Client-side state persistence.
///
/// Implementations must be safe to share across concurrent requests. Writes
/// are last-writer-wins; failures must not abort the request path.
pub trait StateStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory store. Default for clients that do not opt into persistence.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.write().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.write().remove(key);
    }
}

/// File-backed store: a single JSON document holding all keys.
///
/// Concurrent processes sharing the same file are last-writer-wins, same as
/// browser tabs sharing local storage.
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
}

impl FileStore {
    /// Open a store at the given path, loading existing entries if present.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "state file unreadable, starting empty");
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };

        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    /// Default location under the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("dominus").join("state.json"))
    }

    fn persist(&self, entries: &HashMap<String, String>) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(path = %self.path.display(), error = %e, "failed to create state directory");
                return;
            }
        }

        match serde_json::to_string_pretty(entries) {
            Ok(content) => {
                if let Err(e) = std::fs::write(&self.path, content) {
                    warn!(path = %self.path.display(), error = %e, "failed to write state file");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize state"),
        }
    }
}

impl StateStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries);
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.write();
        entries.remove(key);
        self.persist(&entries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        store.set(KEY_CULTURE, "pt-BR");
        assert_eq!(store.get(KEY_CULTURE), Some("pt-BR".to_string()));

        store.remove(KEY_CULTURE);
        assert_eq!(store.get(KEY_CULTURE), None);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        {
            let store = FileStore::open(&path);
            store.set(KEY_ACCESS_TOKEN, "tok-1");
            store.set(KEY_TENANT_ID, "acme");
        }

        let store = FileStore::open(&path);
        assert_eq!(store.get(KEY_ACCESS_TOKEN), Some("tok-1".to_string()));
        assert_eq!(store.get(KEY_TENANT_ID), Some("acme".to_string()));
    }

    #[test]
    fn file_store_tolerates_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileStore::open(&path);
        assert_eq!(store.get(KEY_ACCESS_TOKEN), None);

        store.set(KEY_ACCESS_TOKEN, "tok-2");
        assert_eq!(store.get(KEY_ACCESS_TOKEN), Some("tok-2".to_string()));
    }
}
