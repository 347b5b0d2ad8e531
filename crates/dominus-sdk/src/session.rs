//! Session Manager
//!
//! Single owner of the authenticated session. All token reads and writes go
//! through this type; the request pipeline never touches the backing store
//! directly.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::store::{
    StateStore, KEY_ACCESS_TOKEN, KEY_EXPIRES_AT, KEY_REFRESH_TOKEN,
};
use crate::types::UserInfo;

/// Authenticated session: one access token, one refresh token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub token_type: String,
    pub user: Option<UserInfo>,
}

/// Shared mutable session state with write-through persistence.
///
/// Tokens are hydrated from the store at construction so sessions survive
/// process restarts. The profile is not persisted; it is re-fetched from the
/// userinfo endpoint after login.
pub struct SessionManager {
    store: Arc<dyn StateStore>,
    session: RwLock<Option<AuthSession>>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        let session = Self::hydrate(store.as_ref());
        Self {
            store,
            session: RwLock::new(session),
        }
    }

    fn hydrate(store: &dyn StateStore) -> Option<AuthSession> {
        let access_token = store.get(KEY_ACCESS_TOKEN)?;
        let refresh_token = store.get(KEY_REFRESH_TOKEN)?;
        let expires_at = store
            .get(KEY_EXPIRES_AT)
            .and_then(|v| DateTime::parse_from_rfc3339(&v).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        Some(AuthSession {
            access_token,
            refresh_token,
            expires_at,
            token_type: "Bearer".to_string(),
            user: None,
        })
    }

    /// Snapshot of the current session.
    pub fn get(&self) -> Option<AuthSession> {
        self.session.read().clone()
    }

    /// Replace the session, persisting both tokens under the write lock.
    pub fn set(&self, session: AuthSession) {
        let mut guard = self.session.write();
        self.store.set(KEY_ACCESS_TOKEN, &session.access_token);
        self.store.set(KEY_REFRESH_TOKEN, &session.refresh_token);
        self.store.set(KEY_EXPIRES_AT, &session.expires_at.to_rfc3339());
        *guard = Some(session);
    }

    /// Destroy the session and remove persisted tokens.
    pub fn clear(&self) {
        let mut guard = self.session.write();
        self.store.remove(KEY_ACCESS_TOKEN);
        self.store.remove(KEY_REFRESH_TOKEN);
        self.store.remove(KEY_EXPIRES_AT);
        *guard = None;
    }

    /// Attach the user profile to the current session, if any.
    pub fn set_user(&self, user: UserInfo) {
        if let Some(session) = self.session.write().as_mut() {
            session.user = Some(user);
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.session.read().as_ref().map(|s| s.access_token.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.session.read().as_ref().map(|s| s.refresh_token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.read().is_some()
    }

    pub fn is_expired(&self) -> bool {
        match self.session.read().as_ref() {
            Some(session) => session.expires_at <= Utc::now(),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Duration;

    fn session(access: &str, refresh: &str) -> AuthSession {
        AuthSession {
            access_token: access.to_string(),
            refresh_token: refresh.to_string(),
            expires_at: Utc::now() + Duration::hours(1),
            token_type: "Bearer".to_string(),
            user: None,
        }
    }

    #[test]
    fn set_persists_both_tokens() {
        let store = Arc::new(MemoryStore::new());
        let manager = SessionManager::new(store.clone());

        manager.set(session("a1", "r1"));

        assert_eq!(store.get(KEY_ACCESS_TOKEN), Some("a1".to_string()));
        assert_eq!(store.get(KEY_REFRESH_TOKEN), Some("r1".to_string()));
        assert_eq!(manager.access_token(), Some("a1".to_string()));
    }

    #[test]
    fn clear_removes_persisted_tokens() {
        let store = Arc::new(MemoryStore::new());
        let manager = SessionManager::new(store.clone());

        manager.set(session("a1", "r1"));
        manager.clear();

        assert_eq!(store.get(KEY_ACCESS_TOKEN), None);
        assert_eq!(store.get(KEY_REFRESH_TOKEN), None);
        assert!(!manager.is_authenticated());
        assert!(manager.is_expired());
    }

    #[test]
    fn hydrates_from_store() {
        let store = Arc::new(MemoryStore::new());
        store.set(KEY_ACCESS_TOKEN, "a1");
        store.set(KEY_REFRESH_TOKEN, "r1");

        let manager = SessionManager::new(store);
        assert_eq!(manager.access_token(), Some("a1".to_string()));
        assert_eq!(manager.refresh_token(), Some("r1".to_string()));
    }

    #[test]
    fn does_not_hydrate_partial_state() {
        let store = Arc::new(MemoryStore::new());
        store.set(KEY_ACCESS_TOKEN, "a1");

        let manager = SessionManager::new(store);
        assert!(!manager.is_authenticated());
    }
}
