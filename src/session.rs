//! Client-side session state.
//!
//! The server keeps no session; the client holds the token, email and name,
//! restores them from a durable string store on startup, and attaches the
//! token to every product request. This module captures that contract for
//! embedders; the storage backend itself stays abstract.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const TOKEN_KEY: &str = "auth_token";
pub const EMAIL_KEY: &str = "auth_email";
pub const NAME_KEY: &str = "auth_name";

/// Durable string store the session persists into (localStorage, a config
/// file, a keyring — anything keyed string to string).
pub trait CredentialStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub is_authenticated: bool,
}

impl Session {
    /// Restore from the store; a persisted token is what makes the session
    /// authenticated.
    pub fn load(store: &impl CredentialStore) -> Self {
        let token = store.get(TOKEN_KEY);
        let is_authenticated = token.is_some();
        Self {
            token,
            email: store.get(EMAIL_KEY),
            name: store.get(NAME_KEY),
            is_authenticated,
        }
    }

    /// Record a fresh login/registration result and persist all three values.
    pub fn set_credentials(
        &mut self,
        store: &mut impl CredentialStore,
        token: &str,
        email: &str,
        name: &str,
    ) {
        self.token = Some(token.to_string());
        self.email = Some(email.to_string());
        self.name = Some(name.to_string());
        self.is_authenticated = true;

        store.set(TOKEN_KEY, token);
        store.set(EMAIL_KEY, email);
        store.set(NAME_KEY, name);
    }

    /// Discard the token client-side; the server has no revocation.
    pub fn logout(&mut self, store: &mut impl CredentialStore) {
        *self = Session::default();

        store.remove(TOKEN_KEY);
        store.remove(EMAIL_KEY);
        store.remove(NAME_KEY);
    }

    /// Value for the `Authorization` header, when authenticated.
    pub fn bearer(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {t}"))
    }
}

/// In-memory store, useful in tests and short-lived tools.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_from_empty_store_is_unauthenticated() {
        let store = MemoryStore::default();
        let session = Session::load(&store);
        assert_eq!(session, Session::default());
        assert!(!session.is_authenticated);
        assert!(session.bearer().is_none());
    }

    #[test]
    fn set_credentials_persists_and_authenticates() {
        let mut store = MemoryStore::default();
        let mut session = Session::load(&store);
        session.set_credentials(&mut store, "tok-123", "a@x.com", "A");

        assert!(session.is_authenticated);
        assert_eq!(session.bearer().as_deref(), Some("Bearer tok-123"));
        assert_eq!(store.get(TOKEN_KEY).as_deref(), Some("tok-123"));
        assert_eq!(store.get(EMAIL_KEY).as_deref(), Some("a@x.com"));
        assert_eq!(store.get(NAME_KEY).as_deref(), Some("A"));

        // A fresh load round-trips the same state.
        let restored = Session::load(&store);
        assert_eq!(restored, session);
    }

    #[test]
    fn logout_clears_state_and_store() {
        let mut store = MemoryStore::default();
        let mut session = Session::load(&store);
        session.set_credentials(&mut store, "tok-123", "a@x.com", "A");

        session.logout(&mut store);
        assert_eq!(session, Session::default());
        assert!(store.get(TOKEN_KEY).is_none());
        assert!(store.get(EMAIL_KEY).is_none());
        assert!(store.get(NAME_KEY).is_none());
    }
}
