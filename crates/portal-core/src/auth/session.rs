use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

/// Storage key of the session token.
pub const TOKEN_KEY: &str = "authToken";

/// String key-value storage scoped to one session of the app.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory storage that lives as long as the process, the terminal
/// counterpart of a browser tab's session storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.items
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.items
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.items
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
    }
}

/// Owner of the session token.
///
/// Everything that needs the token receives an `Arc<Session>`; only the
/// auth service writes to it.
pub struct Session {
    storage: Arc<dyn KeyValueStorage>,
}

impl Session {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Session backed by fresh in-memory storage
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Get the bearer token if one is stored
    pub fn token(&self) -> Option<String> {
        self.storage.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn set_token(&self, token: &str) {
        self.storage.set(TOKEN_KEY, token);
        debug!("Session token stored");
    }

    /// Remove the token. No-op when nothing is stored.
    pub fn clear(&self) {
        self.storage.remove(TOKEN_KEY);
        debug!("Session token cleared");
    }

    /// A stored token is the only signal of being logged in.
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
