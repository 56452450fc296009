#![warn(missing_docs)]
//! # finsight-store
//!
//! ## Purpose
//! Provides the key-value persistence layer behind the session: the browser
//! local-storage role, expressed as an injectable store interface.
//!
//! ## Responsibilities
//! - Define a backend-agnostic [`KeyValueStore`] trait.
//! - Provide an in-memory backend for tests and ephemeral sessions.
//! - Provide a JSON-file backend for native persistent sessions.
//! - Expose [`SessionVault`], the typed facade over the persisted session
//!   keys (bearer token, cached user, demo flag).
//!
//! ## Data flow
//! The auth layer writes token/user/demo entries through [`SessionVault`];
//! the request authorizer reads the token back for header injection.
//!
//! ## Ownership and lifetimes
//! Stores are shared as `Arc<dyn KeyValueStore>`; all values are owned
//! strings so backends stay trivially object-safe.
//!
//! ## Error model
//! Reads are best-effort (`Option`); corrupt persisted values degrade to
//! absent. Write failures surface as [`StoreError`] so callers can decide
//! whether persistence loss matters.
//!
//! ## Security and privacy notes
//! Token values are never logged by this crate; diagnostics mention key
//! names only.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use finsight_core::User;
use thiserror::Error;

/// Persisted key holding the bearer token.
pub const TOKEN_KEY: &str = "token";
/// Persisted key holding the JSON-serialized cached user.
pub const USER_KEY: &str = "currentUser";
/// Persisted key holding the demo-mode marker (`"true"` or absent).
pub const DEMO_KEY: &str = "demoMode";

/// Abstract string key-value store with local-storage semantics.
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the backend cannot persist the write.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the backend cannot persist the removal.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Volatile in-memory backend used by tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

/// JSON-file backend: the native stand-in for browser local storage.
///
/// The whole map is rewritten on every mutation; session payloads are a
/// handful of short strings so write-through keeps recovery simple.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Opens (or initializes) a file-backed store at `path`.
    ///
    /// A missing file starts empty; an unreadable or corrupt file also starts
    /// empty, with a warning, so a damaged session file never blocks startup.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(map) => map,
                Err(error) => {
                    log::warn!(
                        "session file '{}' is corrupt, starting empty: {error}",
                        path.display()
                    );
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &HashMap<String, String>) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(entries)
            .map_err(|error| StoreError::Serialize(error.to_string()))?;
        fs::write(&self.path, raw).map_err(|error| StoreError::Io {
            path: self.path.display().to_string(),
            message: error.to_string(),
        })
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Backend("file store lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Backend("file store lock poisoned".to_string()))?;
        if entries.remove(key).is_some() {
            return self.persist(&entries);
        }
        Ok(())
    }
}

/// Typed facade over the three persisted session keys.
///
/// Pure storage: no token validation happens here.
#[derive(Clone)]
pub struct SessionVault {
    store: Arc<dyn KeyValueStore>,
}

impl SessionVault {
    /// Creates a vault over any key-value backend.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Returns the stored bearer token, if any.
    pub fn token(&self) -> Option<String> {
        self.store.get(TOKEN_KEY)
    }

    /// Persists the bearer token.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the backend write fails.
    pub fn set_token(&self, token: &str) -> Result<(), StoreError> {
        self.store.set(TOKEN_KEY, token)
    }

    /// Returns the cached user record, if present and parseable.
    ///
    /// Corrupt cached JSON is treated as absent so a bad write can never
    /// wedge session startup.
    pub fn cached_user(&self) -> Option<User> {
        let raw = self.store.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(error) => {
                log::warn!("cached user entry is corrupt, ignoring: {error}");
                None
            }
        }
    }

    /// Persists the cached user record as JSON.
    ///
    /// # Errors
    /// Returns [`StoreError`] when serialization or the backend write fails.
    pub fn set_cached_user(&self, user: &User) -> Result<(), StoreError> {
        let raw =
            serde_json::to_string(user).map_err(|error| StoreError::Serialize(error.to_string()))?;
        self.store.set(USER_KEY, &raw)
    }

    /// Returns `true` when the current session was established by demo login.
    pub fn demo_mode(&self) -> bool {
        self.store.get(DEMO_KEY).as_deref() == Some("true")
    }

    /// Sets or clears the demo-mode marker.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the backend write fails.
    pub fn set_demo_mode(&self, enabled: bool) -> Result<(), StoreError> {
        if enabled {
            self.store.set(DEMO_KEY, "true")
        } else {
            self.store.remove(DEMO_KEY)
        }
    }

    /// Removes token, cached user and demo marker. Idempotent.
    ///
    /// # Errors
    /// Returns the first backend failure; remaining keys are still attempted.
    pub fn clear_session(&self) -> Result<(), StoreError> {
        let mut first_failure = None;
        for key in [TOKEN_KEY, USER_KEY, DEMO_KEY] {
            if let Err(error) = self.store.remove(key)
                && first_failure.is_none()
            {
                first_failure = Some(error);
            }
        }
        match first_failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Persistence layer error type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure while persisting entries.
    #[error("store io failure for '{path}': {message}")]
    Io {
        /// Backing file path.
        path: String,
        /// Underlying io error text.
        message: String,
    },
    /// Value could not be serialized for storage.
    #[error("store serialization failure: {0}")]
    Serialize(String),
    /// Backend runtime failure.
    #[error("store backend failure: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    //! Unit tests for vault semantics over the memory backend.

    use super::*;

    fn vault() -> SessionVault {
        SessionVault::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn token_round_trips() {
        let vault = vault();
        assert!(vault.token().is_none());
        vault.set_token("t1").expect("set should work");
        assert_eq!(vault.token().as_deref(), Some("t1"));
    }

    #[test]
    fn clear_session_removes_all_keys_and_is_idempotent() {
        let vault = vault();
        vault.set_token("t1").expect("set should work");
        vault
            .set_cached_user(&User {
                id: Some(7),
                email: "u@x.com".to_string(),
                ..User::default()
            })
            .expect("set should work");
        vault.set_demo_mode(true).expect("set should work");

        vault.clear_session().expect("clear should work");
        vault.clear_session().expect("second clear should work");

        assert!(vault.token().is_none());
        assert!(vault.cached_user().is_none());
        assert!(!vault.demo_mode());
    }

    #[test]
    fn corrupt_cached_user_reads_as_absent() {
        let store = Arc::new(MemoryStore::new());
        store.set(USER_KEY, "{not json").expect("set should work");
        let vault = SessionVault::new(store);
        assert!(vault.cached_user().is_none());
    }

    #[test]
    fn demo_flag_only_reads_true_marker() {
        let store = Arc::new(MemoryStore::new());
        store.set(DEMO_KEY, "yes").expect("set should work");
        let vault = SessionVault::new(store.clone());
        assert!(!vault.demo_mode());
        vault.set_demo_mode(true).expect("set should work");
        assert!(vault.demo_mode());
        vault.set_demo_mode(false).expect("clear should work");
        assert!(store.get(DEMO_KEY).is_none());
    }

    #[test]
    fn file_store_round_trips_across_reopen() {
        let dir = std::env::temp_dir().join(format!(
            "finsight-store-test-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).expect("temp dir should create");
        let path = dir.join("session.json");

        {
            let store = FileStore::open(&path);
            store.set(TOKEN_KEY, "t1").expect("set should work");
        }
        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get(TOKEN_KEY).as_deref(), Some("t1"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
