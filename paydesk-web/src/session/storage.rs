//! Durable backing copy of the session.
//!
//! The credential is stored as a raw string and the user as JSON, under two
//! separate keys. Anything that cannot be read back cleanly is treated as
//! absent.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use gloo_storage::{LocalStorage, Storage};
use shared::{auth::Credential, models::User};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to write '{key}' to storage: {message}")]
    Write { key: String, message: String },
    #[error("failed to serialize user: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Raw key/value persistence.
pub trait StorageBackend {
    fn get(&self, key: &str) -> Option<String>;

    /// # Errors
    /// Returns [`StorageError::Write`] when the value could not be stored.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str);
}

/// Browser `localStorage`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageBackend;

impl StorageBackend for LocalStorageBackend {
    fn get(&self, key: &str) -> Option<String> {
        LocalStorage::raw().get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        LocalStorage::raw()
            .set_item(key, value)
            .map_err(|err| StorageError::Write {
                key: key.to_string(),
                message: format!("{err:?}"),
            })
    }

    fn remove(&self, key: &str) {
        if let Err(err) = LocalStorage::raw().remove_item(key) {
            debug!(key, error = ?err, "failed to remove storage entry");
        }
    }
}

/// In-memory backend. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}

/// What storage currently holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedSession {
    pub token: Option<Credential>,
    pub user: Option<User>,
}

impl PersistedSession {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.as_ref().is_some_and(User::is_admin)
    }
}

/// Typed access to the two session keys of a [`StorageBackend`].
#[derive(Debug, Clone)]
pub struct SessionStorage<B> {
    backend: B,
    token_key: String,
    user_key: String,
}

impl<B: StorageBackend> SessionStorage<B> {
    pub fn new(backend: B, token_key: impl Into<String>, user_key: impl Into<String>) -> Self {
        Self {
            backend,
            token_key: token_key.into(),
            user_key: user_key.into(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn load(&self) -> PersistedSession {
        PersistedSession {
            token: self.load_token(),
            user: self.load_user(),
        }
    }

    /// The stored credential, if it is present and three-segment decodable.
    pub fn load_token(&self) -> Option<Credential> {
        let raw = self.backend.get(&self.token_key)?;
        let credential = Credential::new(raw)?;
        match credential.claims() {
            Ok(_) => Some(credential),
            Err(err) => {
                debug!(error = %err, "ignoring malformed stored credential");
                None
            }
        }
    }

    pub fn load_user(&self) -> Option<User> {
        let raw = self.backend.get(&self.user_key)?;
        match serde_json::from_str::<User>(&raw) {
            Ok(user) => Some(user),
            Err(err) => {
                debug!(error = %err, "ignoring malformed stored user");
                None
            }
        }
    }

    /// Writes both values or neither.
    ///
    /// # Errors
    /// Returns a [`StorageError`] when serialization or either write fails. On
    /// failure the previous contents are restored.
    pub fn save(&self, token: &Credential, user: &User) -> Result<(), StorageError> {
        let user_json = serde_json::to_string(user)?;
        let previous_token = self.backend.get(&self.token_key);

        self.backend.set(&self.token_key, token.as_str())?;
        if let Err(err) = self.backend.set(&self.user_key, &user_json) {
            self.restore(&self.token_key, previous_token.as_deref());
            return Err(err);
        }

        Ok(())
    }

    /// # Errors
    /// Returns a [`StorageError`] when the user cannot be serialized or written.
    pub fn save_user(&self, user: &User) -> Result<(), StorageError> {
        let user_json = serde_json::to_string(user)?;
        self.backend.set(&self.user_key, &user_json)
    }

    pub fn clear(&self) {
        self.backend.remove(&self.token_key);
        self.backend.remove(&self.user_key);
    }

    fn restore(&self, key: &str, previous: Option<&str>) {
        match previous {
            Some(value) => {
                if let Err(err) = self.backend.set(key, value) {
                    debug!(key, error = %err, "failed to restore storage entry");
                }
            }
            None => self.backend.remove(key),
        }
    }
}
