//! Persisted client-side state.
//!
//! [`KeyValueStore`] is the plain string-keyed storage the storefront keeps
//! between runs. [`LocalState`] is the only way the rest of the crate reads
//! or writes it: every read sanitises what it finds, and corrupt values are
//! reset instead of surfacing as errors.
//!
//! Nothing here locks across processes. Two writers racing on the same key
//! resolve as last-write-wins.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

use crate::cart::{sanitize_lines, GuestCart};
use crate::error::StorageError;
use crate::session::Session;

/// Key holding the serialized [`Session`].
pub const SESSION_KEY: &str = "userInfo";
/// Key holding the serialized [`GuestCart`].
pub const GUEST_CART_KEY: &str = "guestCart";

/// String key/value storage.
pub trait KeyValueStore: Send + Sync {
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process store, lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_owned(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let io_err = |source| StorageError::Io {
            key: key.to_owned(),
            source,
        };
        std::fs::create_dir_all(&self.dir).map_err(io_err)?;
        std::fs::write(&path, value).map_err(io_err)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io {
                key: key.to_owned(),
                source,
            }),
        }
    }
}

/// Accessors over a [`KeyValueStore`] for the session and the guest cart.
///
/// Cheap to clone; clones share the same backing store.
#[derive(Clone)]
pub struct LocalState {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for LocalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalState").finish_non_exhaustive()
    }
}

impl LocalState {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    fn read_raw(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key, error = %e, "local storage read failed");
                None
            }
        }
    }

    fn remove_logged(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            tracing::warn!(key, error = %e, "local storage remove failed");
        }
    }

    /// The stored session, if there is a usable one.
    ///
    /// A value that does not parse, or parses without a token, is deleted
    /// and treated as signed out.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        let raw = self.read_raw(SESSION_KEY)?;
        match serde_json::from_str::<Session>(&raw) {
            Ok(session) if session.is_authenticated() => Some(session),
            Ok(_) => {
                tracing::warn!("stored session has no token; signing out");
                self.remove_logged(SESSION_KEY);
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "stored session is corrupt; signing out");
                self.remove_logged(SESSION_KEY);
                None
            }
        }
    }

    /// Bearer token of the stored session.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.session().map(|s| s.token)
    }

    /// # Errors
    ///
    /// Returns [`StorageError`] if the session cannot be serialized or written.
    pub fn save_session(&self, session: &Session) -> Result<(), StorageError> {
        let json = serde_json::to_string(session).map_err(|source| StorageError::Serialize {
            key: SESSION_KEY.to_owned(),
            source,
        })?;
        self.store.set(SESSION_KEY, &json)
    }

    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be written.
    pub fn clear_session(&self) -> Result<(), StorageError> {
        self.store.remove(SESSION_KEY)
    }

    /// The guest cart, sanitised.
    ///
    /// Unparsable or non-array contents are reset to an empty cart. Lines
    /// without a resolvable product are dropped, and when any are dropped the
    /// cleaned cart is written back straight away.
    #[must_use]
    pub fn guest_cart(&self) -> GuestCart {
        let Some(raw) = self.read_raw(GUEST_CART_KEY) else {
            return GuestCart::new();
        };

        let values = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(values)) => values,
            Ok(_) | Err(_) => {
                tracing::warn!("guest cart is not a JSON array; resetting");
                let empty = GuestCart::new();
                if let Err(e) = self.save_guest_cart(&empty) {
                    tracing::warn!(error = %e, "could not reset guest cart");
                }
                return empty;
            }
        };

        let (lines, dropped) = sanitize_lines(values);
        let cart = GuestCart::from_lines(lines);
        if dropped > 0 {
            tracing::info!(dropped, "removed guest cart lines without a product");
            if let Err(e) = self.save_guest_cart(&cart) {
                tracing::warn!(error = %e, "could not write back sanitised guest cart");
            }
        }
        cart
    }

    /// # Errors
    ///
    /// Returns [`StorageError`] if the cart cannot be serialized or written.
    pub fn save_guest_cart(&self, cart: &GuestCart) -> Result<(), StorageError> {
        let json = serde_json::to_string(cart).map_err(|source| StorageError::Serialize {
            key: GUEST_CART_KEY.to_owned(),
            source,
        })?;
        self.store.set(GUEST_CART_KEY, &json)
    }

    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be written.
    pub fn clear_guest_cart(&self) -> Result<(), StorageError> {
        self.store.remove(GUEST_CART_KEY)
    }

    /// Raw access for callers that need to inspect what is persisted.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be read.
    pub fn raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.store.get(key)
    }
}
