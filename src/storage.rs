use snafu::{OptionExt, Snafu};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StorageError {
    #[snafu(display("StorageError: Storage is not available: {message}"))]
    Unavailable { message: String },

    #[snafu(display("StorageError: Could not read '{key}': {message}"))]
    Read { key: String, message: String },

    #[snafu(display("StorageError: Could not write '{key}': {message}"))]
    Write { key: String, message: String },

    #[snafu(display("StorageError: Could not remove '{key}': {message}"))]
    Remove { key: String, message: String },
}

/// Durable, origin-scoped string key-value storage.
///
/// Every operation is logically atomic for a single key. Nothing is guaranteed across keys.
pub trait KeyValueStore: Debug + Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-local store. Useful for tests and for hosts without a browser.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entries<R>(&self, f: impl FnOnce(&mut HashMap<String, String>) -> R) -> R {
        // Poisoning cannot leave the map in an inconsistent state.
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut entries)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.with_entries(|entries| entries.get(key).cloned()))
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.with_entries(|entries| entries.insert(key.to_owned(), value.to_owned()));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.with_entries(|entries| entries.remove(key));
        Ok(())
    }
}

/// The browsers `window.localStorage`.
///
/// Writes are synchronous. Data written here is fully persisted before any subsequent
/// navigation, which the PKCE redirect relies on.
///
/// Only usable in a browser. Any access from a non-wasm target fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserStorage;

impl BrowserStorage {
    fn local_storage() -> Result<web_sys::Storage, StorageError> {
        let window = web_sys::window().context(UnavailableSnafu {
            message: "no global window",
        })?;
        match window.local_storage() {
            Ok(Some(storage)) => Ok(storage),
            Ok(None) => UnavailableSnafu {
                message: "localStorage is disabled",
            }
            .fail(),
            Err(err) => UnavailableSnafu {
                message: format!("{err:?}"),
            }
            .fail(),
        }
    }
}

impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Self::local_storage()?.get_item(key).map_err(|err| {
            ReadSnafu {
                key,
                message: format!("{err:?}"),
            }
            .build()
        })
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::local_storage()?.set_item(key, value).map_err(|err| {
            WriteSnafu {
                key,
                message: format!("{err:?}"),
            }
            .build()
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        Self::local_storage()?.remove_item(key).map_err(|err| {
            RemoveSnafu {
                key,
                message: format!("{err:?}"),
            }
            .build()
        })
    }
}
