//! Durable key-value storage for user preferences.
//!
//! The browser build persists to `window.localStorage`; native builds and
//! tests use [`InMemoryPrefsStore`].

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrefsError {
    #[error("browser storage unavailable")]
    StorageUnavailable,
    #[error("preference storage error: {0}")]
    Io(String),
}

pub trait PrefsStore {
    fn get(&self, key: &str) -> Result<Option<String>, PrefsError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PrefsError>;
    fn remove(&mut self, key: &str) -> Result<bool, PrefsError>;
}

impl<S: PrefsStore + ?Sized> PrefsStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, PrefsError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PrefsError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<bool, PrefsError> {
        (**self).remove(key)
    }
}

/// Read a value, treating unreadable storage as "nothing stored".
///
/// Startup must never fail because storage is blocked (private browsing,
/// quota, sandboxed iframes).
pub fn get_or_none(store: &dyn PrefsStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(key, error = %e, "preference read failed; using default");
            None
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryPrefsStore {
    entries: BTreeMap<String, String>,
}

impl InMemoryPrefsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }
}

impl PrefsStore for InMemoryPrefsStore {
    fn get(&self, key: &str) -> Result<Option<String>, PrefsError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PrefsError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, PrefsError> {
        Ok(self.entries.remove(key).is_some())
    }
}

#[cfg(target_arch = "wasm32")]
mod wasm_storage {
    use super::{PrefsError, PrefsStore};

    /// `window.localStorage`, namespaced by a key prefix.
    #[derive(Debug)]
    pub struct LocalStoragePrefsStore {
        key_prefix: String,
    }

    impl LocalStoragePrefsStore {
        pub fn new(key_prefix: impl Into<String>) -> Result<Self, PrefsError> {
            // Fail early when storage is blocked so callers can fall back.
            window_local_storage()?;
            Ok(Self {
                key_prefix: key_prefix.into(),
            })
        }

        fn full_key(&self, key: &str) -> String {
            if self.key_prefix.is_empty() {
                key.to_string()
            } else {
                format!("{}.{}", self.key_prefix, key)
            }
        }
    }

    impl PrefsStore for LocalStoragePrefsStore {
        fn get(&self, key: &str) -> Result<Option<String>, PrefsError> {
            let storage = window_local_storage()?;
            storage
                .get_item(&self.full_key(key))
                .map_err(|e| PrefsError::Io(format!("get_item failed: {:?}", e)))
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), PrefsError> {
            let storage = window_local_storage()?;
            storage
                .set_item(&self.full_key(key), value)
                .map_err(|e| PrefsError::Io(format!("set_item failed: {:?}", e)))
        }

        fn remove(&mut self, key: &str) -> Result<bool, PrefsError> {
            let storage = window_local_storage()?;
            let full = self.full_key(key);
            let existed = storage
                .get_item(&full)
                .map_err(|e| PrefsError::Io(format!("get_item failed: {:?}", e)))?
                .is_some();
            storage
                .remove_item(&full)
                .map_err(|e| PrefsError::Io(format!("remove_item failed: {:?}", e)))?;
            Ok(existed)
        }
    }

    fn window_local_storage() -> Result<web_sys::Storage, PrefsError> {
        let win = web_sys::window().ok_or(PrefsError::StorageUnavailable)?;
        win.local_storage()
            .map_err(|e| PrefsError::Io(format!("localStorage error: {:?}", e)))?
            .ok_or(PrefsError::StorageUnavailable)
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_storage::LocalStoragePrefsStore;

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct LocalStoragePrefsStore;

#[cfg(not(target_arch = "wasm32"))]
impl LocalStoragePrefsStore {
    pub fn new(_key_prefix: impl Into<String>) -> Result<Self, PrefsError> {
        Err(PrefsError::StorageUnavailable)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl PrefsStore for LocalStoragePrefsStore {
    fn get(&self, _key: &str) -> Result<Option<String>, PrefsError> {
        Err(PrefsError::StorageUnavailable)
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), PrefsError> {
        Err(PrefsError::StorageUnavailable)
    }

    fn remove(&mut self, _key: &str) -> Result<bool, PrefsError> {
        Err(PrefsError::StorageUnavailable)
    }
}
