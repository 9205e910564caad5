use async_trait::async_trait;
use web_sys::Storage;

use crate::StorageError;

use super::StorageBackend;

/// The Web Storage API: `sessionStorage` (cleared when the tab closes) or
/// `localStorage` (kept until explicitly cleared).
#[derive(Clone)]
pub struct WebStorageBackend {
    storage: Storage,
}

impl WebStorageBackend {
    /// The current window's `sessionStorage`
    pub fn session() -> Result<Self, StorageError> {
        let window = web_sys::window().ok_or_else(|| StorageError::Unavailable("no window".into()))?;
        let storage = window
            .session_storage()
            .map_err(|error| StorageError::Unavailable(format!("{error:?}")))?
            .ok_or_else(|| StorageError::Unavailable("sessionStorage".into()))?;
        Ok(Self { storage })
    }

    /// The current window's `localStorage`
    pub fn local() -> Result<Self, StorageError> {
        let window = web_sys::window().ok_or_else(|| StorageError::Unavailable("no window".into()))?;
        let storage = window
            .local_storage()
            .map_err(|error| StorageError::Unavailable(format!("{error:?}")))?
            .ok_or_else(|| StorageError::Unavailable("localStorage".into()))?;
        Ok(Self { storage })
    }
}

#[async_trait(?Send)]
impl StorageBackend for WebStorageBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage
            .get_item(key)
            .map_err(|error| StorageError::Backend(format!("{error:?}")))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.storage
            .set_item(key, &value)
            .map_err(|error| StorageError::Backend(format!("{error:?}")))
    }
}
