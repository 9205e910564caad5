use std::sync::Arc;

use async_trait::async_trait;
use keyhole_common::ConditionalSync;

use crate::StorageError;

mod memory;
pub use memory::*;

mod cookie;
pub use cookie::*;

#[cfg(not(target_arch = "wasm32"))]
mod fs;
#[cfg(not(target_arch = "wasm32"))]
pub use fs::*;

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
mod web;
#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
pub use web::*;

/// A [StorageBackend] is a facade over some storage medium that is capable
/// of storing and retrieving string values by string key.
///
/// `set` takes `&self`: media are shared between the session store that
/// writes them and the transport that reads them (e.g. a cookie jar), so
/// implementations use interior mutability.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait StorageBackend: ConditionalSync {
    /// Retrieve the value (if any) stored against the given key
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    /// Store the given value against the given key, replacing any prior value
    async fn set(&self, key: &str, value: String) -> Result<(), StorageError>;
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl<T> StorageBackend for Arc<T>
where
    T: StorageBackend + ?Sized,
{
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.as_ref().get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.as_ref().set(key, value).await
    }
}
