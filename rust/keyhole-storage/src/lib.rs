#![warn(missing_docs)]

//! This crate contains the storage media a session artifact can live in.
//!
//! Every medium implements [StorageBackend], a minimal string key/value
//! facade. Which concrete medium backs a session decides its lifetime:
//!
//! | Medium                      | Target | Lifetime                       |
//! |-----------------------------|--------|--------------------------------|
//! | [MemoryStorageBackend]      | any    | ends with the process          |
//! | `FileSystemStorageBackend`  | native | survives restarts              |
//! | `WebStorageBackend::session`| web    | ends with the tab              |
//! | `WebStorageBackend::local`  | web    | survives restarts              |
//! | `CookieJarBackend`          | native | the cookie jar's               |
//! | `DocumentCookieBackend`     | web    | the browser's cookie store     |
//!
//! ```rust
//! use keyhole_storage::{MemoryStorageBackend, StorageBackend};
//!
//! # async fn example() -> Result<(), keyhole_storage::StorageError> {
//! let storage = MemoryStorageBackend::default();
//! storage.set("token", "abc".into()).await?;
//!
//! assert_eq!(storage.get("token").await?, Some("abc".into()));
//! # Ok(())
//! # }
//! ```

mod error;
pub use error::*;

mod backend;
pub use backend::*;
