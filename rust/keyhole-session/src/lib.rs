#![warn(missing_docs)]

//! Session stores decide where the client's authenticated identity lives and
//! how it is attached to outgoing requests.
//!
//! A [SessionStore] has two jobs:
//!
//! - [SessionStore::capture] extracts the session artifact from a successful
//!   login response and writes it to the store's medium.
//! - [SessionStore::attach] adds whatever the server needs to authenticate
//!   an outgoing [RequestDescriptor].
//!
//! Three strategies are provided:
//!
//! - [CookieSessionStore]: the server sets an HTTP-only session cookie; the
//!   client echoes a readable anti-forgery token in a header
//!   (double-submit).
//! - [BearerSessionStore::session_scoped]: a bearer token in storage that
//!   ends with the browsing context.
//! - [BearerSessionStore::durable]: a bearer token in storage that survives
//!   restarts.
//!
//! The store is the only component that reads or writes the session medium.
//! Everything else sees the session only through `attach`.
//!
//! ```rust
//! use keyhole_session::{BearerSessionStore, LoginResponse, RequestDescriptor, SessionStore};
//! use keyhole_storage::MemoryStorageBackend;
//! use reqwest::{Method, StatusCode};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = BearerSessionStore::session_scoped(MemoryStorageBackend::default());
//!
//! let login = LoginResponse::new(StatusCode::CREATED, br#"{"token":"abc"}"#.to_vec());
//! store.capture(&login).await?;
//!
//! let mut request = RequestDescriptor::new(Method::GET, "https://localhost:4567/spaces".parse()?);
//! store.attach(&mut request).await?;
//!
//! assert_eq!(request.header("authorization"), Some("Bearer abc"));
//! # Ok(())
//! # }
//! ```

mod error;
pub use error::*;

mod request;
pub use request::*;

mod session;
pub use session::*;

mod config;
pub use config::*;

mod store;
pub use store::*;
