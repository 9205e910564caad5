#![warn(missing_docs)]

//! An HTTP client for an API protected by one of three session strategies.
//!
//! [AuthenticatedClient::login] exchanges credentials for a session, which
//! the configured [keyhole_session::SessionStore] captures. Every later
//! [AuthenticatedClient::request] goes through the same store, so callers
//! never handle tokens or anti-forgery values themselves.
//!
//! When the server answers a protected call with 401, the client sends the
//! user to the login entry point through a [Navigator] and returns
//! [ClientError::AuthRequired].

mod config;
pub use config::*;

mod error;
pub use error::*;

mod navigator;
pub use navigator::*;

mod client;
pub use client::*;

mod open;

mod spaces;
pub use spaces::*;
