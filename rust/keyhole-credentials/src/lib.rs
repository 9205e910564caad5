#![warn(missing_docs)]

//! Credentials a user submits once to bootstrap a session, and the
//! Basic-auth encoding used to carry them in an `Authorization` header.
//!
//! ```rust
//! use keyhole_credentials::{Credentials, encode_basic};
//!
//! assert_eq!(encode_basic("alice", "s3cret"), "YWxpY2U6czNjcmV0");
//!
//! let credentials = Credentials::new("alice", "s3cret");
//! assert_eq!(credentials.authorization(), "Basic YWxpY2U6czNjcmV0");
//! ```

mod basic;
pub use basic::*;

mod credentials;
pub use credentials::*;
