use std::fmt::{Debug, Formatter};

use serde::{Deserialize, Serialize};

use crate::{BASIC_SCHEME, encode_basic};

/// A username and password pair, as submitted by the user on login.
///
/// Serializes to the JSON login body `{"username": .., "password": ..}`.
/// The [Debug] representation never includes the password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// The username
    pub username: String,
    /// The password
    pub password: String,
}

impl Credentials {
    /// Create credentials from a username and password
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// The Basic-encoded credentials, without the scheme prefix
    pub fn basic(&self) -> String {
        encode_basic(&self.username, &self.password)
    }

    /// A complete `Authorization` header value, `Basic <encoded>`
    pub fn authorization(&self) -> String {
        format!("{BASIC_SCHEME} {}", self.basic())
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
