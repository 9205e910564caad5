use std::fmt::{Debug, Formatter};

use serde::{Deserialize, Serialize};

/// How long a storage medium keeps its contents
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageScope {
    /// Cleared when the browsing context (or process) ends
    Session,
    /// Kept until explicitly cleared
    Durable,
}

/// A snapshot of the client's authenticated identity.
///
/// The [Debug] representation never includes secrets.
#[derive(Clone, PartialEq, Eq)]
pub enum Session {
    /// An HTTP-only session cookie (invisible to the client) and its
    /// readable anti-forgery companion
    Cookie {
        /// The anti-forgery token echoed on requests
        anti_forgery: String,
    },
    /// A bearer token held in client-controlled storage
    Bearer {
        /// The token
        token: String,
        /// Lifetime of the storage holding the token
        scope: StorageScope,
    },
}

impl Debug for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Session::Cookie { .. } => f
                .debug_struct("Cookie")
                .field("anti_forgery", &"<redacted>")
                .finish(),
            Session::Bearer { scope, .. } => f
                .debug_struct("Bearer")
                .field("token", &"<redacted>")
                .field("scope", scope)
                .finish(),
        }
    }
}
