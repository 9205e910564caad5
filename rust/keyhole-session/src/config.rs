use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{AntiForgeryTransport, BearerSessionStore, CookieSessionStore};
use keyhole_storage::StorageBackend;

/// Default storage key (and login body field) of a bearer token
pub const DEFAULT_TOKEN_KEY: &str = "token";
/// Default name of the readable anti-forgery cookie
pub const DEFAULT_ANTI_FORGERY_COOKIE: &str = "csrfToken";
/// Default header the anti-forgery token is echoed in
pub const DEFAULT_ANTI_FORGERY_HEADER: &str = "X-CSRF-Token";

/// Which session strategy a deployment uses. Exactly one is active at a
/// time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStrategy {
    /// Server-managed session cookie plus anti-forgery token
    #[default]
    Cookie,
    /// Bearer token in session-scoped storage
    SessionBearer,
    /// Bearer token in durable storage
    DurableBearer,
}

impl Display for SessionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionStrategy::Cookie => "cookie",
            SessionStrategy::SessionBearer => "session-bearer",
            SessionStrategy::DurableBearer => "durable-bearer",
        };
        f.write_str(name)
    }
}

impl FromStr for SessionStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "cookie" => Ok(SessionStrategy::Cookie),
            "session-bearer" => Ok(SessionStrategy::SessionBearer),
            "durable-bearer" => Ok(SessionStrategy::DurableBearer),
            other => Err(format!(
                "unknown session strategy '{other}' (expected cookie, session-bearer or durable-bearer)"
            )),
        }
    }
}

/// Configuration shared by all session strategies
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// The active strategy
    pub strategy: SessionStrategy,

    /// Storage key a bearer token is kept under
    pub token_key: String,

    /// Login body field carrying the session artifact
    pub token_field: String,

    /// Name of the readable anti-forgery cookie
    pub anti_forgery_cookie: String,

    /// Header the anti-forgery token is echoed in
    pub anti_forgery_header: String,

    /// How the anti-forgery token reaches the client
    pub anti_forgery_transport: AntiForgeryTransport,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            strategy: SessionStrategy::default(),
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            token_field: DEFAULT_TOKEN_KEY.to_string(),
            anti_forgery_cookie: DEFAULT_ANTI_FORGERY_COOKIE.to_string(),
            anti_forgery_header: DEFAULT_ANTI_FORGERY_HEADER.to_string(),
            anti_forgery_transport: AntiForgeryTransport::default(),
        }
    }
}

impl SessionConfig {
    /// Create a configuration for the given strategy
    pub fn new(strategy: SessionStrategy) -> Self {
        Self {
            strategy,
            ..Default::default()
        }
    }

    /// Set how the anti-forgery token is delivered
    pub fn with_anti_forgery_transport(mut self, transport: AntiForgeryTransport) -> Self {
        self.anti_forgery_transport = transport;
        self
    }

    /// Set the anti-forgery cookie and header names
    pub fn with_anti_forgery_names(
        mut self,
        cookie: impl Into<String>,
        header: impl Into<String>,
    ) -> Self {
        self.anti_forgery_cookie = cookie.into();
        self.anti_forgery_header = header.into();
        self
    }

    /// Set the bearer token storage key
    pub fn with_token_key(mut self, key: impl Into<String>) -> Self {
        self.token_key = key.into();
        self
    }

    /// Set the login body field carrying the session artifact
    pub fn with_token_field(mut self, field: impl Into<String>) -> Self {
        self.token_field = field.into();
        self
    }

    /// A cookie-mode store over `cookies`, configured from `self`
    pub fn cookie_store<B: StorageBackend>(&self, cookies: B) -> CookieSessionStore<B> {
        CookieSessionStore::new(cookies)
            .with_cookie_name(&self.anti_forgery_cookie)
            .with_header_name(&self.anti_forgery_header)
            .with_transport(self.anti_forgery_transport)
            .with_field(&self.token_field)
    }

    /// A bearer store over `storage`, configured from `self`. The scope
    /// follows the strategy; asking a cookie configuration for a bearer
    /// store yields a session-scoped one.
    pub fn bearer_store<B: StorageBackend>(&self, storage: B) -> BearerSessionStore<B> {
        let store = match self.strategy {
            SessionStrategy::DurableBearer => BearerSessionStore::durable(storage),
            SessionStrategy::Cookie | SessionStrategy::SessionBearer => {
                BearerSessionStore::session_scoped(storage)
            }
        };
        store
            .with_key(&self.token_key)
            .with_field(&self.token_field)
    }
}
