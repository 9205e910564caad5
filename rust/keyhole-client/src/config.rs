use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

/// Default API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://localhost:4567";
/// Default login endpoint, relative to [ClientConfig::endpoint]
pub const DEFAULT_SESSION_PATH: &str = "/sessions";
/// Default login entry point the client is sent to on a 401
pub const DEFAULT_LOGIN_PATH: &str = "/login.html";

/// How credentials are presented to the login endpoint
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoginMethod {
    /// `Authorization: Basic <base64(username:password)>`
    #[default]
    Basic,
    /// A JSON body `{"username": .., "password": ..}`
    JsonBody,
}

impl Display for LoginMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoginMethod::Basic => f.write_str("basic"),
            LoginMethod::JsonBody => f.write_str("json-body"),
        }
    }
}

impl FromStr for LoginMethod {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "basic" => Ok(LoginMethod::Basic),
            "json-body" => Ok(LoginMethod::JsonBody),
            other => Err(format!(
                "unknown login method '{other}' (expected basic or json-body)"
            )),
        }
    }
}

/// Configuration for an [crate::AuthenticatedClient]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL every path is appended to (e.g. "https://localhost:4567")
    pub endpoint: String,

    /// Path of the login endpoint
    pub session_path: String,

    /// Where to send the user when a protected call is answered by 401
    pub login_path: String,

    /// Where to send the user after a successful login, if anywhere
    pub home_path: Option<String>,

    /// How credentials are presented on login
    pub login_method: LoginMethod,

    /// Custom headers to send with each request
    pub headers: Vec<(String, String)>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            session_path: DEFAULT_SESSION_PATH.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            home_path: None,
            login_method: LoginMethod::default(),
            headers: Vec::new(),
        }
    }
}

impl ClientConfig {
    /// Create a new client configuration for `endpoint`
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Set the login endpoint path
    pub fn with_session_path(mut self, path: impl Into<String>) -> Self {
        self.session_path = path.into();
        self
    }

    /// Set the login entry point used on 401
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Navigate to `path` after a successful login
    pub fn with_home_path(mut self, path: impl Into<String>) -> Self {
        self.home_path = Some(path.into());
        self
    }

    /// Set how credentials are presented on login
    pub fn with_login_method(mut self, method: LoginMethod) -> Self {
        self.login_method = method;
        self
    }

    /// Add a custom header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }
}
