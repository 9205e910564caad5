use reqwest::{
    Method, StatusCode,
    header::{CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::SessionError;

/// An outgoing request before it is handed to the transport. Session stores
/// mutate it in [crate::SessionStore::attach].
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
    /// HTTP method
    pub method: Method,
    /// Absolute request URL
    pub url: Url,
    /// Request headers
    pub headers: HeaderMap,
    /// Serialized request body, if any
    pub body: Option<Vec<u8>>,
    /// Whether the transport should attach ambient credentials (cookies).
    /// Maps to `credentials: 'include'` in the browser.
    pub include_credentials: bool,
}

impl RequestDescriptor {
    /// A request with no headers, no body and no ambient credentials
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            include_credentials: false,
        }
    }

    /// Serialize `body` as JSON and mark the request as carrying JSON
    pub fn json<T>(mut self, body: &T) -> Result<Self, serde_json::Error>
    where
        T: Serialize + ?Sized,
    {
        self.body = Some(serde_json::to_vec(body)?);
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(self)
    }

    /// The value of the named header, if present and printable
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

/// The parts of a login response a session store may capture from
#[derive(Clone, Debug)]
pub struct LoginResponse {
    /// Response status
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Raw response body
    pub body: Vec<u8>,
}

impl LoginResponse {
    /// A response with no headers
    pub fn new(status: StatusCode, body: Vec<u8>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body,
        }
    }

    /// Whether the login succeeded (2xx)
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Read a string field from the JSON body
    pub fn field(&self, name: &str) -> Result<String, SessionError> {
        let body: Value = serde_json::from_slice(&self.body)
            .map_err(|error| SessionError::InvalidBody(error.to_string()))?;
        body.get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| SessionError::MissingArtifact(name.to_string()))
    }
}
