use keyhole_session::SessionError;
use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when talking to the API
#[derive(Error, Debug)]
pub enum ClientError {
    /// The server answered 401. The user has been sent to the login entry
    /// point and no data was delivered.
    #[error("Authentication required")]
    AuthRequired,

    /// The server answered with a non-2xx status other than 401
    #[error("Request failed: HTTP {} - {}", .status.as_u16(), .status_text)]
    Request {
        /// Response status
        status: StatusCode,
        /// Reason phrase
        status_text: String,
    },

    /// No response was received
    #[error("Network error: {0}")]
    Network(String),

    /// The response body was not the expected JSON
    #[error("Invalid response body: {0}")]
    InvalidBody(String),

    /// A path or endpoint could not be turned into a URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A configured header or login credential cannot be sent as a header
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// The session store failed to attach or capture
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ClientError {
    pub(crate) fn from_status(status: StatusCode) -> Self {
        ClientError::Request {
            status,
            status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
    }
}
