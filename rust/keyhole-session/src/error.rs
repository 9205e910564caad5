use keyhole_storage::StorageError;
use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur while capturing or attaching a session
#[derive(Error, Debug)]
pub enum SessionError {
    /// Capture was asked to read a response that is not a success. Nothing
    /// was written.
    #[error("Refusing to capture a session from an unsuccessful response ({0})")]
    Unsuccessful(StatusCode),

    /// The login response did not carry the expected artifact
    #[error("Login response is missing the '{0}' field")]
    MissingArtifact(String),

    /// The login response body could not be parsed
    #[error("Login response body is not valid JSON: {0}")]
    InvalidBody(String),

    /// A stored artifact cannot be expressed as a header
    #[error("Session artifact is not a valid header: {0}")]
    InvalidHeader(String),

    /// The session medium failed
    #[error(transparent)]
    Storage(#[from] StorageError),
}
