use thiserror::Error;

/// The common error type used by this crate
#[derive(Error, Debug)]
pub enum StorageError {
    /// The medium does not exist in this environment (e.g. storage access is
    /// disabled in the browser)
    #[error("Storage medium unavailable: {0}")]
    Unavailable(String),

    /// An error that occurs when reading or writing the medium
    #[error("Storage backend error: {0}")]
    Backend(String),
}
