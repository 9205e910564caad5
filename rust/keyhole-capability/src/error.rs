use reqwest::StatusCode;
use thiserror::Error;

use crate::TokenSlot;

/// Errors that can occur while resolving a capability URL. None of them
/// carry the token.
#[derive(Error, Debug)]
pub enum CapabilityResolutionError {
    /// The input is not an absolute URL, or its token slot cannot be
    /// cleared
    #[error("Invalid capability URL: {0}")]
    InvalidUrl(String),

    /// The configured slot holds no token
    #[error("Capability URL carries no token in its {0}")]
    MissingToken(TokenSlot),

    /// No response was received
    #[error("Network error: {0}")]
    Network(String),

    /// The capability endpoint answered with a non-2xx status
    #[error("Capability request failed: HTTP {}", .0.as_u16())]
    Status(StatusCode),

    /// The response body is not JSON
    #[error("Invalid capability response body: {0}")]
    InvalidBody(String),

    /// A list capability resolved to something other than an array of
    /// capability URLs
    #[error("Capability list is not an array of URLs: {0}")]
    NotAList(String),
}
