use std::sync::Arc;

use async_trait::async_trait;
use keyhole_common::ConditionalSync;

use crate::{LoginResponse, RequestDescriptor, Session, SessionError};

mod bearer;
pub use bearer::*;

mod cookie;
pub use cookie::*;

/// Where an authenticated identity lives between requests, and how it is
/// presented to the server.
///
/// Implementations never log the artifacts they handle.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait SessionStore: ConditionalSync {
    /// Add whatever the server needs to authenticate `request`. With no
    /// session present the request is left unauthenticated and the server
    /// decides.
    async fn attach(&self, request: &mut RequestDescriptor) -> Result<(), SessionError>;

    /// Extract the session artifact from a login response and write it to
    /// the medium. A non-2xx response is refused with
    /// [SessionError::Unsuccessful] and nothing is written.
    async fn capture(&self, response: &LoginResponse) -> Result<(), SessionError>;

    /// A snapshot of the session as currently stored, if any
    async fn current(&self) -> Result<Option<Session>, SessionError>;
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl<T> SessionStore for Arc<T>
where
    T: SessionStore + ?Sized,
{
    async fn attach(&self, request: &mut RequestDescriptor) -> Result<(), SessionError> {
        self.as_ref().attach(request).await
    }

    async fn capture(&self, response: &LoginResponse) -> Result<(), SessionError> {
        self.as_ref().capture(response).await
    }

    async fn current(&self) -> Result<Option<Session>, SessionError> {
        self.as_ref().current().await
    }
}

pub(crate) fn ensure_success(response: &LoginResponse) -> Result<(), SessionError> {
    if response.is_success() {
        Ok(())
    } else {
        Err(SessionError::Unsuccessful(response.status))
    }
}
