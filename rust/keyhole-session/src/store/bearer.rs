use async_trait::async_trait;
use keyhole_storage::StorageBackend;
use reqwest::header::{AUTHORIZATION, HeaderValue};

use super::ensure_success;
use crate::{
    DEFAULT_TOKEN_KEY, LoginResponse, RequestDescriptor, Session, SessionError, SessionStore,
    StorageScope,
};

/// A bearer token held in client-controlled storage and sent as
/// `Authorization: Bearer <token>`.
///
/// The scope of the store is the scope of its medium: pair
/// [BearerSessionStore::session_scoped] with storage that ends with the
/// browsing context (`sessionStorage`, process memory) and
/// [BearerSessionStore::durable] with storage that survives restarts
/// (`localStorage`, the file system).
#[derive(Clone, Debug)]
pub struct BearerSessionStore<B> {
    storage: B,
    scope: StorageScope,
    key: String,
    field: String,
}

impl<B> BearerSessionStore<B>
where
    B: StorageBackend,
{
    fn new(storage: B, scope: StorageScope) -> Self {
        Self {
            storage,
            scope,
            key: DEFAULT_TOKEN_KEY.to_string(),
            field: DEFAULT_TOKEN_KEY.to_string(),
        }
    }

    /// A store whose token ends with the browsing context
    pub fn session_scoped(storage: B) -> Self {
        Self::new(storage, StorageScope::Session)
    }

    /// A store whose token survives restarts
    pub fn durable(storage: B) -> Self {
        Self::new(storage, StorageScope::Durable)
    }

    /// Keep the token under `key` instead of `token`
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Read the token from login body field `field` instead of `token`
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    /// The lifetime of this store's medium
    pub fn scope(&self) -> StorageScope {
        self.scope
    }

    /// The medium
    pub fn storage(&self) -> &B {
        &self.storage
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl<B> SessionStore for BearerSessionStore<B>
where
    B: StorageBackend,
{
    async fn attach(&self, request: &mut RequestDescriptor) -> Result<(), SessionError> {
        let Some(token) = self.storage.get(&self.key).await? else {
            tracing::debug!(scope = ?self.scope, "No bearer token stored");
            return Ok(());
        };

        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|error| SessionError::InvalidHeader(error.to_string()))?;
        value.set_sensitive(true);
        request.headers.insert(AUTHORIZATION, value);

        Ok(())
    }

    async fn capture(&self, response: &LoginResponse) -> Result<(), SessionError> {
        ensure_success(response)?;

        // Parse completely before touching storage so a malformed body
        // leaves the previous token in place.
        let token = response.field(&self.field)?;
        self.storage.set(&self.key, token).await?;

        tracing::debug!(scope = ?self.scope, "Captured bearer token");
        Ok(())
    }

    async fn current(&self) -> Result<Option<Session>, SessionError> {
        Ok(self
            .storage
            .get(&self.key)
            .await?
            .map(|token| Session::Bearer {
                token,
                scope: self.scope,
            }))
    }
}
