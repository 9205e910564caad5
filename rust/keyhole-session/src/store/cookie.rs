use async_trait::async_trait;
use keyhole_storage::StorageBackend;
use reqwest::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use super::ensure_success;
use crate::{
    DEFAULT_ANTI_FORGERY_COOKIE, DEFAULT_ANTI_FORGERY_HEADER, DEFAULT_TOKEN_KEY, LoginResponse,
    RequestDescriptor, Session, SessionError, SessionStore,
};

/// How the anti-forgery token reaches the client after login
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AntiForgeryTransport {
    /// The server sets a readable cookie itself
    #[default]
    Cookie,
    /// The server returns the token in the login body and the client
    /// stores it in the readable cookie
    ResponseBody,
}

/// Cookie-mode sessions (double-submit).
///
/// The session cookie is HTTP-only and managed entirely by the transport.
/// This store only handles its readable companion: it echoes the
/// anti-forgery token in a header and asks the transport to send ambient
/// credentials.
#[derive(Clone, Debug)]
pub struct CookieSessionStore<B> {
    cookies: B,
    transport: AntiForgeryTransport,
    cookie_name: String,
    header_name: String,
    field: String,
}

impl<B> CookieSessionStore<B>
where
    B: StorageBackend,
{
    /// A store reading the anti-forgery cookie from `cookies`
    pub fn new(cookies: B) -> Self {
        Self {
            cookies,
            transport: AntiForgeryTransport::default(),
            cookie_name: DEFAULT_ANTI_FORGERY_COOKIE.to_string(),
            header_name: DEFAULT_ANTI_FORGERY_HEADER.to_string(),
            field: DEFAULT_TOKEN_KEY.to_string(),
        }
    }

    /// Set how the anti-forgery token is delivered
    pub fn with_transport(mut self, transport: AntiForgeryTransport) -> Self {
        self.transport = transport;
        self
    }

    /// Read the anti-forgery token from the cookie `name`
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Echo the anti-forgery token in header `name`
    pub fn with_header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = name.into();
        self
    }

    /// Login body field carrying the token under
    /// [AntiForgeryTransport::ResponseBody]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    /// The cookie medium
    pub fn cookies(&self) -> &B {
        &self.cookies
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl<B> SessionStore for CookieSessionStore<B>
where
    B: StorageBackend,
{
    async fn attach(&self, request: &mut RequestDescriptor) -> Result<(), SessionError> {
        request.include_credentials = true;

        let Some(token) = self.cookies.get(&self.cookie_name).await? else {
            tracing::debug!(cookie = %self.cookie_name, "No anti-forgery token available");
            return Ok(());
        };

        let name = HeaderName::from_bytes(self.header_name.as_bytes())
            .map_err(|error| SessionError::InvalidHeader(error.to_string()))?;
        let mut value = HeaderValue::from_str(&token)
            .map_err(|error| SessionError::InvalidHeader(error.to_string()))?;
        value.set_sensitive(true);
        request.headers.insert(name, value);

        Ok(())
    }

    async fn capture(&self, response: &LoginResponse) -> Result<(), SessionError> {
        ensure_success(response)?;

        match self.transport {
            AntiForgeryTransport::Cookie => {
                tracing::debug!("Anti-forgery cookie is set by the server");
            }
            AntiForgeryTransport::ResponseBody => {
                let token = response.field(&self.field)?;
                self.cookies.set(&self.cookie_name, token).await?;
                tracing::debug!(cookie = %self.cookie_name, "Stored anti-forgery token");
            }
        }

        Ok(())
    }

    async fn current(&self) -> Result<Option<Session>, SessionError> {
        Ok(self
            .cookies
            .get(&self.cookie_name)
            .await?
            .map(|anti_forgery| Session::Cookie { anti_forgery }))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use keyhole_storage::{MemoryStorageBackend, StorageBackend};
    use pretty_assertions::assert_eq;
    use reqwest::{Method, StatusCode};
    use url::Url;

    use crate::{
        AntiForgeryTransport, CookieSessionStore, LoginResponse, RequestDescriptor, Session,
        SessionError, SessionStore,
    };

    #[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
    use wasm_bindgen_test::wasm_bindgen_test;

    fn request() -> Result<RequestDescriptor> {
        Ok(RequestDescriptor::new(
            Method::POST,
            Url::parse("https://localhost:4567/spaces")?,
        ))
    }

    #[cfg_attr(all(target_arch = "wasm32", target_os = "unknown"), wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
    async fn it_echoes_the_anti_forgery_cookie() -> Result<()> {
        let cookies = MemoryStorageBackend::default();
        cookies.set("csrfToken", "f00d".into()).await?;
        let store = CookieSessionStore::new(cookies);

        let mut request = request()?;
        store.attach(&mut request).await?;

        assert!(request.include_credentials);
        assert_eq!(request.header("X-CSRF-Token"), Some("f00d"));
        assert_eq!(request.header("Authorization"), None);
        Ok(())
    }

    #[cfg_attr(all(target_arch = "wasm32", target_os = "unknown"), wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
    async fn it_still_sends_credentials_without_a_token() -> Result<()> {
        let store = CookieSessionStore::new(MemoryStorageBackend::default());

        let mut request = request()?;
        store.attach(&mut request).await?;

        assert!(request.include_credentials);
        assert!(request.headers.is_empty());
        assert_eq!(store.current().await?, None);
        Ok(())
    }

    #[cfg_attr(all(target_arch = "wasm32", target_os = "unknown"), wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
    async fn it_leaves_server_set_cookies_to_the_server() -> Result<()> {
        let cookies = MemoryStorageBackend::default();
        let store = CookieSessionStore::new(cookies.clone());

        store
            .capture(&LoginResponse::new(
                StatusCode::OK,
                br#"{"token":"f00d"}"#.to_vec(),
            ))
            .await?;

        assert_eq!(cookies.get("csrfToken").await?, None);
        Ok(())
    }

    #[cfg_attr(all(target_arch = "wasm32", target_os = "unknown"), wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
    async fn it_stores_a_body_delivered_token_in_the_cookie() -> Result<()> {
        let cookies = MemoryStorageBackend::default();
        let store = CookieSessionStore::new(cookies.clone())
            .with_transport(AntiForgeryTransport::ResponseBody);

        store
            .capture(&LoginResponse::new(
                StatusCode::OK,
                br#"{"token":"f00d"}"#.to_vec(),
            ))
            .await?;

        assert_eq!(cookies.get("csrfToken").await?, Some("f00d".into()));
        assert_eq!(
            store.current().await?,
            Some(Session::Cookie {
                anti_forgery: "f00d".into()
            })
        );
        Ok(())
    }

    #[cfg_attr(all(target_arch = "wasm32", target_os = "unknown"), wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
    async fn it_writes_nothing_when_the_field_is_missing() -> Result<()> {
        let cookies = MemoryStorageBackend::default();
        cookies.set("csrfToken", "previous".into()).await?;
        let store = CookieSessionStore::new(cookies.clone())
            .with_transport(AntiForgeryTransport::ResponseBody);

        let result = store
            .capture(&LoginResponse::new(StatusCode::OK, b"{}".to_vec()))
            .await;

        assert!(matches!(result, Err(SessionError::MissingArtifact(_))));
        assert_eq!(cookies.get("csrfToken").await?, Some("previous".into()));
        Ok(())
    }

    #[cfg_attr(all(target_arch = "wasm32", target_os = "unknown"), wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
    async fn it_refuses_unsuccessful_logins() -> Result<()> {
        let cookies = MemoryStorageBackend::default();
        let store = CookieSessionStore::new(cookies.clone())
            .with_transport(AntiForgeryTransport::ResponseBody);

        let result = store
            .capture(&LoginResponse::new(
                StatusCode::UNAUTHORIZED,
                br#"{"token":"f00d"}"#.to_vec(),
            ))
            .await;

        assert!(matches!(result, Err(SessionError::Unsuccessful(_))));
        assert_eq!(cookies.get("csrfToken").await?, None);
        Ok(())
    }

    #[cfg_attr(all(target_arch = "wasm32", target_os = "unknown"), wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
    async fn it_uses_custom_cookie_and_header_names() -> Result<()> {
        let cookies = MemoryStorageBackend::default();
        cookies.set("XSRF-TOKEN", "f00d".into()).await?;
        let store = CookieSessionStore::new(cookies)
            .with_cookie_name("XSRF-TOKEN")
            .with_header_name("X-XSRF-TOKEN");

        let mut request = request()?;
        store.attach(&mut request).await?;

        assert_eq!(request.header("x-xsrf-token"), Some("f00d"));
        assert_eq!(request.header("X-CSRF-Token"), None);
        Ok(())
    }
}
