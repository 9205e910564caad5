//! Wiring a client to the media its session strategy calls for.

use std::sync::Arc;

use keyhole_session::{SessionConfig, SessionError, SessionStore, SessionStrategy};

use crate::{AuthenticatedClient, ClientConfig, ClientError, Navigator};

#[cfg(not(target_arch = "wasm32"))]
impl AuthenticatedClient {
    /// Open a client whose session lives where `session.strategy` says:
    ///
    /// - cookie: a cookie jar shared with the HTTP transport
    /// - session bearer: process memory
    /// - durable bearer: files under `storage_dir`
    pub async fn open(
        config: ClientConfig,
        session: &SessionConfig,
        storage_dir: impl AsRef<std::path::Path>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ClientError> {
        use keyhole_storage::{CookieJarBackend, FileSystemStorageBackend, MemoryStorageBackend};
        use reqwest::{Client, cookie::Jar};
        use url::Url;

        match session.strategy {
            SessionStrategy::Cookie => {
                let origin = Url::parse(&config.endpoint).map_err(|error| {
                    ClientError::InvalidUrl(format!("{}: {error}", config.endpoint))
                })?;
                let jar = Arc::new(Jar::default());
                let http = Client::builder()
                    .cookie_provider(jar.clone())
                    .build()
                    .map_err(|error| ClientError::Network(error.without_url().to_string()))?;
                let store = session.cookie_store(CookieJarBackend::new(jar, origin));

                Ok(Self::new(config, Arc::new(store), navigator)?.with_http_client(http))
            }
            SessionStrategy::SessionBearer => {
                let store = session.bearer_store(MemoryStorageBackend::default());
                Self::new(config, Arc::new(store), navigator)
            }
            SessionStrategy::DurableBearer => {
                let storage = FileSystemStorageBackend::new(storage_dir.as_ref())
                    .await
                    .map_err(SessionError::from)?;
                let store: Arc<dyn SessionStore> = Arc::new(session.bearer_store(storage));
                Self::new(config, store, navigator)
            }
        }
    }
}

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
impl AuthenticatedClient {
    /// Open a client for the current page. The session lives in
    /// `document.cookie`, `sessionStorage` or `localStorage` depending on
    /// `session.strategy`, and 401s navigate the window.
    pub fn open(config: ClientConfig, session: &SessionConfig) -> Result<Self, ClientError> {
        use keyhole_storage::{DocumentCookieBackend, WebStorageBackend};

        use crate::WindowNavigator;

        let store: Arc<dyn SessionStore> = match session.strategy {
            SessionStrategy::Cookie => Arc::new(
                session.cookie_store(DocumentCookieBackend::open().map_err(SessionError::from)?),
            ),
            SessionStrategy::SessionBearer => Arc::new(
                session.bearer_store(WebStorageBackend::session().map_err(SessionError::from)?),
            ),
            SessionStrategy::DurableBearer => Arc::new(
                session.bearer_store(WebStorageBackend::local().map_err(SessionError::from)?),
            ),
        };

        Self::new(config, store, Arc::new(WindowNavigator))
    }
}
