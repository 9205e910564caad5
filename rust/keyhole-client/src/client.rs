use std::sync::Arc;

use keyhole_credentials::Credentials;
use keyhole_session::{LoginResponse, RequestDescriptor, SessionStore};
use reqwest::{
    Client, Method, Response, StatusCode,
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue},
};
use serde_json::Value;
use url::Url;

use crate::{ClientConfig, ClientError, LoginMethod, Navigator};

/// An HTTP client for the protected API.
///
/// Every request goes through the configured [SessionStore], which attaches
/// whatever the active strategy needs (a bearer token, or ambient cookies
/// plus an anti-forgery header). A 401 sends the user to the login entry
/// point through the [Navigator].
///
/// ```no_run
/// use std::sync::Arc;
///
/// use keyhole_client::{AuthenticatedClient, ClientConfig, RecordingNavigator};
/// use keyhole_credentials::Credentials;
/// use keyhole_session::BearerSessionStore;
/// use keyhole_storage::MemoryStorageBackend;
/// use reqwest::Method;
///
/// # async fn example() -> Result<(), keyhole_client::ClientError> {
/// let client = AuthenticatedClient::new(
///     ClientConfig::new("https://localhost:4567"),
///     Arc::new(BearerSessionStore::session_scoped(MemoryStorageBackend::default())),
///     Arc::new(RecordingNavigator::default()),
/// )?;
///
/// client.login(&Credentials::new("alice", "s3cret")).await?;
/// let messages = client.request(Method::GET, "/spaces/1/messages", None).await?;
/// # let _ = messages;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AuthenticatedClient {
    config: ClientConfig,
    endpoint: Url,
    headers: HeaderMap,
    http: Client,
    session: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl AuthenticatedClient {
    /// Create a client with a default HTTP transport
    pub fn new(
        config: ClientConfig,
        session: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ClientError> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|error| ClientError::InvalidUrl(format!("{}: {error}", config.endpoint)))?;

        let mut headers = HeaderMap::new();
        for (key, value) in &config.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|error| ClientError::InvalidHeader(format!("{key}: {error}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|error| ClientError::InvalidHeader(format!("{key}: {error}")))?;
            headers.append(name, value);
        }

        Ok(Self {
            config,
            endpoint,
            headers,
            http: Client::new(),
            session,
            navigator,
        })
    }

    /// Use `http` as the transport. In cookie mode on native targets this
    /// must be a client sharing the session store's cookie jar.
    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    /// The configuration this client was built with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The session store every request goes through
    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    /// Send an authenticated request to `path` and return the parsed JSON
    /// response. An empty body yields [Value::Null].
    ///
    /// `path` is relative to the endpoint. An absolute URL is accepted only
    /// when it shares the endpoint's origin; the session is never attached
    /// to any other origin.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        let mut request = self.describe(method, self.url_for(path)?);
        if let Some(body) = body {
            request.body = Some(
                serde_json::to_vec(body)
                    .map_err(|error| ClientError::InvalidBody(error.to_string()))?,
            );
        }

        self.session.attach(&mut request).await?;

        let response = self.send(request).await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(path, "Authentication required; redirecting to login");
            self.navigator.redirect(&self.config.login_path);
            return Err(ClientError::AuthRequired);
        }

        if !status.is_success() {
            tracing::debug!(path, status = status.as_u16(), "Request failed");
            return Err(ClientError::from_status(status));
        }

        let body = response
            .bytes()
            .await
            .map_err(|error| ClientError::Network(error.without_url().to_string()))?;
        if body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&body).map_err(|error| ClientError::InvalidBody(error.to_string()))
    }

    /// Exchange `credentials` for a session.
    ///
    /// On a 2xx response the session store captures the artifact and, when
    /// a home path is configured, the user is sent there. Any other status
    /// is returned as [ClientError::Request] and the session is left as it
    /// was.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), ClientError> {
        let mut request = self.describe(Method::POST, self.url_for(&self.config.session_path)?);
        request.include_credentials = true;

        match self.config.login_method {
            LoginMethod::Basic => {
                let mut value = HeaderValue::from_str(&credentials.authorization())
                    .map_err(|error| ClientError::InvalidHeader(error.to_string()))?;
                value.set_sensitive(true);
                request.headers.insert(AUTHORIZATION, value);
            }
            LoginMethod::JsonBody => {
                request.body = Some(
                    serde_json::to_vec(credentials)
                        .map_err(|error| ClientError::InvalidBody(error.to_string()))?,
                );
            }
        }

        let response = self.send(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|error| ClientError::Network(error.without_url().to_string()))?
            .to_vec();

        let login = LoginResponse {
            status,
            headers,
            body,
        };

        if !login.is_success() {
            tracing::warn!(status = status.as_u16(), "Login refused");
            return Err(ClientError::from_status(status));
        }

        self.session.capture(&login).await?;
        tracing::info!(username = %credentials.username, "Logged in");

        if let Some(home) = &self.config.home_path {
            self.navigator.redirect(home);
        }

        Ok(())
    }

    fn url_for(&self, path: &str) -> Result<Url, ClientError> {
        if let Ok(url) = Url::parse(path) {
            if url.origin() != self.endpoint.origin() {
                tracing::warn!(
                    origin = %url.origin().ascii_serialization(),
                    "Refusing a request outside the endpoint origin"
                );
                return Err(ClientError::InvalidUrl(format!(
                    "{} is not under {}",
                    url.origin().ascii_serialization(),
                    self.endpoint.origin().ascii_serialization()
                )));
            }
            return Ok(url);
        }
        let joined = format!("{}{path}", self.config.endpoint.trim_end_matches('/'));
        Url::parse(&joined).map_err(|error| ClientError::InvalidUrl(format!("{joined}: {error}")))
    }

    fn describe(&self, method: Method, url: Url) -> RequestDescriptor {
        let mut request = RequestDescriptor::new(method, url);
        request
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in &self.headers {
            request.headers.append(name.clone(), value.clone());
        }
        request
    }

    async fn send(&self, request: RequestDescriptor) -> Result<Response, ClientError> {
        tracing::debug!(method = %request.method, path = request.url.path(), "Sending request");

        let mut builder = self
            .http
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        // Native transports send the jar's cookies on every request.
        #[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
        if request.include_credentials {
            builder = builder.fetch_credentials_include();
        }

        builder
            .send()
            .await
            .map_err(|error| ClientError::Network(error.without_url().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use keyhole_session::BearerSessionStore;
    use keyhole_storage::MemoryStorageBackend;

    use super::*;
    use crate::RecordingNavigator;

    fn client(endpoint: &str) -> Result<AuthenticatedClient, ClientError> {
        AuthenticatedClient::new(
            ClientConfig::new(endpoint).with_header("X-Client", "keyhole"),
            Arc::new(BearerSessionStore::session_scoped(
                MemoryStorageBackend::default(),
            )),
            Arc::new(RecordingNavigator::default()),
        )
    }

    #[test]
    fn it_joins_paths_onto_the_endpoint() -> Result<(), ClientError> {
        let client = client("https://localhost:4567/")?;

        assert_eq!(
            client.url_for("/spaces/1/messages")?.as_str(),
            "https://localhost:4567/spaces/1/messages"
        );
        assert_eq!(
            client.url_for("https://localhost:4567/caps")?.as_str(),
            "https://localhost:4567/caps"
        );
        Ok(())
    }

    #[test]
    fn it_refuses_urls_outside_the_endpoint_origin() -> Result<(), ClientError> {
        let client = client("https://localhost:4567")?;

        for url in [
            "https://other.example/spaces/1",
            "http://localhost:4567/spaces/1",
            "https://localhost:4568/spaces/1",
        ] {
            assert!(matches!(client.url_for(url), Err(ClientError::InvalidUrl(_))));
        }
        Ok(())
    }

    #[test]
    fn it_marks_every_request_as_json() -> Result<(), ClientError> {
        let client = client("https://localhost:4567")?;
        let request = client.describe(Method::GET, client.url_for("/spaces")?);

        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.header("x-client"), Some("keyhole"));
        Ok(())
    }

    #[test]
    fn it_rejects_an_invalid_endpoint() {
        assert!(matches!(
            client("not a url"),
            Err(ClientError::InvalidUrl(_))
        ));
    }
}
