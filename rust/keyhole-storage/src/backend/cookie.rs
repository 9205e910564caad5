//! Cookies as a storage medium.
//!
//! In cookie mode the server owns the session cookie and the client only
//! ever touches the script-readable companion cookie that carries the
//! anti-forgery token. These backends expose the cookies visible for one
//! origin through [StorageBackend], so the session store can treat them like
//! any other medium.

#[cfg(not(target_arch = "wasm32"))]
pub use jar::*;

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
pub use document::*;

/// Find `name` in a `Cookie`-style header (`a=1; b=2`). Both names and
/// values are percent-decoded before comparison.
pub fn find_cookie(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (decode(key.trim()), decode(value.trim())))
        .find(|(key, _)| key == name)
        .map(|(_, value)| value)
}

fn decode(component: &str) -> String {
    urlencoding::decode(component)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| component.to_string())
}

#[cfg(not(target_arch = "wasm32"))]
mod jar {
    use std::sync::Arc;

    use async_trait::async_trait;
    use reqwest::cookie::{CookieStore, Jar};
    use url::Url;

    use super::find_cookie;
    use crate::{StorageBackend, StorageError};

    /// Cookies for one origin in a [Jar] shared with the HTTP client, so that
    /// cookies the server sets are visible here and cookies written here go
    /// out with the next request.
    #[derive(Clone)]
    pub struct CookieJarBackend {
        jar: Arc<Jar>,
        origin: Url,
    }

    impl CookieJarBackend {
        /// Expose the cookies `jar` holds for `origin`
        pub fn new(jar: Arc<Jar>, origin: Url) -> Self {
            Self { jar, origin }
        }

        /// The underlying jar, to hand to `reqwest::ClientBuilder::cookie_provider`
        pub fn jar(&self) -> Arc<Jar> {
            self.jar.clone()
        }
    }

    #[async_trait]
    impl StorageBackend for CookieJarBackend {
        async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            let Some(header) = self.jar.cookies(&self.origin) else {
                return Ok(None);
            };
            let header = header
                .to_str()
                .map_err(|error| StorageError::Backend(format!("{error}")))?;
            Ok(find_cookie(header, key))
        }

        async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
            let secure = if self.origin.scheme() == "https" {
                "; Secure"
            } else {
                ""
            };
            let cookie = format!(
                "{}={}; Path=/; SameSite=Strict{secure}",
                urlencoding::encode(key),
                urlencoding::encode(&value)
            );
            self.jar.add_cookie_str(&cookie, &self.origin);
            Ok(())
        }
    }
}

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
mod document {
    use async_trait::async_trait;
    use wasm_bindgen::JsCast;
    use web_sys::HtmlDocument;

    use super::find_cookie;
    use crate::{StorageBackend, StorageError};

    /// `document.cookie` of the current page. HTTP-only cookies are invisible
    /// here, which is exactly what the double-submit pattern relies on.
    #[derive(Clone)]
    pub struct DocumentCookieBackend {
        document: HtmlDocument,
    }

    impl DocumentCookieBackend {
        /// Open the cookies of the current window's document
        pub fn open() -> Result<Self, StorageError> {
            let document = web_sys::window()
                .and_then(|window| window.document())
                .ok_or_else(|| StorageError::Unavailable("no document".into()))?
                .dyn_into::<HtmlDocument>()
                .map_err(|_| StorageError::Unavailable("not an HTML document".into()))?;
            Ok(Self { document })
        }
    }

    #[async_trait(?Send)]
    impl StorageBackend for DocumentCookieBackend {
        async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            let cookies = self
                .document
                .cookie()
                .map_err(|error| StorageError::Backend(format!("{error:?}")))?;
            Ok(find_cookie(&cookies, key))
        }

        async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
            let cookie = format!(
                "{}={};Secure;SameSite=Strict",
                urlencoding::encode(key),
                urlencoding::encode(&value)
            );
            self.document
                .set_cookie(&cookie)
                .map_err(|error| StorageError::Backend(format!("{error:?}")))
        }
    }
}
