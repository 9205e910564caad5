use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{CapabilityResolutionError, CapabilityUrl, TokenSlot, TraversalPolicy};

/// Configuration for a [CapabilityResolver]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Where capability URLs carry their token
    pub slot: TokenSlot,

    /// What a list traversal does when one element fails
    pub policy: TraversalPolicy,
}

impl ResolverConfig {
    /// Read tokens from `slot`
    pub fn with_slot(mut self, slot: TokenSlot) -> Self {
        self.slot = slot;
        self
    }

    /// Handle element failures during traversal according to `policy`
    pub fn with_policy(mut self, policy: TraversalPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Resolves capability URLs.
///
/// A capability URL is its own authority: the resolver never consults a
/// session store, keeps no cookies and sends no `Authorization` header. The
/// token travels only as the `access_token` query parameter.
///
/// ```no_run
/// use keyhole_capability::{CapabilityResolver, ResolverConfig};
///
/// # async fn example() {
/// let resolver = CapabilityResolver::new(ResolverConfig::default());
///
/// resolver
///     .resolve(
///         "https://localhost:4567/spaces/1/messages/2#QdvK9Mn2",
///         |message| println!("{message}"),
///         |error| eprintln!("{error}"),
///     )
///     .await;
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct CapabilityResolver {
    config: ResolverConfig,
    http: Client,
}

impl CapabilityResolver {
    /// Create a resolver with a default HTTP transport
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    /// Use `http` as the transport. It must not carry a cookie store.
    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    /// The configuration this resolver was built with
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `url` and return the parsed JSON body
    pub async fn fetch(&self, url: &str) -> Result<Value, CapabilityResolutionError> {
        let capability = CapabilityUrl::extract(url, self.config.slot)?;
        tracing::debug!(url = %capability.base(), "Resolving capability");

        let builder = self.http.get(capability.rewrite());

        #[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
        let builder = builder.fetch_credentials_omit();

        let response = builder
            .send()
            .await
            .map_err(|error| CapabilityResolutionError::Network(error.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CapabilityResolutionError::Status(status));
        }

        let body = response
            .bytes()
            .await
            .map_err(|error| CapabilityResolutionError::Network(error.without_url().to_string()))?;
        serde_json::from_slice(&body)
            .map_err(|error| CapabilityResolutionError::InvalidBody(error.to_string()))
    }

    /// Resolve `url`, handing the parsed body to `on_value` or the failure
    /// to `on_error`. Exactly one of the two is called; nothing is
    /// propagated.
    pub async fn resolve<V, E>(&self, url: &str, on_value: V, on_error: E)
    where
        V: FnOnce(Value),
        E: FnOnce(CapabilityResolutionError),
    {
        match self.fetch(url).await {
            Ok(value) => on_value(value),
            Err(error) => {
                tracing::warn!(%error, "Capability resolution failed");
                on_error(error)
            }
        }
    }
}
