use keyhole_credentials::Credentials;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{AuthenticatedClient, ClientError};

/// A social space, as returned on creation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    /// Display name
    pub name: String,
    /// Path of the space, e.g. `/spaces/1`
    pub uri: String,
}

impl AuthenticatedClient {
    /// Register a new user (`POST /users`)
    pub async fn register(&self, credentials: &Credentials) -> Result<Value, ClientError> {
        let body = serde_json::to_value(credentials)
            .map_err(|error| ClientError::InvalidBody(error.to_string()))?;
        self.request(Method::POST, "/users", Some(&body)).await
    }

    /// Create a space owned by `owner` (`POST /spaces`)
    pub async fn create_space(&self, name: &str, owner: &str) -> Result<Space, ClientError> {
        let body = json!({ "name": name, "owner": owner });
        let response = self.request(Method::POST, "/spaces", Some(&body)).await?;
        serde_json::from_value(response).map_err(|error| ClientError::InvalidBody(error.to_string()))
    }

    /// Post a message to the space at `space_uri`
    pub async fn post_message(
        &self,
        space_uri: &str,
        author: &str,
        message: &str,
    ) -> Result<Value, ClientError> {
        let body = json!({ "author": author, "message": message });
        self.request(
            Method::POST,
            &format!("{space_uri}/messages"),
            Some(&body),
        )
        .await
    }

    /// The URIs of the messages in the space at `space_uri`
    pub async fn find_messages(&self, space_uri: &str) -> Result<Vec<String>, ClientError> {
        let response = self
            .request(Method::GET, &format!("{space_uri}/messages"), None)
            .await?;
        serde_json::from_value(response).map_err(|error| ClientError::InvalidBody(error.to_string()))
    }

    /// Derive a capability URI for `user` from the capability `uri`,
    /// optionally narrowed to `perms` (e.g. `"r"`)
    pub async fn share(
        &self,
        uri: &str,
        user: &str,
        perms: Option<&str>,
    ) -> Result<String, ClientError> {
        let mut body = json!({ "uri": uri, "user": user });
        if let Some(perms) = perms {
            body["perms"] = Value::from(perms);
        }

        let response = self.request(Method::POST, "/share", Some(&body)).await?;
        response
            .get("uri")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ClientError::InvalidBody("share response is missing 'uri'".into()))
    }
}
