use std::{
    fmt::{Debug, Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::CapabilityResolutionError;

/// Query parameter the server reads the token from
pub const ACCESS_TOKEN_PARAM: &str = "access_token";

/// The part of a capability URL that carries the token. Both slots are
/// kept out of server logs and `Referer` headers by the user agent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenSlot {
    /// `https://host/caps#<token>`
    #[default]
    Fragment,
    /// `https://<token>@host/caps`
    UserInfo,
}

impl Display for TokenSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenSlot::Fragment => f.write_str("fragment"),
            TokenSlot::UserInfo => f.write_str("userinfo"),
        }
    }
}

impl FromStr for TokenSlot {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "fragment" => Ok(TokenSlot::Fragment),
            "userinfo" | "user-info" => Ok(TokenSlot::UserInfo),
            other => Err(format!(
                "unknown token slot '{other}' (expected fragment or userinfo)"
            )),
        }
    }
}

/// A capability URL split into its secret-free base and its token.
///
/// The base has the token slot cleared and no query, so it is safe to log.
/// The [Debug] representation never includes the token.
#[derive(Clone, PartialEq, Eq)]
pub struct CapabilityUrl {
    base: Url,
    token: String,
}

impl CapabilityUrl {
    /// Pull the token out of `slot`. The token is percent-decoded; `+` is
    /// kept as is.
    pub fn extract(input: &str, slot: TokenSlot) -> Result<Self, CapabilityResolutionError> {
        let mut base = Url::parse(input)
            .map_err(|error| CapabilityResolutionError::InvalidUrl(error.to_string()))?;

        let raw = match slot {
            TokenSlot::Fragment => base.fragment().map(str::to_string),
            TokenSlot::UserInfo => {
                if base.username().is_empty() {
                    base.password().map(str::to_string)
                } else {
                    Some(base.username().to_string())
                }
            }
        }
        .filter(|raw| !raw.is_empty())
        .ok_or(CapabilityResolutionError::MissingToken(slot))?;

        let token = urlencoding::decode(&raw)
            .map_err(|error| CapabilityResolutionError::InvalidUrl(error.to_string()))?
            .into_owned();

        base.set_fragment(None);
        base.set_query(None);
        // Userinfo would otherwise be sent as a Basic Authorization header.
        if !base.username().is_empty() || base.password().is_some() {
            base.set_username("")
                .and_then(|_| base.set_password(None))
                .map_err(|_| {
                    CapabilityResolutionError::InvalidUrl("user info cannot be cleared".into())
                })?;
        }

        Ok(Self { base, token })
    }

    /// The secret-free location of the capability
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// The decoded token
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The URL the server expects: the base with the token as the only
    /// query parameter, form-urlencoded
    pub fn rewrite(&self) -> Url {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair(ACCESS_TOKEN_PARAM, &self.token);
        url
    }

    /// Put the token back into `slot`, producing a URL that can be handed
    /// to someone else
    pub fn embed(&self, slot: TokenSlot) -> Result<Url, CapabilityResolutionError> {
        let mut url = self.base.clone();
        let encoded = urlencoding::encode(&self.token);
        match slot {
            TokenSlot::Fragment => url.set_fragment(Some(encoded.as_ref())),
            TokenSlot::UserInfo => url.set_username(&encoded).map_err(|_| {
                CapabilityResolutionError::InvalidUrl("URL cannot carry user info".into())
            })?,
        }
        Ok(url)
    }
}

impl Debug for CapabilityUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityUrl")
            .field("base", &self.base.as_str())
            .field("token", &"<redacted>")
            .finish()
    }
}
