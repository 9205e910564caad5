#![warn(missing_docs)]

//! Capability URLs grant access by themselves: the secret token rides in
//! the URL's fragment (or user-info) so it never reaches server logs or
//! `Referer` headers. To use one, the token is moved into the
//! `access_token` query parameter and the resource is fetched with no
//! other credentials.
//!
//! - [CapabilityUrl] splits a URL into its secret-free base and its token.
//! - [CapabilityResolver::resolve] fetches one capability and reports the
//!   outcome through callbacks.
//! - [CapabilityResolver::traverse] resolves a list of capabilities, one at
//!   a time, in order.
//!
//! ```rust
//! use keyhole_capability::{CapabilityUrl, TokenSlot};
//!
//! let capability = CapabilityUrl::extract("https://host/caps#tok123", TokenSlot::Fragment)?;
//!
//! assert_eq!(capability.rewrite().as_str(), "https://host/caps?access_token=tok123");
//! # Ok::<(), keyhole_capability::CapabilityResolutionError>(())
//! ```

mod error;
pub use error::*;

mod capability;
pub use capability::*;

mod resolver;
pub use resolver::*;

mod traverse;
pub use traverse::*;
