use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use keyhole_capability::TokenSlot;
use keyhole_client::{DEFAULT_ENDPOINT, LoginMethod};
use keyhole_session::{AntiForgeryTransport, SessionStrategy};

#[derive(Debug, Parser)]
#[command(name = "keyhole")]
#[command(bin_name = "keyhole")]
#[command(about = "Talk to a session-protected API and resolve capability URLs", long_about = None)]
pub struct KeyholeCli {
    /// Base URL of the API
    #[arg(long, env = "KEYHOLE_ENDPOINT", default_value = DEFAULT_ENDPOINT, global = true)]
    pub endpoint: String,

    /// Where the session lives: cookie, session-bearer or durable-bearer.
    /// Only durable-bearer survives between invocations.
    #[arg(long, env = "KEYHOLE_STRATEGY", default_value = "durable-bearer", global = true)]
    pub strategy: SessionStrategy,

    /// How credentials are sent on login: basic or json-body
    #[arg(long, env = "KEYHOLE_LOGIN_METHOD", default_value = "basic", global = true)]
    pub login_method: LoginMethod,

    /// How the anti-forgery token is delivered in cookie mode
    #[arg(long, value_enum, env = "KEYHOLE_ANTI_FORGERY", default_value_t = AntiForgery::Cookie, global = true)]
    pub anti_forgery: AntiForgery,

    /// Where capability URLs carry their token: fragment or userinfo
    #[arg(long, env = "KEYHOLE_TOKEN_SLOT", default_value = "fragment", global = true)]
    pub slot: TokenSlot,

    /// Keep traversing a capability list past elements that fail
    #[arg(long, global = true)]
    pub continue_on_error: bool,

    /// Directory durable tokens are kept in (default: <data dir>/keyhole)
    #[arg(long, env = "KEYHOLE_STORAGE_DIR", global = true)]
    pub storage_dir: Option<PathBuf>,

    /// Username; with --password, protected commands log in first
    #[arg(short, long, env = "KEYHOLE_USERNAME", global = true)]
    pub username: Option<String>,

    /// Password
    #[arg(short, long, env = "KEYHOLE_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register a new user
    Register,

    /// Log in and keep the session
    Login,

    /// Send an authenticated request and print the JSON response
    Request {
        /// HTTP method, e.g. GET
        method: String,
        /// Path relative to the endpoint, e.g. /spaces/1/messages
        path: String,
        /// JSON request body
        #[arg(long)]
        body: Option<String>,
    },

    /// Create a space
    CreateSpace {
        /// Name of the space
        name: String,
        /// Owner (default: --username)
        #[arg(long)]
        owner: Option<String>,
    },

    /// Post a message to a space
    PostMessage {
        /// Space URI, e.g. /spaces/1
        space: String,
        /// Message text
        message: String,
        /// Author (default: --username)
        #[arg(long)]
        author: Option<String>,
    },

    /// List the message URIs of a space
    Messages {
        /// Space URI, e.g. /spaces/1
        space: String,
    },

    /// Derive a capability URI for another user
    Share {
        /// Capability URI to share
        uri: String,
        /// User to share with
        #[arg(long)]
        user: String,
        /// Permissions, e.g. r
        #[arg(long)]
        perms: Option<String>,
    },

    /// Resolve a capability URL and print its JSON
    Resolve {
        /// Capability URL with the token in the configured slot
        url: String,
    },

    /// Resolve a list capability and print each element in order
    Traverse {
        /// Capability URL of the list
        url: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AntiForgery {
    /// The server sets a readable cookie
    Cookie,
    /// The server returns the token in the login body
    ResponseBody,
}

impl From<AntiForgery> for AntiForgeryTransport {
    fn from(value: AntiForgery) -> Self {
        match value {
            AntiForgery::Cookie => AntiForgeryTransport::Cookie,
            AntiForgery::ResponseBody => AntiForgeryTransport::ResponseBody,
        }
    }
}
