//! The `keyhole` command: log in, call protected endpoints and resolve
//! capability URLs from a terminal.
//!
//! Values are printed to the given writer as one compact JSON document per
//! line.

use std::{io::Write, path::PathBuf, sync::Arc};

use anyhow::{Context, Result, anyhow, bail};
use keyhole_capability::{CapabilityResolver, ResolverConfig, TraversalPolicy};
use keyhole_client::{AuthenticatedClient, ClientConfig, ClientError, RecordingNavigator};
use keyhole_credentials::Credentials;
use keyhole_session::SessionConfig;
use reqwest::Method;
use serde_json::Value;

pub mod cli;

use cli::{Command, KeyholeCli};

/// Run one command, writing its output to `out`
pub async fn run<W: Write>(cli: KeyholeCli, out: &mut W) -> Result<()> {
    match &cli.command {
        Command::Resolve { url } => {
            let value = resolver(&cli).fetch(url).await?;
            print(out, &value)
        }
        Command::Traverse { url } => {
            let mut failed_write = None;
            let report = resolver(&cli)
                .traverse(url, |_, value| {
                    if let Err(error) = print(out, &value) {
                        failed_write.get_or_insert(error);
                    }
                })
                .await?;
            if let Some(error) = failed_write {
                return Err(error);
            }
            for failure in &report.failures {
                tracing::warn!(index = failure.index, error = %failure.error, "Element skipped");
            }
            Ok(())
        }
        command => {
            let navigator = Arc::new(RecordingNavigator::default());
            let client = client(&cli, navigator.clone()).await?;
            run_client(&cli, command, &client)
                .await
                .map_err(|error| match error.downcast_ref::<ClientError>() {
                    Some(ClientError::AuthRequired) => anyhow!(
                        "Authentication required (redirected to {}); run `keyhole login` or pass --username and --password",
                        navigator.last().unwrap_or_default()
                    ),
                    _ => error,
                })
                .and_then(|value| match value {
                    Some(value) => print(out, &value),
                    None => Ok(()),
                })
        }
    }
}

async fn run_client(
    cli: &KeyholeCli,
    command: &Command,
    client: &AuthenticatedClient,
) -> Result<Option<Value>> {
    let credentials = credentials(cli);

    match command {
        Command::Register => {
            let credentials = credentials.context("register needs --username and --password")?;
            return Ok(Some(client.register(&credentials).await?));
        }
        Command::Login => {
            let credentials = credentials.context("login needs --username and --password")?;
            client.login(&credentials).await?;
            tracing::info!(strategy = %cli.strategy, "Session established");
            return Ok(None);
        }
        _ => {}
    }

    if let Some(credentials) = &credentials {
        client.login(credentials).await?;
    }

    let value = match command {
        Command::Request { method, path, body } => {
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("'{method}' is not an HTTP method"))?;
            let body = body
                .as_deref()
                .map(serde_json::from_str::<Value>)
                .transpose()
                .context("--body is not valid JSON")?;
            client.request(method, path, body.as_ref()).await?
        }
        Command::CreateSpace { name, owner } => {
            let owner = owner
                .as_deref()
                .or(cli.username.as_deref())
                .context("create-space needs --owner or --username")?;
            serde_json::to_value(client.create_space(name, owner).await?)?
        }
        Command::PostMessage {
            space,
            message,
            author,
        } => {
            let author = author
                .as_deref()
                .or(cli.username.as_deref())
                .context("post-message needs --author or --username")?;
            client.post_message(space, author, message).await?
        }
        Command::Messages { space } => serde_json::to_value(client.find_messages(space).await?)?,
        Command::Share { uri, user, perms } => {
            Value::String(client.share(uri, user, perms.as_deref()).await?)
        }
        Command::Register | Command::Login | Command::Resolve { .. } | Command::Traverse { .. } => {
            bail!("not a client command")
        }
    };

    Ok(Some(value))
}

async fn client(cli: &KeyholeCli, navigator: Arc<RecordingNavigator>) -> Result<AuthenticatedClient> {
    let config = ClientConfig::new(&cli.endpoint).with_login_method(cli.login_method);
    let session = SessionConfig::new(cli.strategy).with_anti_forgery_transport(cli.anti_forgery.into());

    Ok(AuthenticatedClient::open(config, &session, storage_dir(cli)?, navigator).await?)
}

fn resolver(cli: &KeyholeCli) -> CapabilityResolver {
    let policy = if cli.continue_on_error {
        TraversalPolicy::Continue
    } else {
        TraversalPolicy::Abort
    };
    CapabilityResolver::new(
        ResolverConfig::default()
            .with_slot(cli.slot)
            .with_policy(policy),
    )
}

fn credentials(cli: &KeyholeCli) -> Option<Credentials> {
    match (&cli.username, &cli.password) {
        (Some(username), Some(password)) => Some(Credentials::new(username, password)),
        _ => None,
    }
}

fn storage_dir(cli: &KeyholeCli) -> Result<PathBuf> {
    cli.storage_dir
        .clone()
        .or_else(|| dirs::data_dir().map(|dir| dir.join("keyhole")))
        .context("No data directory on this system; pass --storage-dir")
}

fn print<W: Write>(out: &mut W, value: &Value) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string(value)?)?;
    Ok(())
}
