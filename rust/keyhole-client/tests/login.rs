#![cfg(not(target_arch = "wasm32"))]

use std::sync::Arc;

use anyhow::Result;
use keyhole_client::{
    AuthenticatedClient, ClientConfig, ClientError, LoginMethod, RecordingNavigator,
};
use keyhole_common::helpers::{ApiEmulator, SessionMode};
use keyhole_credentials::Credentials;
use keyhole_session::{BearerSessionStore, SessionConfig, SessionStrategy};
use keyhole_storage::{MemoryStorageBackend, StorageBackend};
use pretty_assertions::assert_eq;
use reqwest::StatusCode;

fn bearer_client(
    config: ClientConfig,
    storage: MemoryStorageBackend,
    navigator: Arc<RecordingNavigator>,
) -> Result<AuthenticatedClient> {
    Ok(AuthenticatedClient::new(
        config,
        Arc::new(BearerSessionStore::session_scoped(storage)),
        navigator,
    )?)
}

#[tokio::test]
async fn it_logs_in_with_a_basic_header() -> Result<()> {
    let emulator = ApiEmulator::start(SessionMode::Bearer).await?;
    emulator.add_user("alice", "s3cret");

    let storage = MemoryStorageBackend::default();
    let client = bearer_client(
        ClientConfig::new(emulator.endpoint()),
        storage.clone(),
        Arc::default(),
    )?;

    client.login(&Credentials::new("alice", "s3cret")).await?;

    let logins = emulator.requests_to("/sessions");
    assert_eq!(logins.len(), 1);
    assert_eq!(logins[0].method, "POST");
    assert_eq!(
        logins[0].header("authorization"),
        Some("Basic YWxpY2U6czNjcmV0")
    );
    assert_eq!(logins[0].header("content-type"), Some("application/json"));
    assert_eq!(storage.get("token").await?, Some("bearer-1".into()));
    Ok(())
}

#[tokio::test]
async fn it_logs_in_with_a_json_body() -> Result<()> {
    let emulator = ApiEmulator::start(SessionMode::Bearer).await?;
    emulator.add_user("alice", "s3cret");

    let storage = MemoryStorageBackend::default();
    let client = bearer_client(
        ClientConfig::new(emulator.endpoint()).with_login_method(LoginMethod::JsonBody),
        storage.clone(),
        Arc::default(),
    )?;

    client.login(&Credentials::new("alice", "s3cret")).await?;

    let logins = emulator.requests_to("/sessions");
    assert_eq!(logins[0].header("authorization"), None);
    assert!(storage.get("token").await?.is_some());
    Ok(())
}

#[tokio::test]
async fn it_keeps_the_stored_token_when_login_is_refused() -> Result<()> {
    let emulator = ApiEmulator::start(SessionMode::Bearer).await?;
    emulator.add_user("alice", "s3cret");
    emulator.reject_logins(403);

    let storage = MemoryStorageBackend::default();
    storage.set("token", "previous-token".into()).await?;
    let navigator = Arc::new(RecordingNavigator::default());
    let client = bearer_client(
        ClientConfig::new(emulator.endpoint()).with_home_path("/natter.html"),
        storage.clone(),
        navigator.clone(),
    )?;

    let result = client.login(&Credentials::new("alice", "s3cret")).await;

    assert!(matches!(
        result,
        Err(ClientError::Request { status, .. }) if status == StatusCode::FORBIDDEN
    ));
    assert_eq!(storage.get("token").await?, Some("previous-token".into()));
    assert!(navigator.redirects().is_empty());
    Ok(())
}

#[tokio::test]
async fn it_does_not_redirect_to_login_when_credentials_are_wrong() -> Result<()> {
    let emulator = ApiEmulator::start(SessionMode::Bearer).await?;
    emulator.add_user("alice", "s3cret");

    let storage = MemoryStorageBackend::default();
    let navigator = Arc::new(RecordingNavigator::default());
    let client = bearer_client(
        ClientConfig::new(emulator.endpoint()),
        storage.clone(),
        navigator.clone(),
    )?;

    let result = client.login(&Credentials::new("alice", "wrong")).await;

    assert!(matches!(
        result,
        Err(ClientError::Request { status, .. }) if status == StatusCode::UNAUTHORIZED
    ));
    assert_eq!(storage.get("token").await?, None);
    assert!(navigator.redirects().is_empty());
    Ok(())
}

#[tokio::test]
async fn it_navigates_home_after_login() -> Result<()> {
    let emulator = ApiEmulator::start(SessionMode::Bearer).await?;
    emulator.add_user("alice", "s3cret");

    let navigator = Arc::new(RecordingNavigator::default());
    let client = bearer_client(
        ClientConfig::new(emulator.endpoint()).with_home_path("/natter.html"),
        MemoryStorageBackend::default(),
        navigator.clone(),
    )?;

    client.login(&Credentials::new("alice", "s3cret")).await?;

    assert_eq!(navigator.redirects(), vec!["/natter.html"]);
    Ok(())
}

#[tokio::test]
async fn it_keeps_a_durable_session_across_clients() -> Result<()> {
    let emulator = ApiEmulator::start(SessionMode::Bearer).await?;
    emulator.add_user("alice", "s3cret");
    let storage_dir = tempfile::tempdir()?;
    let session = SessionConfig::new(SessionStrategy::DurableBearer);

    let first = AuthenticatedClient::open(
        ClientConfig::new(emulator.endpoint()),
        &session,
        storage_dir.path(),
        Arc::new(RecordingNavigator::default()),
    )
    .await?;
    first.login(&Credentials::new("alice", "s3cret")).await?;
    let space = first.create_space("general", "alice").await?;
    drop(first);

    let second = AuthenticatedClient::open(
        ClientConfig::new(emulator.endpoint()),
        &session,
        storage_dir.path(),
        Arc::new(RecordingNavigator::default()),
    )
    .await?;

    assert_eq!(second.find_messages(&space.uri).await?, Vec::<String>::new());
    assert_eq!(emulator.requests_to("/sessions").len(), 1);
    Ok(())
}

#[tokio::test]
async fn it_forgets_a_session_scoped_token_with_the_client() -> Result<()> {
    let emulator = ApiEmulator::start(SessionMode::Bearer).await?;
    emulator.add_user("alice", "s3cret");
    let storage_dir = tempfile::tempdir()?;
    let session = SessionConfig::new(SessionStrategy::SessionBearer);

    let first = AuthenticatedClient::open(
        ClientConfig::new(emulator.endpoint()),
        &session,
        storage_dir.path(),
        Arc::new(RecordingNavigator::default()),
    )
    .await?;
    first.login(&Credentials::new("alice", "s3cret")).await?;
    let space = first.create_space("general", "alice").await?;

    let second = AuthenticatedClient::open(
        ClientConfig::new(emulator.endpoint()),
        &session,
        storage_dir.path(),
        Arc::new(RecordingNavigator::default()),
    )
    .await?;

    assert!(matches!(
        second.find_messages(&space.uri).await,
        Err(ClientError::AuthRequired)
    ));
    Ok(())
}
