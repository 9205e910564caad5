#![cfg(not(target_arch = "wasm32"))]

use std::sync::Arc;

use anyhow::Result;
use keyhole_client::{AuthenticatedClient, ClientConfig, ClientError, RecordingNavigator};
use keyhole_common::helpers::{ApiEmulator, SessionMode};
use keyhole_credentials::Credentials;
use keyhole_session::{
    AntiForgeryTransport, Session, SessionConfig, SessionStore, SessionStrategy,
};
use pretty_assertions::assert_eq;
use reqwest::{Method, StatusCode};
use serde_json::json;

async fn open(
    emulator: &ApiEmulator,
    session: SessionConfig,
    navigator: Arc<RecordingNavigator>,
) -> Result<AuthenticatedClient> {
    let storage_dir = tempfile::tempdir()?;
    Ok(AuthenticatedClient::open(
        ClientConfig::new(emulator.endpoint()),
        &session,
        storage_dir.path(),
        navigator,
    )
    .await?)
}

#[tokio::test]
async fn it_redirects_to_login_and_delivers_nothing_on_401() -> Result<()> {
    let emulator = ApiEmulator::start(SessionMode::Bearer).await?;
    let navigator = Arc::new(RecordingNavigator::default());
    let client = open(
        &emulator,
        SessionConfig::new(SessionStrategy::SessionBearer),
        navigator.clone(),
    )
    .await?;

    let result = client
        .request(Method::POST, "/spaces", Some(&json!({ "name": "general" })))
        .await;

    assert!(matches!(result, Err(ClientError::AuthRequired)));
    assert_eq!(navigator.redirects(), vec!["/login.html"]);

    let sent = emulator.requests_to("/spaces");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].header("authorization"), None);
    Ok(())
}

#[tokio::test]
async fn it_attaches_the_bearer_token_to_protected_calls() -> Result<()> {
    let emulator = ApiEmulator::start(SessionMode::Bearer).await?;
    emulator.add_user("alice", "s3cret");
    let client = open(
        &emulator,
        SessionConfig::new(SessionStrategy::SessionBearer),
        Arc::default(),
    )
    .await?;

    client.login(&Credentials::new("alice", "s3cret")).await?;
    let space = client.create_space("general", "alice").await?;
    let posted = client.post_message(&space.uri, "alice", "hello").await?;
    let messages = client.find_messages(&space.uri).await?;

    assert_eq!(space.name, "general");
    assert_eq!(messages, vec![posted["uri"].as_str().unwrap_or_default()]);

    for request in emulator.requests_to("/spaces") {
        assert_eq!(request.header("authorization"), Some("Bearer bearer-1"));
    }
    assert!(matches!(
        client.session().current().await?,
        Some(Session::Bearer { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn it_never_sends_the_session_to_another_origin() -> Result<()> {
    let emulator = ApiEmulator::start(SessionMode::Bearer).await?;
    emulator.add_user("alice", "s3cret");
    let elsewhere = ApiEmulator::start(SessionMode::Bearer).await?;
    let client = open(
        &emulator,
        SessionConfig::new(SessionStrategy::SessionBearer),
        Arc::default(),
    )
    .await?;

    client.login(&Credentials::new("alice", "s3cret")).await?;

    let foreign = format!("{}/spaces/1/messages", elsewhere.endpoint());
    assert!(matches!(
        client.request(Method::GET, &foreign, None).await,
        Err(ClientError::InvalidUrl(_))
    ));
    assert!(matches!(
        client
            .find_messages(&format!("{}/spaces/7", elsewhere.endpoint()))
            .await,
        Err(ClientError::InvalidUrl(_))
    ));
    assert!(elsewhere.requests().is_empty());

    let own = format!("{}/spaces/1/messages", emulator.endpoint());
    let _ = client.request(Method::GET, &own, None).await;
    assert_eq!(
        emulator.requests_to("/spaces/1/messages")[0].header("authorization"),
        Some("Bearer bearer-1")
    );
    Ok(())
}

#[tokio::test]
async fn it_echoes_the_anti_forgery_cookie_in_cookie_mode() -> Result<()> {
    let emulator = ApiEmulator::start(SessionMode::Cookie {
        anti_forgery_cookie: true,
    })
    .await?;
    emulator.add_user("alice", "s3cret");
    let client = open(
        &emulator,
        SessionConfig::new(SessionStrategy::Cookie),
        Arc::default(),
    )
    .await?;

    client.login(&Credentials::new("alice", "s3cret")).await?;
    let space = client.create_space("general", "alice").await?;

    let sent = emulator.requests_to("/spaces");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].header("x-csrf-token"), Some("csrf-1"));
    assert_eq!(sent[0].header("authorization"), None);
    assert!(
        sent[0]
            .header("cookie")
            .is_some_and(|cookie| cookie.contains("JSESSIONID=session-1"))
    );
    assert_eq!(space.uri, "/spaces/2");
    Ok(())
}

#[tokio::test]
async fn it_stores_a_body_delivered_anti_forgery_token_as_a_cookie() -> Result<()> {
    let emulator = ApiEmulator::start(SessionMode::Cookie {
        anti_forgery_cookie: false,
    })
    .await?;
    emulator.add_user("alice", "s3cret");
    let session = SessionConfig::new(SessionStrategy::Cookie)
        .with_anti_forgery_transport(AntiForgeryTransport::ResponseBody);
    let client = open(&emulator, session, Arc::default()).await?;

    client.login(&Credentials::new("alice", "s3cret")).await?;
    client.create_space("general", "alice").await?;

    let sent = emulator.requests_to("/spaces");
    assert_eq!(sent[0].header("x-csrf-token"), Some("csrf-1"));
    assert_eq!(
        client.session().current().await?,
        Some(Session::Cookie {
            anti_forgery: "csrf-1".into()
        })
    );
    Ok(())
}

#[tokio::test]
async fn it_is_refused_without_the_anti_forgery_header() -> Result<()> {
    let emulator = ApiEmulator::start(SessionMode::Cookie {
        anti_forgery_cookie: false,
    })
    .await?;
    emulator.add_user("alice", "s3cret");
    let navigator = Arc::new(RecordingNavigator::default());
    let client = open(
        &emulator,
        SessionConfig::new(SessionStrategy::Cookie),
        navigator.clone(),
    )
    .await?;

    client.login(&Credentials::new("alice", "s3cret")).await?;
    let result = client.create_space("general", "alice").await;

    assert!(matches!(result, Err(ClientError::AuthRequired)));
    assert_eq!(emulator.requests_to("/spaces")[0].header("x-csrf-token"), None);
    assert_eq!(navigator.last().as_deref(), Some("/login.html"));
    Ok(())
}

#[tokio::test]
async fn it_reports_other_failures_with_their_status() -> Result<()> {
    let emulator = ApiEmulator::start(SessionMode::Bearer).await?;
    emulator.add_user("alice", "s3cret");
    let navigator = Arc::new(RecordingNavigator::default());
    let client = open(
        &emulator,
        SessionConfig::new(SessionStrategy::SessionBearer),
        navigator.clone(),
    )
    .await?;

    client.login(&Credentials::new("alice", "s3cret")).await?;
    let result = client.post_message("/spaces/999", "alice", "hello").await;

    match result {
        Err(ClientError::Request {
            status,
            status_text,
        }) => {
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(status_text, "Not Found");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(navigator.redirects().is_empty());
    Ok(())
}

#[tokio::test]
async fn it_registers_and_shares() -> Result<()> {
    let emulator = ApiEmulator::start(SessionMode::Bearer).await?;
    emulator.grant("/caps/inbox", "tok123", json!({ "ok": true }));
    let client = open(
        &emulator,
        SessionConfig::new(SessionStrategy::SessionBearer),
        Arc::default(),
    )
    .await?;

    let credentials = Credentials::new("alice", "s3cret");
    let registered = client.register(&credentials).await?;
    client.login(&credentials).await?;

    let capability = format!("{}/caps/inbox?access_token=tok123", emulator.endpoint());
    let shared = client.share(&capability, "bob", Some("r")).await?;

    assert_eq!(registered, json!({ "username": "alice" }));
    assert!(shared.starts_with(&format!(
        "{}/caps/inbox?access_token=shared-",
        emulator.endpoint()
    )));
    assert_eq!(emulator.requests_to("/share").len(), 1);
    Ok(())
}
