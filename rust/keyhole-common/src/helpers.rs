//! An in-process emulator of the remote API, for integration tests.
//!
//! The emulator binds an axum server to an ephemeral port on `127.0.0.1` and
//! implements just enough of the API for the client crates to be exercised
//! end to end:
//!
//! - `POST /sessions` - login with a Basic header or a JSON body. Depending
//!   on the [SessionMode] it answers with session cookies (plus the
//!   anti-forgery token in the body) or with a bearer token.
//! - `POST /users` - registration.
//! - `POST /spaces`, `POST /spaces/{id}/messages`,
//!   `GET /spaces/{id}/messages` - protected domain calls.
//! - `POST /share` - mints a new token for an existing capability.
//! - `GET /caps/{name}` - capability endpoints, authorized only by the
//!   `access_token` query parameter.
//!
//! Every request is recorded so tests can assert on exactly what went over
//! the wire.
//!
//! ```no_run
//! use keyhole_common::helpers::{ApiEmulator, SessionMode};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let emulator = ApiEmulator::start(SessionMode::Bearer).await?;
//! emulator.add_user("alice", "s3cret");
//! emulator.grant("/caps/inbox", "tok123", serde_json::json!({ "ok": true }));
//!
//! let endpoint = emulator.endpoint();
//! # let _ = endpoint;
//! # Ok(())
//! # }
//! ```

use std::{collections::HashMap, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::Engine;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::{net::TcpListener, task::JoinHandle};
use url::Url;

/// Name of the HTTP-only cookie carrying the session identifier
pub const SESSION_COOKIE: &str = "JSESSIONID";
/// Name of the script-readable cookie carrying the anti-forgery token
pub const ANTI_FORGERY_COOKIE: &str = "csrfToken";
/// Header the anti-forgery token must be echoed in
pub const ANTI_FORGERY_HEADER: &str = "X-CSRF-Token";

/// How the emulator establishes sessions on `POST /sessions`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionMode {
    /// Session cookie plus a double-submit anti-forgery token. The token is
    /// always returned in the login body; `anti_forgery_cookie` controls
    /// whether it is also set as a readable cookie.
    Cookie {
        /// Also deliver the anti-forgery token as a readable cookie
        anti_forgery_cookie: bool,
    },
    /// An opaque bearer token in the login body
    Bearer,
}

/// A request as the emulator received it
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    /// HTTP method
    pub method: String,
    /// Request path, without query
    pub path: String,
    /// Raw (still percent-encoded) query string, if any
    pub query: Option<String>,
    /// All request headers, names lower-cased
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    /// The first value of the named header, if present
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Clone)]
struct Grant {
    tokens: Vec<String>,
    body: Value,
    delay: Duration,
}

struct Principal {
    username: String,
    anti_forgery: Option<String>,
}

#[derive(Default)]
struct EmulatorState {
    users: HashMap<String, String>,
    sessions: HashMap<String, Principal>,
    spaces: HashMap<u64, Vec<String>>,
    capabilities: HashMap<String, Grant>,
    requests: Vec<RecordedRequest>,
    login_status: Option<StatusCode>,
    next_id: u64,
}

impl EmulatorState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone)]
struct Emulator {
    mode: SessionMode,
    origin: Url,
    state: Arc<Mutex<EmulatorState>>,
}

impl Emulator {
    fn authenticate(&self, method: &Method, headers: &HeaderMap) -> Option<String> {
        let state = self.state.lock();
        match self.mode {
            SessionMode::Cookie { .. } => {
                let session_id = cookie(headers, SESSION_COOKIE)?;
                let principal = state.sessions.get(&session_id)?;
                let safe = *method == Method::GET
                    || *method == Method::HEAD
                    || *method == Method::OPTIONS;
                if !safe {
                    let provided = headers.get(ANTI_FORGERY_HEADER)?.to_str().ok()?;
                    if principal.anti_forgery.as_deref() != Some(provided) {
                        return None;
                    }
                }
                Some(principal.username.clone())
            }
            SessionMode::Bearer => {
                let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
                let token = value.strip_prefix("Bearer ")?;
                state
                    .sessions
                    .get(token)
                    .map(|principal| principal.username.clone())
            }
        }
    }
}

/// Handle to a running emulator. The server task is aborted on drop.
pub struct ApiEmulator {
    address: SocketAddr,
    emulator: Emulator,
    task: JoinHandle<()>,
}

impl ApiEmulator {
    /// Bind to an ephemeral port and start serving
    pub async fn start(mode: SessionMode) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;
        let emulator = Emulator {
            mode,
            origin: Url::parse(&format!("http://{address}"))?,
            state: Arc::default(),
        };

        let router = Router::new()
            .route("/sessions", post(login))
            .route("/users", post(register))
            .route("/spaces", post(create_space))
            .route(
                "/spaces/{id}/messages",
                post(post_message).get(find_messages),
            )
            .route("/share", post(share))
            .route("/caps/{name}", get(read_capability))
            .layer(middleware::from_fn_with_state(emulator.clone(), record))
            .with_state(emulator.clone());

        let task = tokio::spawn(async move {
            if let Err(error) = axum::serve(listener, router).await {
                tracing::error!(%error, "API emulator stopped");
            }
        });

        Ok(Self {
            address,
            emulator,
            task,
        })
    }

    /// Origin of the emulator, e.g. `http://127.0.0.1:41234`
    pub fn endpoint(&self) -> String {
        format!("http://{}", self.address)
    }

    /// Register a user that may log in
    pub fn add_user(&self, username: &str, password: &str) {
        self.emulator
            .state
            .lock()
            .users
            .insert(username.to_string(), password.to_string());
    }

    /// Answer every subsequent login with `status`, regardless of
    /// credentials
    pub fn reject_logins(&self, status: u16) {
        self.emulator.state.lock().login_status =
            Some(StatusCode::from_u16(status).unwrap_or(StatusCode::FORBIDDEN));
    }

    /// Serve `body` at `path` to holders of `token`
    pub fn grant(&self, path: &str, token: &str, body: Value) {
        self.grant_delayed(path, token, body, Duration::ZERO);
    }

    /// Like [ApiEmulator::grant], but every response is held back for
    /// `delay`
    pub fn grant_delayed(&self, path: &str, token: &str, body: Value, delay: Duration) {
        let mut state = self.emulator.state.lock();
        let grant = state
            .capabilities
            .entry(path.to_string())
            .or_insert_with(|| Grant {
                tokens: Vec::new(),
                body: Value::Null,
                delay,
            });
        grant.tokens.push(token.to_string());
        grant.body = body;
        grant.delay = delay;
    }

    /// Every request received so far, in arrival order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.emulator.state.lock().requests.clone()
    }

    /// Requests received for `path`, in arrival order
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.path == path)
            .collect()
    }
}

impl Drop for ApiEmulator {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn record(State(emulator): State<Emulator>, request: Request, next: Next) -> Response {
    let recorded = RecordedRequest {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        query: request.uri().query().map(str::to_string),
        headers: request
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect(),
    };
    emulator.state.lock().requests.push(recorded);
    next.run(request).await
}

async fn login(State(emulator): State<Emulator>, headers: HeaderMap, body: Bytes) -> Response {
    let mut state = emulator.state.lock();

    if let Some(status) = state.login_status {
        return error(status, "login rejected");
    }

    let Some((username, password)) =
        basic_credentials(&headers).or_else(|| json_credentials(&body))
    else {
        return error(StatusCode::UNAUTHORIZED, "missing credentials");
    };

    if state.users.get(&username) != Some(&password) {
        return error(StatusCode::UNAUTHORIZED, "invalid username or password");
    }

    let id = state.next_id();
    match emulator.mode {
        SessionMode::Cookie {
            anti_forgery_cookie,
        } => {
            let session_id = format!("session-{id}");
            let anti_forgery = format!("csrf-{id}");
            state.sessions.insert(
                session_id.clone(),
                Principal {
                    username,
                    anti_forgery: Some(anti_forgery.clone()),
                },
            );

            let mut response = Json(json!({ "token": anti_forgery })).into_response();
            append_cookie(
                response.headers_mut(),
                &format!("{SESSION_COOKIE}={session_id}; Path=/; HttpOnly"),
            );
            if anti_forgery_cookie {
                append_cookie(
                    response.headers_mut(),
                    &format!("{ANTI_FORGERY_COOKIE}={anti_forgery}; Path=/"),
                );
            }
            response
        }
        SessionMode::Bearer => {
            let token = format!("bearer-{id}");
            state.sessions.insert(
                token.clone(),
                Principal {
                    username,
                    anti_forgery: None,
                },
            );
            (StatusCode::CREATED, Json(json!({ "token": token }))).into_response()
        }
    }
}

async fn register(State(emulator): State<Emulator>, body: Bytes) -> Response {
    let Some((username, password)) = json_credentials(&body) else {
        return error(StatusCode::BAD_REQUEST, "username and password required");
    };
    emulator
        .state
        .lock()
        .users
        .insert(username.clone(), password);
    (
        StatusCode::CREATED,
        Json(json!({ "username": username })),
    )
        .into_response()
}

async fn create_space(
    State(emulator): State<Emulator>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if emulator.authenticate(&Method::POST, &headers).is_none() {
        return error(StatusCode::UNAUTHORIZED, "authentication required");
    }
    let Some(name) = body.get("name").and_then(Value::as_str) else {
        return error(StatusCode::BAD_REQUEST, "name required");
    };

    let mut state = emulator.state.lock();
    let id = state.next_id();
    state.spaces.insert(id, Vec::new());

    let uri = format!("/spaces/{id}");
    let mut response = (
        StatusCode::CREATED,
        Json(json!({ "name": name, "uri": uri })),
    )
        .into_response();
    if let Ok(location) = HeaderValue::from_str(&uri) {
        response.headers_mut().insert(header::LOCATION, location);
    }
    response
}

async fn post_message(
    State(emulator): State<Emulator>,
    Path(space): Path<u64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if emulator.authenticate(&Method::POST, &headers).is_none() {
        return error(StatusCode::UNAUTHORIZED, "authentication required");
    }
    if body.get("message").and_then(Value::as_str).is_none() {
        return error(StatusCode::BAD_REQUEST, "message required");
    }

    let mut state = emulator.state.lock();
    let id = state.next_id();
    let Some(messages) = state.spaces.get_mut(&space) else {
        return error(StatusCode::NOT_FOUND, "not found");
    };
    let uri = format!("/spaces/{space}/messages/{id}");
    messages.push(uri.clone());

    (StatusCode::CREATED, Json(json!({ "uri": uri }))).into_response()
}

async fn find_messages(
    State(emulator): State<Emulator>,
    Path(space): Path<u64>,
    headers: HeaderMap,
) -> Response {
    if emulator.authenticate(&Method::GET, &headers).is_none() {
        return error(StatusCode::UNAUTHORIZED, "authentication required");
    }
    match emulator.state.lock().spaces.get(&space) {
        Some(messages) => Json(json!(messages)).into_response(),
        None => error(StatusCode::NOT_FOUND, "not found"),
    }
}

async fn share(
    State(emulator): State<Emulator>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if emulator.authenticate(&Method::POST, &headers).is_none() {
        return error(StatusCode::UNAUTHORIZED, "authentication required");
    }
    let (Some(uri), Some(_user)) = (
        body.get("uri").and_then(Value::as_str),
        body.get("user").and_then(Value::as_str),
    ) else {
        return error(StatusCode::BAD_REQUEST, "uri and user required");
    };

    let Some((path, token)) = split_capability(&emulator.origin, uri) else {
        return error(StatusCode::BAD_REQUEST, "invalid uri");
    };
    let mut state = emulator.state.lock();
    let id = state.next_id();
    let Some(grant) = state.capabilities.get_mut(&path) else {
        return error(StatusCode::NOT_FOUND, "not found");
    };
    if !token.is_some_and(|token| grant.tokens.contains(&token)) {
        return error(StatusCode::FORBIDDEN, "invalid capability");
    }

    let shared = format!("shared-{id}");
    grant.tokens.push(shared.clone());

    let mut uri = emulator.origin.clone();
    uri.set_path(&path);
    uri.query_pairs_mut().append_pair("access_token", &shared);
    Json(json!({ "uri": uri.as_str() })).into_response()
}

async fn read_capability(
    State(emulator): State<Emulator>,
    Path(name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let path = format!("/caps/{name}");
    let grant = emulator.state.lock().capabilities.get(&path).cloned();

    let Some(grant) = grant else {
        return error(StatusCode::NOT_FOUND, "not found");
    };
    let Some(token) = params.get("access_token") else {
        return error(StatusCode::UNAUTHORIZED, "missing access_token");
    };
    if !grant.tokens.contains(token) {
        return error(StatusCode::UNAUTHORIZED, "invalid access_token");
    }

    if !grant.delay.is_zero() {
        tokio::time::sleep(grant.delay).await;
    }

    Json(grant.body).into_response()
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn append_cookie(headers: &mut HeaderMap, cookie: &str) {
    if let Ok(value) = HeaderValue::from_str(cookie) {
        headers.append(header::SET_COOKIE, value);
    }
}

fn cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

fn json_credentials(body: &[u8]) -> Option<(String, String)> {
    let body: Value = serde_json::from_slice(body).ok()?;
    let username = body.get("username")?.as_str()?;
    let password = body.get("password")?.as_str()?;
    Some((username.to_string(), password.to_string()))
}

/// Resolve `uri` against `origin` and split it into its path and
/// `access_token` query parameter
fn split_capability(origin: &Url, uri: &str) -> Option<(String, Option<String>)> {
    let url = origin.join(uri).ok()?;
    let token = url
        .query_pairs()
        .find(|(key, _)| key == "access_token")
        .map(|(_, value)| value.into_owned());
    Some((url.path().to_string(), token))
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::split_capability;

    #[test]
    fn it_splits_a_canonical_capability_uri() -> anyhow::Result<()> {
        let origin = Url::parse("http://127.0.0.1:4567")?;

        assert_eq!(
            split_capability(&origin, "http://127.0.0.1:4567/caps/inbox?access_token=a%2Fb"),
            Some(("/caps/inbox".to_string(), Some("a/b".to_string())))
        );
        assert_eq!(
            split_capability(&origin, "/caps/inbox"),
            Some(("/caps/inbox".to_string(), None))
        );
        Ok(())
    }
}
