//! Short goose runs against an in-process stand-in for Smart Split and its auth service.

use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use goose::config::GooseConfiguration;
use goose::metrics::GooseMetrics;
use goose::prelude::*;
use gumdrop::Options;
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

use smartsplit_loadtest::accounts::test_accounts;
use smartsplit_loadtest::auth::SupabaseAuth;
use smartsplit_loadtest::users::{self, Context, Profile};

const TOKEN_BODY: &str = r#"{"access_token":"test-token","token_type":"bearer","user":{"id":"user-1"}}"#;

const COOKIE_PATHS: &[&str] = &[
    "/dashboard",
    "/groups",
    "/expenses",
    "/activity",
    "/settings/profile",
    "/feedback/history",
];

fn init_tracing() {
    tracing_subscriber::fmt::fmt()
        .with_env_filter(EnvFilter::new("ERROR,smartsplit_loadtest=TRACE"))
        .with_target(true)
        .with_test_writer()
        .compact()
        .try_init()
        .ok();
}

#[derive(Clone, Debug)]
struct Seen {
    method: String,
    path: String,
    authorization: Option<String>,
    cookie: Option<String>,
}

impl Seen {
    fn is_login(&self) -> bool {
        self.path.starts_with("/auth/")
    }

    fn carries_credentials(&self) -> bool {
        self.authorization.is_some()
            || self
                .cookie
                .as_deref()
                .is_some_and(|cookie| cookie.contains("auth-token"))
    }
}

#[derive(Clone)]
struct ServerState {
    seen: Arc<Mutex<Vec<Seen>>>,
    login_status: StatusCode,
    redirect_to_login: bool,
}

/// Records every request. Serves the password grant and answers everything else with a sitemap.
///
/// With `redirect_to_login`, every page except `/login` redirects there instead, the way the
/// application treats a session it does not accept.
struct RecordingServer {
    handle: tokio::task::JoinHandle<()>,
    socket: SocketAddr,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl RecordingServer {
    fn new(login_status: StatusCode) -> Self {
        Self::with_state(ServerState {
            seen: Default::default(),
            login_status,
            redirect_to_login: false,
        })
    }

    fn redirecting_to_login() -> Self {
        Self::with_state(ServerState {
            seen: Default::default(),
            login_status: StatusCode::OK,
            redirect_to_login: true,
        })
    }

    fn with_state(state: ServerState) -> Self {

        async fn record(State(state): State<ServerState>, request: Request) -> Response {
            let header = |name: &str| {
                request
                    .headers()
                    .get(name)
                    .and_then(|value| value.to_str().ok())
                    .map(ToOwned::to_owned)
            };
            let seen = Seen {
                method: request.method().to_string(),
                path: request.uri().path().to_owned(),
                authorization: header("authorization"),
                cookie: header("cookie"),
            };
            state.seen.lock().unwrap().push(seen);

            let path = request.uri().path();
            if path == "/auth/v1/token" {
                return (state.login_status, TOKEN_BODY).into_response();
            }
            if state.redirect_to_login && path != "/login" {
                return Redirect::temporary("/login").into_response();
            }
            "<urlset></urlset>".into_response()
        }

        let seen = Arc::clone(&state.seen);
        let router = Router::new()
            .fallback(record)
            .with_state(state);

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).unwrap();
        listener.set_nonblocking(true).unwrap();
        let socket = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            handle,
            socket,
            seen,
        }
    }

    fn url(&self) -> String {
        format!("http://127.0.0.1:{}", self.socket.port())
    }

    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

impl Drop for RecordingServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Shortens the think time so that a two second run issues plenty of requests.
fn fast(profile: Profile) -> Profile {
    Profile {
        wait: (Duration::from_millis(10), Duration::from_millis(50)),
        ..profile
    }
}

async fn run(server: &RecordingServer, profiles: &[Profile]) -> GooseMetrics {
    let context = Arc::new(Context {
        auth: SupabaseAuth::new(&server.url(), Duration::from_secs(2))
            .unwrap()
            .with_anon_key("anon"),
        accounts: test_accounts("pw"),
        slow_request_threshold: Duration::from_secs(2),
    });

    let user_count: usize = profiles.iter().map(|profile| profile.weight).sum();
    let user_count = user_count.to_string();
    let url = server.url();
    let configuration = GooseConfiguration::parse_args_default(&[
        "--host",
        url.as_str(),
        "--users",
        user_count.as_str(),
        "--hatch-rate",
        user_count.as_str(),
        "--run-time",
        "2",
        "--no-telnet",
        "--no-websocket",
    ])
    .unwrap();

    let attack = GooseAttack::initialize_with_config(configuration).unwrap();
    let attack = users::register_profiles(attack, profiles, &context).unwrap();
    attack.execute().await.unwrap()
}

/// Decodes a `base64-` prefixed session cookie value into its JSON.
fn decode_session(value: &str) -> Value {
    let encoded = value.strip_prefix("base64-").unwrap();
    serde_json::from_slice(&URL_SAFE_NO_PAD.decode(encoded).unwrap()).unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn anonymous_profiles_send_no_credentials() {
    init_tracing();
    let server = RecordingServer::new(StatusCode::OK);

    let profiles = [
        fast(users::PUBLIC_USER),
        fast(users::SEO_CRAWLER),
        fast(users::API_TESTER),
        fast(users::STATIC_ASSET_LOADER),
        fast(users::AGGRESSIVE_LOAD_TESTER),
    ];
    run(&server, &profiles).await;

    let seen = server.seen();
    assert!(!seen.is_empty());
    assert!(!seen.iter().any(Seen::is_login));
    for request in &seen {
        assert!(!request.carries_credentials(), "{request:?}");
    }
    assert!(
        seen.iter()
            .any(|request| request.method == "POST" && request.path == "/api/feedback")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn authenticated_profiles_send_session() {
    init_tracing();
    let server = RecordingServer::new(StatusCode::OK);

    let profiles = [
        fast(users::AUTHENTICATED_USER),
        fast(users::AUTHENTICATED_API_USER),
    ];
    run(&server, &profiles).await;

    let seen = server.seen();
    assert!(seen.iter().any(Seen::is_login));

    let requests: Vec<_> = seen.iter().filter(|request| !request.is_login()).collect();
    assert!(!requests.is_empty());
    for request in requests {
        if COOKIE_PATHS.contains(&request.path.as_str()) {
            let cookie = request.cookie.as_deref().unwrap();
            let value = cookie.strip_prefix("sb-127-auth-token=").unwrap();
            assert_eq!(
                decode_session(value),
                json!({
                    "access_token": "test-token",
                    "token_type": "bearer",
                    "user": {"id": "user-1"},
                })
            );
            assert_eq!(request.authorization, None, "{request:?}");
        } else {
            assert_eq!(
                request.authorization.as_deref(),
                Some("Bearer test-token"),
                "{request:?}"
            );
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_login_skips_authenticated_tasks() {
    init_tracing();
    let server = RecordingServer::new(StatusCode::BAD_REQUEST);

    let profiles = [
        fast(users::AUTHENTICATED_USER),
        fast(users::AUTHENTICATED_API_USER),
    ];
    run(&server, &profiles).await;

    let seen = server.seen();
    assert!(seen.iter().any(Seen::is_login));
    assert!(seen.iter().all(Seen::is_login), "{seen:?}");
}

#[tokio::test(flavor = "multi_thread")]
async fn redirect_to_login_fails_authenticated_pages() {
    init_tracing();
    let server = RecordingServer::redirecting_to_login();

    let metrics = run(&server, &[fast(users::AUTHENTICATED_USER)]).await;

    assert!(!metrics.requests.is_empty());
    for (name, aggregate) in &metrics.requests {
        assert_eq!(aggregate.success_count, 0, "{name}");
        assert!(aggregate.fail_count > 0, "{name}");
    }
    assert!(server.seen().iter().any(|request| request.path == "/login"));
}
