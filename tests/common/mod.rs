#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use dashboard_portal::{AppConfig, AppState, auth::SessionClaims, create_router};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, SystemTime},
};
use tokio::net::TcpListener;

pub const TEST_SESSION_SECRET: &str = "super-secure-test-secret-value-local";

/// How long `/slow` waits before answering.
pub const SLOW_DELAY: Duration = Duration::from_millis(300);

// --- Stub upstream API ---

#[derive(Clone, Default)]
struct UpstreamState {
    hits: Arc<AtomicUsize>,
    flaky_calls: Arc<AtomicUsize>,
}

/// A local stand-in for the remote posts/users API.
pub struct Upstream {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
}

impl Upstream {
    /// Requests served so far, across all routes.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn count_hits(State(state): State<UpstreamState>, request: Request, next: Next) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    next.run(request).await
}

fn post_json(id: u32, user_id: u32) -> serde_json::Value {
    json!({
        "userId": user_id,
        "id": id,
        "title": format!("post {id}"),
        "body": "lorem ipsum"
    })
}

fn user_json(id: u32) -> serde_json::Value {
    json!({
        "id": id,
        "name": "Leanne Graham",
        "username": "Bret",
        "email": "Sincere@april.biz",
        "address": {
            "street": "Kulas Light",
            "suite": "Apt. 556",
            "city": "Gwenborough",
            "zipcode": "92998-3874",
            "geo": { "lat": "-37.3159", "lng": "81.1496" }
        },
        "phone": "1-770-736-8031 x56442",
        "website": "hildegard.org",
        "company": {
            "name": "Romaguera-Crona",
            "catchPhrase": "Multi-layered client-server neural-net",
            "bs": "harness real-time e-markets"
        }
    })
}

async fn posts() -> Json<serde_json::Value> {
    Json(json!([post_json(1, 1), post_json(2, 99)]))
}

/// Post 1 belongs to user 1; post 2 belongs to a user the API does not know.
async fn post(Path(id): Path<u32>) -> Response {
    match id {
        1 => Json(post_json(1, 1)).into_response(),
        2 => Json(post_json(2, 99)).into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({}))).into_response(),
    }
}

async fn users() -> Json<serde_json::Value> {
    Json(json!([user_json(1)]))
}

async fn user(Path(id): Path<u32>) -> Response {
    match id {
        1 => Json(user_json(1)).into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({}))).into_response(),
    }
}

/// Fails with 503 on the first call, succeeds afterwards.
async fn flaky(State(state): State<UpstreamState>) -> Response {
    if state.flaky_calls.fetch_add(1, Ordering::SeqCst) == 0 {
        StatusCode::SERVICE_UNAVAILABLE.into_response()
    } else {
        Json(json!({ "source": "flaky" })).into_response()
    }
}

pub async fn spawn_upstream() -> Upstream {
    let state = UpstreamState::default();
    let hits = state.hits.clone();

    let router = Router::new()
        .route("/posts", get(posts))
        .route("/posts/{id}", get(post))
        .route("/users", get(users))
        .route("/users/{id}", get(user))
        .route("/fast", get(|| async { Json(json!({ "source": "fast" })) }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(SLOW_DELAY).await;
                Json(json!({ "source": "slow" }))
            }),
        )
        .route("/broken", get(|| async { "<html>not json</html>" }))
        .route("/flaky", get(flaky))
        .route(
            "/teapot",
            get(|| async { StatusCode::IM_A_TEAPOT.into_response() }),
        )
        .layer(middleware::from_fn_with_state(state.clone(), count_hits))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind upstream port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    Upstream {
        base_url: format!("http://127.0.0.1:{}", port),
        hits,
    }
}

/// A base URL on a port nothing listens on.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

// --- Dashboard under test ---

pub fn test_config(api_base_url: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.api_base_url = api_base_url.to_string();
    config.session_secret = TEST_SESSION_SECRET.to_string();
    config
}

pub fn test_state(api_base_url: &str) -> AppState {
    AppState::from_config(test_config(api_base_url)).unwrap()
}

pub fn test_app(api_base_url: &str) -> Router {
    create_router(test_state(api_base_url))
}

// --- Session tokens ---

pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

pub fn claims(exp_offset: i64) -> SessionClaims {
    let now = now_secs();
    SessionClaims {
        sub: "google-oauth2|1234".to_string(),
        exp: now.saturating_add_signed(exp_offset),
        iat: Some(now),
        name: Some("Ada Lovelace".to_string()),
        email: Some("ada@example.com".to_string()),
        picture: Some("https://example.com/ada.png".to_string()),
        provider: Some("google".to_string()),
    }
}

pub fn mint_token(claims: &SessionClaims, secret: &str) -> String {
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &key).unwrap()
}

pub fn session_cookie(token: &str) -> String {
    format!("next-auth.session-token={}", token)
}
