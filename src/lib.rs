use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod api;
pub mod auth;
pub mod config;
pub mod fetch;
pub mod guard;
pub mod handlers;
pub mod models;
pub mod nav;

// Pages grouped by access requirement (public, protected).
pub mod routes;
use routes::{protected, public};

// --- Public Re-exports ---

pub use api::PlaceholderApi;
pub use auth::{JwtSessionLookup, SessionLookup, SessionState};
pub use config::AppConfig;
pub use fetch::{FetchController, FetchError, FetchState, Phase};
pub use guard::{RouteDecision, RouteGuard};

/// ApiDoc
///
/// OpenAPI document for the dashboard pages, served at
/// `/api-docs/openapi.json` and browsable under `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_home, handlers::get_navigation, handlers::get_posts,
        handlers::get_post_detail,
        handlers::get_users, handlers::get_user_detail, handlers::get_profile,
        handlers::get_sign_in, handlers::sign_out, handlers::get_demo
    ),
    components(
        schemas(
            models::Post, models::User, models::Address, models::Company,
            models::HomePage, models::PostDetailPage, models::ProfileView,
            models::SignInPage, models::DemoPage, nav::NavItem, fetch::Phase,
            handlers::DemoMode,
        )
    ),
    tags(
        (name = "dashboard", description = "Posts & users dashboard")
    )
)]
struct ApiDoc;

/// AppState
///
/// Everything a request may need, built once at startup and cloned per
/// request. Cloning is cheap: the HTTP client and session lookup are shared.
#[derive(Clone)]
pub struct AppState {
    /// The loaded, immutable configuration.
    pub config: AppConfig,
    /// Outbound client shared by every fetch controller.
    pub http: reqwest::Client,
    /// Locator builder for the remote posts/users API.
    pub api: PlaceholderApi,
    /// Protected-prefix decision procedure.
    pub guard: RouteGuard,
    /// Session collaborator consulted by the guard and the profile page.
    pub sessions: SessionState,
}

impl AppState {
    /// Wires the default collaborators from configuration: a client honouring
    /// the fetch timeout and a JWT lookup keyed by the session secret.
    pub fn from_config(config: AppConfig) -> reqwest::Result<Self> {
        let http = config.http_client()?;
        let sessions = Arc::new(JwtSessionLookup::new(&config.session_secret)) as SessionState;

        Ok(Self {
            http,
            api: PlaceholderApi::new(config.api_base_url.clone()),
            guard: RouteGuard::from_config(&config),
            sessions,
            config,
        })
    }

    /// Replaces the session collaborator.
    pub fn with_sessions(mut self, sessions: SessionState) -> Self {
        self.sessions = sessions;
        self
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for SessionState {
    fn from_ref(app_state: &AppState) -> SessionState {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the pages, applies the route guard over all of them (including
/// unmatched paths under a protected prefix), then the observability layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(protected::protected_routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            guard::route_guard,
        ))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    MakeRequestUuid,
                ))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one HTTP request, correlated by the `x-request-id` header set
/// by the layer above it.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
