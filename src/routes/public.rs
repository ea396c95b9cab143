use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Dashboard pages that render without a session. Data pages return a
/// `FetchView` snapshot of the remote fetch, so an upstream failure is still
/// a 200 carrying the error message.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe.
        .route("/health", get(|| async { "ok" }))
        // GET /
        // Navigation shell and whether the visitor is signed in.
        .route("/", get(handlers::get_home))
        // GET /navigation?path=...
        // Sidebar with the current page highlighted.
        .route("/navigation", get(handlers::get_navigation))
        // GET /posts?refetch=...
        .route("/posts", get(handlers::get_posts))
        // GET /posts/{id}
        // Post, then its author once the post is known.
        .route("/posts/{id}", get(handlers::get_post_detail))
        // GET /users?refetch=...
        .route("/users", get(handlers::get_users))
        // GET /users/{id}
        .route("/users/{id}", get(handlers::get_user_detail))
        // GET /auth/signin?callbackUrl=...
        // Landing page the guard redirects to.
        .route("/auth/signin", get(handlers::get_sign_in))
        // GET|POST /auth/signout
        .route(
            "/auth/signout",
            get(handlers::sign_out).post(handlers::sign_out),
        )
        // GET /demo?mode=error|success|reset
        .route("/demo", get(handlers::get_demo))
}
