use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Protected Router Module
///
/// Pages under a protected prefix. Anonymous requests never reach these
/// handlers: the route guard answers them with a redirect to sign-in.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        // GET /profile
        // Account details from the session claims.
        .route("/profile", get(handlers::get_profile))
}
