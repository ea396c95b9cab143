use axum::{
    extract::{Request, State},
    http::{Uri, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use url::form_urlencoded;

use crate::{AppState, auth::SessionLookup, config::AppConfig};

/// Query parameter the sign-in flow reads the return destination from.
pub const CALLBACK_PARAM: &str = "callbackUrl";

/// RouteDecision
///
/// Outcome of evaluating one incoming request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    RedirectTo {
        sign_in_path: String,
        callback_url: String,
    },
}

impl RouteDecision {
    /// The `Location` a redirect should point at, e.g.
    /// `/auth/signin?callbackUrl=http%3A%2F%2Fhost%2Fprofile`.
    pub fn location(&self) -> Option<String> {
        match self {
            Self::Allow => None,
            Self::RedirectTo {
                sign_in_path,
                callback_url,
            } => {
                let query = form_urlencoded::Serializer::new(String::new())
                    .append_pair(CALLBACK_PARAM, callback_url)
                    .finish();
                Some(format!("{sign_in_path}?{query}"))
            }
        }
    }
}

/// ProtectedPrefix
///
/// A path and everything beneath it: `/profile` covers `/profile` and
/// `/profile/settings`, never `/profiles`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedPrefix(String);

impl ProtectedPrefix {
    pub fn new(prefix: &str) -> Self {
        Self(format!("/{}", prefix.trim_matches('/')))
    }

    pub fn matches(&self, path: &str) -> bool {
        if self.0 == "/" {
            return true;
        }
        match path.strip_prefix(self.0.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

/// RouteGuard
///
/// Decides, per request, whether a protected path may be served. Paths
/// outside every protected prefix pass without consulting the session
/// collaborator at all.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    prefixes: Vec<ProtectedPrefix>,
    sign_in: ProtectedPrefix,
    sign_in_path: String,
    public_url: String,
}

impl RouteGuard {
    pub fn new<I, P>(prefixes: I, sign_in_path: &str, public_url: &str) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(|prefix| ProtectedPrefix::new(prefix.as_ref()))
                .collect(),
            sign_in: ProtectedPrefix::new(sign_in_path),
            sign_in_path: sign_in_path.to_string(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.protected_prefixes,
            &config.sign_in_path,
            &config.public_url,
        )
    }

    pub fn sign_in_path(&self) -> &str {
        &self.sign_in_path
    }

    /// The sign-in page and anything beneath it are always reachable, even
    /// when a prefix such as `/` covers them.
    pub fn is_protected(&self, path: &str) -> bool {
        if self.sign_in.matches(path) {
            return false;
        }
        self.prefixes.iter().any(|prefix| prefix.matches(path))
    }

    /// decide
    ///
    /// Performs at most one session lookup. A lookup that errors is treated
    /// as no session.
    pub async fn decide(&self, parts: &Parts, sessions: &dyn SessionLookup) -> RouteDecision {
        let path = parts.uri.path();
        if !self.is_protected(path) {
            return RouteDecision::Allow;
        }

        let session = match sessions.lookup(&parts.headers).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(path, error = %e, "session lookup failed, denying access");
                None
            }
        };

        match session {
            Some(claims) => {
                tracing::debug!(path, sub = %claims.sub, "protected route allowed");
                RouteDecision::Allow
            }
            None => {
                let callback_url = self.requested_url(&parts.uri);
                tracing::info!(path, %callback_url, "no session, redirecting to sign-in");
                RouteDecision::RedirectTo {
                    sign_in_path: self.sign_in_path.clone(),
                    callback_url,
                }
            }
        }
    }

    /// Full URL of the request as the visitor saw it. Origin-form URIs are
    /// resolved against the configured public origin.
    fn requested_url(&self, uri: &Uri) -> String {
        if uri.scheme().is_some() {
            return uri.to_string();
        }
        let path_and_query = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| uri.path());
        format!("{}{}", self.public_url, path_and_query)
    }
}

/// route_guard
///
/// Middleware applied to the whole router. Redirects (307) to the sign-in
/// page when the guard refuses; otherwise hands the request on untouched.
pub async fn route_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();

    let decision = state.guard.decide(&parts, state.sessions.as_ref()).await;
    match decision.location() {
        None => next.run(Request::from_parts(parts, body)).await,
        Some(location) => Redirect::temporary(&location).into_response(),
    }
}
