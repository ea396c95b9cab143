use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, StatusCode, header, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};

/// Cookie names the identity provider stores the session token under. The
/// `__Secure-` variant is used when the site is served over HTTPS.
pub const SESSION_COOKIES: [&str; 2] = [
    "next-auth.session-token",
    "__Secure-next-auth.session-token",
];

/// SessionClaims
///
/// Payload of the signed session token issued by the identity provider.
/// Only `sub` and `exp` are mandatory; the profile fields are whatever the
/// provider shared at sign-in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    /// Subject (sub): the provider's account identifier.
    pub sub: String,
    /// Expiration Time (exp): tokens past this instant are treated as absent.
    pub exp: u64,
    /// Issued At (iat): when the visitor signed in.
    #[serde(default)]
    pub iat: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    /// Identity provider that authenticated the visitor (e.g. "google").
    #[serde(default)]
    pub provider: Option<String>,
}

/// SessionError
///
/// The lookup itself could not be performed. Callers fail closed on it.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session provider failure: {0}")]
    Provider(String),
}

/// SessionLookup
///
/// The session collaborator: given the request headers, report whether a
/// valid session exists. `Ok(None)` is the ordinary "signed out" answer;
/// `Err` means the question could not be answered.
#[async_trait]
pub trait SessionLookup: Send + Sync {
    async fn lookup(&self, headers: &HeaderMap) -> Result<Option<SessionClaims>, SessionError>;
}

/// SessionState
///
/// Shared handle to the session collaborator, built once at startup.
pub type SessionState = Arc<dyn SessionLookup>;

/// JwtSessionLookup
///
/// Validates HS256 session tokens signed with the secret shared with the
/// identity provider. The token is taken from the session cookie, or from a
/// `Bearer` authorization header for non-browser clients.
pub struct JwtSessionLookup {
    key: DecodingKey,
    validation: Validation,
}

impl JwtSessionLookup {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

/// Pulls the raw session token out of the request, cookie first.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    let from_cookie = SESSION_COOKIES
        .iter()
        .find_map(|name| jar.get(name))
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty());

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_string)
    })
}

#[async_trait]
impl SessionLookup for JwtSessionLookup {
    async fn lookup(&self, headers: &HeaderMap) -> Result<Option<SessionClaims>, SessionError> {
        let Some(token) = session_token(headers) else {
            return Ok(None);
        };

        match decode::<SessionClaims>(&token, &self.key, &self.validation) {
            Ok(data) => Ok(Some(data.claims)),
            Err(e) => match e.kind() {
                // A bad or stale token is simply no session.
                ErrorKind::InvalidToken
                | ErrorKind::InvalidSignature
                | ErrorKind::ExpiredSignature
                | ErrorKind::ImmatureSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => {
                    tracing::debug!(error = %e, "session token rejected");
                    Ok(None)
                }
                _ => Err(SessionError::Provider(e.to_string())),
            },
        }
    }
}

/// SessionUser Extractor Result
///
/// The claims of the signed-in visitor. Used by handlers that need the
/// session contents rather than just the guard's yes/no.
#[derive(Debug, Clone)]
pub struct SessionUser(pub SessionClaims);

/// Rejects with 401 when there is no valid session or the lookup fails.
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
    SessionState: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let sessions = SessionState::from_ref(state);

        match sessions.lookup(&parts.headers).await {
            Ok(Some(claims)) => Ok(SessionUser(claims)),
            Ok(None) => Err(StatusCode::UNAUTHORIZED),
            Err(e) => {
                tracing::warn!(error = %e, "session lookup failed, rejecting request");
                Err(StatusCode::UNAUTHORIZED)
            }
        }
    }
}
