mod common;

use async_trait::async_trait;
use axum::http::{HeaderMap, Request, request::Parts};
use common::claims;
use dashboard_portal::{
    auth::{SessionClaims, SessionError, SessionLookup},
    guard::{ProtectedPrefix, RouteDecision, RouteGuard},
};
use std::sync::atomic::{AtomicUsize, Ordering};

// --- Mock session collaborator ---

enum Answer {
    Present,
    Absent,
    Broken,
}

struct MockSessions {
    answer: Answer,
    lookups: AtomicUsize,
}

impl MockSessions {
    fn new(answer: Answer) -> Self {
        Self {
            answer,
            lookups: AtomicUsize::new(0),
        }
    }

    fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionLookup for MockSessions {
    async fn lookup(&self, _headers: &HeaderMap) -> Result<Option<SessionClaims>, SessionError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        match self.answer {
            Answer::Present => Ok(Some(claims(3600))),
            Answer::Absent => Ok(None),
            Answer::Broken => Err(SessionError::Provider("provider offline".to_string())),
        }
    }
}

fn guard() -> RouteGuard {
    RouteGuard::new(["/profile"], "/auth/signin", "http://localhost:3000")
}

fn parts(uri: &str) -> Parts {
    let (parts, _) = Request::builder()
        .uri(uri)
        .body(())
        .unwrap()
        .into_parts();
    parts
}

// --- Prefix matching ---

#[test]
fn test_prefix_matches_path_and_sub_paths_only() {
    let prefix = ProtectedPrefix::new("/profile");

    assert!(prefix.matches("/profile"));
    assert!(prefix.matches("/profile/"));
    assert!(prefix.matches("/profile/settings"));
    assert!(!prefix.matches("/profiles"));
    assert!(!prefix.matches("/posts"));
    assert!(!prefix.matches("/"));
}

#[test]
fn test_prefix_is_normalised() {
    assert_eq!(ProtectedPrefix::new("profile/"), ProtectedPrefix::new("/profile"));
}

// --- Decisions ---

#[tokio::test]
async fn test_protected_path_without_session_redirects_with_callback() {
    let sessions = MockSessions::new(Answer::Absent);

    let decision = guard().decide(&parts("/profile"), &sessions).await;

    assert_eq!(
        decision,
        RouteDecision::RedirectTo {
            sign_in_path: "/auth/signin".to_string(),
            callback_url: "http://localhost:3000/profile".to_string(),
        }
    );
    assert_eq!(
        decision.location().as_deref(),
        Some("/auth/signin?callbackUrl=http%3A%2F%2Flocalhost%3A3000%2Fprofile")
    );
    assert_eq!(sessions.lookups(), 1);
}

#[tokio::test]
async fn test_callback_keeps_sub_path_and_query() {
    let sessions = MockSessions::new(Answer::Absent);

    let decision = guard()
        .decide(&parts("/profile/settings?tab=security"), &sessions)
        .await;

    match decision {
        RouteDecision::RedirectTo { callback_url, .. } => assert_eq!(
            callback_url,
            "http://localhost:3000/profile/settings?tab=security"
        ),
        RouteDecision::Allow => panic!("expected redirect"),
    }
}

#[tokio::test]
async fn test_protected_path_with_session_is_allowed() {
    let sessions = MockSessions::new(Answer::Present);

    let decision = guard().decide(&parts("/profile"), &sessions).await;

    assert_eq!(decision, RouteDecision::Allow);
    assert_eq!(decision.location(), None);
    assert_eq!(sessions.lookups(), 1);
}

#[tokio::test]
async fn test_unprotected_path_skips_session_lookup() {
    let sessions = MockSessions::new(Answer::Absent);

    for path in ["/posts", "/", "/users/1", "/profiles", "/auth/signin"] {
        let decision = guard().decide(&parts(path), &sessions).await;
        assert_eq!(decision, RouteDecision::Allow, "path {path}");
    }

    assert_eq!(sessions.lookups(), 0);
}

#[tokio::test]
async fn test_failed_lookup_fails_closed() {
    let sessions = MockSessions::new(Answer::Broken);

    let decision = guard().decide(&parts("/profile"), &sessions).await;

    assert!(matches!(decision, RouteDecision::RedirectTo { .. }));
    assert_eq!(sessions.lookups(), 1);
}

#[tokio::test]
async fn test_multiple_prefixes() {
    let guard = RouteGuard::new(["/profile", "/settings/"], "/login", "https://dash.example");
    let sessions = MockSessions::new(Answer::Absent);

    assert!(guard.is_protected("/settings/billing"));
    assert!(!guard.is_protected("/posts"));

    let decision = guard.decide(&parts("/settings"), &sessions).await;
    assert_eq!(
        decision.location().as_deref(),
        Some("/login?callbackUrl=https%3A%2F%2Fdash.example%2Fsettings")
    );
}

#[tokio::test]
async fn test_sign_in_page_reachable_when_everything_is_protected() {
    let guard = RouteGuard::new(["/"], "/auth/signin", "http://localhost:3000");
    let sessions = MockSessions::new(Answer::Absent);

    for uri in ["/auth/signin", "/auth/signin?callbackUrl=x", "/auth/signin/"] {
        let decision = guard.decide(&parts(uri), &sessions).await;
        assert_eq!(decision, RouteDecision::Allow, "{uri} must not loop");
    }
    assert_eq!(sessions.lookups(), 0);

    let decision = guard.decide(&parts("/posts"), &sessions).await;
    assert!(matches!(decision, RouteDecision::RedirectTo { .. }));
    assert_eq!(sessions.lookups(), 1);
}

#[tokio::test]
async fn test_sign_in_page_exempt_from_enclosing_prefix() {
    let guard = RouteGuard::new(["/auth"], "/auth/signin", "http://localhost:3000");
    let sessions = MockSessions::new(Answer::Absent);

    assert!(!guard.is_protected("/auth/signin"));
    assert!(guard.is_protected("/auth/signout"));
    assert_eq!(
        guard.decide(&parts("/auth/signin"), &sessions).await,
        RouteDecision::Allow
    );
}
