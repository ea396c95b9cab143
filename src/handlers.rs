use crate::{
    AppState,
    auth::{SESSION_COOKIES, SessionLookup, SessionUser},
    fetch::FetchController,
    models::{
        DemoPage, FetchView, HomePage, Post, PostDetailPage, ProfileView, SignInPage, User,
    },
    nav::{self, NavItem},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::{DateTime, Utc};
use serde::{Deserialize, de::DeserializeOwned};
use url::Url;

/// Locator the error demo fetches to provoke a network failure.
pub const DEMO_FAILURE_URL: &str = "https://invalid-url-that-will-fail.com/api/data";

// --- Query Structs ---

/// PageQuery
///
/// Accepted by every data page. `refetch=true` settles once, re-runs the
/// same controller, and returns the second settlement ("Try again").
#[derive(Deserialize, Default, utoipa::IntoParams)]
pub struct PageQuery {
    #[serde(default)]
    pub refetch: bool,
}

/// SignInQuery
///
/// Where to send the visitor once the identity provider is done.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct SignInQuery {
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

/// NavQuery
///
/// The page the sidebar is being rendered for.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct NavQuery {
    pub path: Option<String>,
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DemoMode {
    Error,
    Success,
    Reset,
}

/// DemoQuery
///
/// Selects which locator the error-handling demo fetches.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct DemoQuery {
    pub mode: Option<DemoMode>,
}

/// Runs one controller to settlement (twice when a refetch is requested) and
/// snapshots the result.
async fn load<T>(state: &AppState, resource: String, refetch: bool) -> FetchView<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    let controller = FetchController::<T>::invoke(state.http.clone(), resource);
    let mut settled = controller.settled().await;
    if refetch {
        controller.refetch();
        settled = controller.settled().await;
    }
    FetchView::from(&settled)
}

// --- Handlers ---

/// get_home
///
/// [Public Route] Navigation shell and session presence. A failing session
/// lookup renders as signed out.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Home", body = HomePage))
)]
pub async fn get_home(State(state): State<AppState>, headers: HeaderMap) -> Json<HomePage> {
    let signed_in = matches!(state.sessions.lookup(&headers).await, Ok(Some(_)));
    Json(HomePage {
        title: "Dashboard".to_string(),
        signed_in,
        navigation: nav::navigation("/"),
    })
}

/// get_navigation
///
/// [Public Route] Sidebar for the page at `path`, with that entry active.
#[utoipa::path(
    get,
    path = "/navigation",
    params(NavQuery),
    responses((status = 200, description = "Sidebar items", body = Vec<NavItem>))
)]
pub async fn get_navigation(Query(query): Query<NavQuery>) -> Json<Vec<NavItem>> {
    let path = query.path.as_deref().unwrap_or("/");
    Json(nav::navigation(path))
}

/// get_posts
///
/// [Public Route] All posts from the remote API.
#[utoipa::path(
    get,
    path = "/posts",
    params(PageQuery),
    responses((status = 200, description = "Posts", body = FetchView<Vec<Post>>))
)]
pub async fn get_posts(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Json<FetchView<Vec<Post>>> {
    let resource = state.api.posts();
    Json(load(&state, resource, query.refetch).await)
}

/// get_post_detail
///
/// [Public Route] One post plus its author. The author locator stays empty
/// until the post has loaded, so the second fetch only runs on success.
#[utoipa::path(
    get,
    path = "/posts/{id}",
    params(("id" = u32, Path, description = "Post ID"), PageQuery),
    responses((status = 200, description = "Post with author", body = PostDetailPage))
)]
pub async fn get_post_detail(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Query(query): Query<PageQuery>,
) -> Json<PostDetailPage> {
    let post: FetchView<Post> = load(&state, state.api.post(id), query.refetch).await;

    let author_resource = post
        .data
        .as_ref()
        .map(|post| state.api.user(post.user_id))
        .unwrap_or_default();
    let author: FetchView<User> = load(&state, author_resource, false).await;

    Json(PostDetailPage { post, author })
}

/// get_users
///
/// [Public Route] All users from the remote API.
#[utoipa::path(
    get,
    path = "/users",
    params(PageQuery),
    responses((status = 200, description = "Users", body = FetchView<Vec<User>>))
)]
pub async fn get_users(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Json<FetchView<Vec<User>>> {
    let resource = state.api.users();
    Json(load(&state, resource, query.refetch).await)
}

/// get_user_detail
///
/// [Public Route] A single user, as shown in the user detail dialog.
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = u32, Path, description = "User ID"), PageQuery),
    responses((status = 200, description = "User", body = FetchView<User>))
)]
pub async fn get_user_detail(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Query(query): Query<PageQuery>,
) -> Json<FetchView<User>> {
    let resource = state.api.user(id);
    Json(load(&state, resource, query.refetch).await)
}

/// get_profile
///
/// [Protected Route] Account details of the signed-in visitor. The route
/// guard redirects anonymous visitors before this runs; the `SessionUser`
/// extractor rejects with 401 should the guard ever be bypassed.
#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "Profile", body = ProfileView),
        (status = 307, description = "Redirect to sign-in")
    )
)]
pub async fn get_profile(SessionUser(claims): SessionUser) -> Json<ProfileView> {
    let last_sign_in = claims
        .iat
        .and_then(|iat| i64::try_from(iat).ok())
        .and_then(|iat| DateTime::<Utc>::from_timestamp(iat, 0))
        .unwrap_or_else(Utc::now);

    Json(ProfileView {
        name: claims.name.unwrap_or_else(|| "User".to_string()),
        email: claims.email,
        image: claims.picture,
        account_type: account_type(claims.provider.as_deref()),
        last_sign_in,
    })
}

fn account_type(provider: Option<&str>) -> String {
    match provider {
        None | Some("google") => "Google Account".to_string(),
        Some("github") => "GitHub Account".to_string(),
        Some(other) => format!("{other} Account"),
    }
}

/// get_sign_in
///
/// [Public Route] Sign-in landing. Only same-origin callback URLs are echoed
/// back; anything else falls back to `/`.
#[utoipa::path(
    get,
    path = "/auth/signin",
    params(SignInQuery),
    responses((status = 200, description = "Sign-in page", body = SignInPage))
)]
pub async fn get_sign_in(
    State(state): State<AppState>,
    Query(query): Query<SignInQuery>,
) -> Json<SignInPage> {
    let callback_url = query
        .callback_url
        .filter(|url| is_same_origin(url, &state.config.public_url))
        .unwrap_or_else(|| "/".to_string());

    Json(SignInPage {
        callback_url,
        providers: vec!["google".to_string()],
    })
}

/// Resolves `callback` against the public origin and accepts it only if it
/// stays there. Backslashes are refused outright since browsers read them as
/// path separators.
fn is_same_origin(callback: &str, public_url: &str) -> bool {
    if callback.contains('\\') {
        return false;
    }
    let Ok(base) = Url::parse(public_url) else {
        return false;
    };
    Url::options()
        .base_url(Some(&base))
        .parse(callback)
        .is_ok_and(|resolved| resolved.origin() == base.origin())
}

/// sign_out
///
/// [Public Route] Drops the session cookies and sends the visitor to the
/// sign-in page.
#[utoipa::path(
    post,
    path = "/auth/signout",
    responses((status = 303, description = "Signed out, redirect to sign-in"))
)]
pub async fn sign_out(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let jar = SESSION_COOKIES
        .iter()
        .fold(jar, |jar, name| jar.remove(Cookie::build(*name).path("/")));
    tracing::info!("session cleared");
    (jar, Redirect::to(state.guard.sign_in_path()))
}

/// get_demo
///
/// [Public Route] The error-handling demo: `error` fetches an unreachable
/// host, `success` fetches a known post, `reset` (or no mode) fetches nothing.
#[utoipa::path(
    get,
    path = "/demo",
    params(DemoQuery),
    responses((status = 200, description = "Demo result", body = DemoPage))
)]
pub async fn get_demo(
    State(state): State<AppState>,
    Query(query): Query<DemoQuery>,
) -> Json<DemoPage> {
    let mode = query.mode.unwrap_or(DemoMode::Reset);
    let resource = match mode {
        DemoMode::Error => DEMO_FAILURE_URL.to_string(),
        DemoMode::Success => state.api.post(1),
        DemoMode::Reset => String::new(),
    };

    Json(DemoPage {
        visible: mode != DemoMode::Reset,
        result: load(&state, resource, false).await,
    })
}
