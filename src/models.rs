use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::fetch::{FetchState, Phase};
use crate::nav::NavItem;

// --- Remote API Schemas (JSONPlaceholder) ---

/// Post
///
/// A post as returned by `/posts` and `/posts/{id}` on the remote API.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Post {
    pub id: u32,
    // Author of the post; resolves against `/users/{id}`.
    pub user_id: u32,
    pub title: String,
    pub body: String,
}

/// User
///
/// A user record from `/users` and `/users/{id}`. Fields the dashboard does
/// not display (e.g. the address geo block) are ignored on decode.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct User {
    pub id: u32,
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub company: Company,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct Address {
    pub street: String,
    pub suite: String,
    pub city: String,
    pub zipcode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Company {
    pub name: String,
    pub catch_phrase: String,
    pub bs: String,
}

// --- Page View Models (Output) ---

/// FetchView
///
/// Serializable snapshot of a settled fetch, the shape every data page returns.
/// `error` is the human-readable message; `data` and `error` are never both set.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct FetchView<T> {
    pub resource: String,
    pub phase: Phase,
    pub loading: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Clone> From<&FetchState<T>> for FetchView<T> {
    fn from(state: &FetchState<T>) -> Self {
        Self {
            resource: state.resource().to_string(),
            phase: state.phase(),
            loading: state.is_loading(),
            data: state.data().cloned(),
            error: state.error().map(ToString::to_string),
        }
    }
}

/// HomePage
///
/// Landing view: the navigation shell plus whether a session is present.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct HomePage {
    pub title: String,
    pub signed_in: bool,
    pub navigation: Vec<NavItem>,
}

/// PostDetailPage
///
/// A post and its author. The author is fetched only once the post has loaded,
/// so a failed post leaves the author idle.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PostDetailPage {
    pub post: FetchView<Post>,
    pub author: FetchView<User>,
}

/// ProfileView
///
/// Account details derived from the session claims (GET /profile).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ProfileView {
    pub name: String,
    pub email: Option<String>,
    pub image: Option<String>,
    pub account_type: String,
    #[ts(type = "string")]
    pub last_sign_in: DateTime<Utc>,
}

/// SignInPage
///
/// Sign-in landing. The identity provider returns the visitor to
/// `callback_url` once authenticated.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SignInPage {
    pub callback_url: String,
    pub providers: Vec<String>,
}

/// DemoPage
///
/// Result of the error-handling demo (GET /demo).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DemoPage {
    pub visible: bool,
    pub result: FetchView<Post>,
}
