use dashboard_portal::{
    PlaceholderApi,
    fetch::Phase,
    models::{FetchView, Post, User},
    nav::navigation,
};
use serde_json::json;

#[test]
fn test_post_uses_camel_case_user_id() {
    let post: Post = serde_json::from_value(json!({
        "userId": 7,
        "id": 3,
        "title": "t",
        "body": "b"
    }))
    .unwrap();
    assert_eq!(post.user_id, 7);

    let back = serde_json::to_value(&post).unwrap();
    assert_eq!(back["userId"], 7);
    assert!(back.get("user_id").is_none());
}

#[test]
fn test_user_tolerates_missing_optional_blocks() {
    // Only the identity fields; contact, address and company are absent.
    let user: User = serde_json::from_value(json!({
        "id": 1,
        "name": "Leanne Graham",
        "username": "Bret",
        "email": "Sincere@april.biz"
    }))
    .unwrap();

    assert_eq!(user.phone, "");
    assert_eq!(user.address.city, "");
    assert_eq!(user.company.catch_phrase, "");
}

#[test]
fn test_fetch_view_serialization_shape() {
    let view = FetchView::<Post> {
        resource: "https://api/posts/1".to_string(),
        phase: Phase::Failed,
        loading: false,
        data: None,
        error: Some("Network error: Unable to connect to the server".to_string()),
    };

    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["phase"], "failed");
    assert_eq!(json["loading"], false);
    assert!(json["data"].is_null());
    assert_eq!(json["error"], "Network error: Unable to connect to the server");
}

#[test]
fn test_navigation_marks_exact_match_only() {
    let nav = navigation("/posts");
    let active: Vec<_> = nav.iter().filter(|item| item.active).collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].name, "Posts");

    assert!(navigation("/posts/3").iter().all(|item| !item.active));
}

#[test]
fn test_api_locators() {
    let api = PlaceholderApi::new("https://jsonplaceholder.typicode.com/");

    assert_eq!(api.base_url(), "https://jsonplaceholder.typicode.com");
    assert_eq!(api.posts(), "https://jsonplaceholder.typicode.com/posts");
    assert_eq!(api.post(5), "https://jsonplaceholder.typicode.com/posts/5");
    assert_eq!(api.users(), "https://jsonplaceholder.typicode.com/users");
    assert_eq!(api.user(2), "https://jsonplaceholder.typicode.com/users/2");
}
