use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// Sidebar entries in display order: (label, href).
const NAV_ITEMS: [(&str, &str); 4] = [
    ("Home", "/"),
    ("Posts", "/posts"),
    ("Users", "/users"),
    ("Profile", "/profile"),
];

/// NavItem
///
/// One sidebar link. `active` marks the entry for the page being viewed.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct NavItem {
    pub name: String,
    pub href: String,
    pub active: bool,
}

/// Builds the sidebar for `current_path`. Only an exact href match is active,
/// so `/posts/3` highlights nothing.
pub fn navigation(current_path: &str) -> Vec<NavItem> {
    NAV_ITEMS
        .iter()
        .map(|(name, href)| NavItem {
            name: (*name).to_string(),
            href: (*href).to_string(),
            active: *href == current_path,
        })
        .collect()
}
