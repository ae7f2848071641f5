//! Sidebar navigation model.

use serde::{Deserialize, Serialize};

const PROFILE_ROUTE: &str = "/profile";

// (label, route, icon)
const SIDEBAR_LINKS: [(&str, &str, &str); 6] = [
    ("Home", "/", "/assets/home.svg"),
    ("Search", "/search", "/assets/search.svg"),
    ("Activity", "/activity", "/assets/heart.svg"),
    ("Create Thread", "/create-thread", "/assets/create.svg"),
    ("Communities", "/communities", "/assets/community.svg"),
    ("Profile", PROFILE_ROUTE, "/assets/user.svg"),
];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SidebarLink {
    pub label: String,
    pub route: String,
    pub img_url: String,
    pub is_active: bool,
}

/// A link is active on its own route and below it. The root route only
/// matches itself.
pub fn is_active(route: &str, pathname: &str) -> bool {
    (pathname.contains(route) && route.len() > 1) || pathname == route
}

/// Sidebar links for `pathname`. For a signed-in user Profile points at
/// their own profile page.
pub fn sidebar_links(pathname: &str, auth_id: Option<&str>) -> Vec<SidebarLink> {
    SIDEBAR_LINKS
        .iter()
        .map(|(label, route, img_url)| {
            let route = match auth_id {
                Some(id) if *route == PROFILE_ROUTE => format!("{}/{}", PROFILE_ROUTE, id),
                _ => route.to_string(),
            };
            SidebarLink {
                label: label.to_string(),
                is_active: is_active(&route, pathname),
                route,
                img_url: img_url.to_string(),
            }
        })
        .collect()
}
