use axum::{extract::Query, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;

use crate::auth::AuthenticatedUser;
use crate::navigation::sidebar_links;

#[derive(Debug, Deserialize)]
pub struct NavigationParams {
    #[serde(default = "root_path")]
    path: String,
}

fn root_path() -> String {
    "/".to_string()
}

/// Sidebar links with the active one flagged for the requested path.
pub async fn get_navigation_handler(
    user: Option<AuthenticatedUser>,
    Query(params): Query<NavigationParams>,
) -> impl IntoResponse {
    let auth_id = user.as_ref().map(|u| u.0.as_str());
    (StatusCode::OK, Json(sidebar_links(&params.path, auth_id)))
}
