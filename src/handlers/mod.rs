pub mod community_handlers;
pub mod navigation_handlers;
pub mod thread_handlers;
pub mod user_handlers;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use crate::models::ServerInfo;
use crate::repositories::RepositoryError;
use crate::AppState;

/// Map a repository failure to a response, logging server-side faults.
pub(crate) fn error_response(e: RepositoryError) -> Response {
    match e {
        RepositoryError::NotFound(what) => {
            (StatusCode::NOT_FOUND, format!("{} not found", what)).into_response()
        }
        RepositoryError::Validation(message) => (StatusCode::BAD_REQUEST, message).into_response(),
        RepositoryError::Forbidden(message) => {
            warn!(reason = %message, "Forbidden request");
            (StatusCode::FORBIDDEN, message).into_response()
        }
        RepositoryError::Conflict(message) => (StatusCode::CONFLICT, message).into_response(),
        RepositoryError::Store { context, source } => {
            error!(error = %source, "{}", context);
            (StatusCode::INTERNAL_SERVER_ERROR, context).into_response()
        }
    }
}

pub async fn get_server_info_handler(State(state): State<AppState>) -> impl IntoResponse {
    let response = ServerInfo {
        name: state.config.name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    (StatusCode::OK, Json(response))
}

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
