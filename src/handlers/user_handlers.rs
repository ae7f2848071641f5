use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use super::error_response;
use crate::{
    auth::{AuthenticatedUser, OnboardedUser},
    repositories::user_repository::{self, UpdateUserData},
    utils::SearchParams,
    AppState,
};

/// Onboarding / profile edit. Creates the user on first call.
pub async fn update_current_user_handler(
    State(state): State<AppState>,
    AuthenticatedUser(auth_id): AuthenticatedUser,
    Json(payload): Json<UpdateUserData>,
) -> Response {
    match user_repository::update_user(state.store.as_ref(), &auth_id, payload).await {
        Ok(user) => {
            info!(user_id = %user.id, auth_id = %auth_id, "Successfully updated user");
            (StatusCode::OK, Json(user)).into_response()
        }
        Err(e) => error_response(e),
    }
}

pub async fn get_current_user_handler(
    State(state): State<AppState>,
    AuthenticatedUser(auth_id): AuthenticatedUser,
) -> Response {
    match user_repository::fetch_user(state.store.as_ref(), &auth_id).await {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn get_user_handler(
    State(state): State<AppState>,
    Path(auth_id): Path<String>,
) -> Response {
    match user_repository::fetch_user(state.store.as_ref(), &auth_id).await {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn list_user_threads_handler(
    State(state): State<AppState>,
    Path(auth_id): Path<String>,
) -> Response {
    match user_repository::fetch_user_threads(state.store.as_ref(), &auth_id).await {
        Ok(threads) => (StatusCode::OK, Json(threads)).into_response(),
        Err(e) => error_response(e),
    }
}

/// User search. The caller is never part of the results.
pub async fn search_users_handler(
    State(state): State<AppState>,
    OnboardedUser(user): OnboardedUser,
    Query(params): Query<SearchParams>,
) -> Response {
    match user_repository::fetch_users(state.store.as_ref(), user.id, &params).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Replies other users left on the caller's threads.
pub async fn get_activity_handler(
    State(state): State<AppState>,
    OnboardedUser(user): OnboardedUser,
) -> Response {
    match user_repository::get_activity(state.store.as_ref(), user.id).await {
        Ok(activity) => (StatusCode::OK, Json(activity)).into_response(),
        Err(e) => error_response(e),
    }
}
