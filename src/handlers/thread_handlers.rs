use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;
use uuid::Uuid;

use super::error_response;
use crate::{
    auth::OnboardedUser,
    repositories::thread_repository::{self, CreateCommentData, CreateThreadData},
    utils::PageParams,
    AppState,
};

/// Handler to create a new top-level thread, optionally inside a community.
pub async fn create_thread_handler(
    State(state): State<AppState>,
    OnboardedUser(author): OnboardedUser,
    Json(payload): Json<CreateThreadData>,
) -> Response {
    match thread_repository::create_thread(state.store.as_ref(), author.id, payload).await {
        Ok(thread) => {
            info!(thread_id = %thread.id, author_id = %author.id, "Successfully created thread");
            (StatusCode::CREATED, Json(thread)).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// Handler for the home feed: top-level threads with pagination.
pub async fn list_threads_handler(
    State(state): State<AppState>,
    Query(pagination): Query<PageParams>,
) -> Response {
    match thread_repository::fetch_threads(state.store.as_ref(), &pagination).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Handler to get a single thread with its nested replies.
pub async fn get_thread_handler(
    State(state): State<AppState>,
    Path(thread_id): Path<Uuid>,
) -> Response {
    match thread_repository::fetch_thread_by_id(state.store.as_ref(), thread_id).await {
        Ok(thread) => (StatusCode::OK, Json(thread)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Handler to reply to a thread (or to another reply).
pub async fn create_comment_handler(
    State(state): State<AppState>,
    Path(thread_id): Path<Uuid>,
    OnboardedUser(author): OnboardedUser,
    Json(payload): Json<CreateCommentData>,
) -> Response {
    match thread_repository::add_comment_to_thread(state.store.as_ref(), thread_id, author.id, payload)
        .await
    {
        Ok(comment) => {
            info!(comment_id = %comment.id, parent_id = %thread_id, author_id = %author.id, "Successfully added comment");
            (StatusCode::CREATED, Json(comment)).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// Handler listing every reply below a thread, at any depth.
pub async fn list_descendants_handler(
    State(state): State<AppState>,
    Path(thread_id): Path<Uuid>,
) -> Response {
    match thread_repository::fetch_all_child_threads(state.store.as_ref(), thread_id).await {
        Ok(threads) => (StatusCode::OK, Json(threads)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Handler to delete a thread and its replies (author only).
pub async fn delete_thread_handler(
    State(state): State<AppState>,
    Path(thread_id): Path<Uuid>,
    OnboardedUser(user): OnboardedUser,
) -> Response {
    match thread_repository::delete_thread(state.store.as_ref(), thread_id, user.id).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}
