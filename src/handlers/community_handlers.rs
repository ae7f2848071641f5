use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::error_response;
use crate::{
    auth::OnboardedUser,
    repositories::community_repository::{self, CreateCommunityData},
    utils::SearchParams,
    AppState,
};

pub async fn create_community_handler(
    State(state): State<AppState>,
    OnboardedUser(user): OnboardedUser,
    Json(payload): Json<CreateCommunityData>,
) -> Response {
    match community_repository::create_community(state.store.as_ref(), user.id, payload).await {
        Ok(community) => {
            info!(community_id = %community.id, "Successfully created community");
            (StatusCode::CREATED, Json(community)).into_response()
        }
        Err(e) => error_response(e),
    }
}

pub async fn list_communities_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    match community_repository::fetch_communities(state.store.as_ref(), &params).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn get_community_handler(
    State(state): State<AppState>,
    Path(community_id): Path<Uuid>,
) -> Response {
    match community_repository::fetch_community_details(state.store.as_ref(), community_id).await {
        Ok(details) => (StatusCode::OK, Json(details)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn list_community_threads_handler(
    State(state): State<AppState>,
    Path(community_id): Path<Uuid>,
) -> Response {
    match community_repository::fetch_community_threads(state.store.as_ref(), community_id).await {
        Ok(threads) => (StatusCode::OK, Json(threads)).into_response(),
        Err(e) => error_response(e),
    }
}

/// The caller joins the community.
pub async fn join_community_handler(
    State(state): State<AppState>,
    Path(community_id): Path<Uuid>,
    OnboardedUser(user): OnboardedUser,
) -> Response {
    match community_repository::add_member_to_community(state.store.as_ref(), community_id, user.id)
        .await
    {
        Ok(community) => (StatusCode::OK, Json(community)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Removes a member. Members may leave; the creator may remove anyone.
pub async fn remove_member_handler(
    State(state): State<AppState>,
    Path((community_id, member_id)): Path<(Uuid, Uuid)>,
    OnboardedUser(user): OnboardedUser,
) -> Response {
    if user.id != member_id {
        match state.store.get_community(community_id).await {
            Ok(Some(community)) if community.created_by == user.id => {}
            Ok(Some(_)) => {
                warn!(community_id = %community_id, user_id = %user.id, member_id = %member_id, "User attempted to remove another member");
                return (StatusCode::FORBIDDEN, "Only the community creator can remove other members.")
                    .into_response();
            }
            Ok(None) => return (StatusCode::NOT_FOUND, "Community not found").into_response(),
            Err(e) => {
                error!(error = %e, community_id = %community_id, "Failed to check community creator");
                return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to check community creator")
                    .into_response();
            }
        }
    }

    match community_repository::remove_user_from_community(state.store.as_ref(), community_id, member_id)
        .await
    {
        Ok(community) => (StatusCode::OK, Json(community)).into_response(),
        Err(e) => error_response(e),
    }
}
