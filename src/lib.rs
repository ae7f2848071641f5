use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod config;
pub mod constants;
pub mod handlers;
pub mod models;
pub mod navigation;
pub mod repositories;
pub mod seeder;
pub mod store;
pub mod utils;

use config::ServerConfig;
use handlers::{
    community_handlers::{
        create_community_handler, get_community_handler, join_community_handler,
        list_communities_handler, list_community_threads_handler, remove_member_handler,
    },
    get_server_info_handler, health_handler,
    navigation_handlers::get_navigation_handler,
    thread_handlers::{
        create_comment_handler, create_thread_handler, delete_thread_handler, get_thread_handler,
        list_descendants_handler, list_threads_handler,
    },
    user_handlers::{
        get_activity_handler, get_current_user_handler, get_user_handler,
        list_user_threads_handler, search_users_handler, update_current_user_handler,
    },
};
use store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: ServerConfig,
}

/// Builds the application router over the given store.
pub fn create_router(store: Arc<dyn Store>, config: ServerConfig) -> Router {
    let max_body_size = config.max_body_size;
    let app_state = AppState { store, config };

    Router::new()
        .route("/", get(get_server_info_handler))
        .route("/health", get(health_handler))
        .route("/navigation", get(get_navigation_handler))
        .route("/threads", post(create_thread_handler).get(list_threads_handler))
        .route("/threads/:thread_id", get(get_thread_handler).delete(delete_thread_handler))
        .route("/threads/:thread_id/comments", post(create_comment_handler))
        .route("/threads/:thread_id/descendants", get(list_descendants_handler))
        .route("/users", get(search_users_handler))
        .route("/users/me", get(get_current_user_handler).put(update_current_user_handler))
        .route("/users/:auth_id", get(get_user_handler))
        .route("/users/:auth_id/threads", get(list_user_threads_handler))
        .route("/activity", get(get_activity_handler))
        .route("/communities", post(create_community_handler).get(list_communities_handler))
        .route("/communities/:community_id", get(get_community_handler))
        .route("/communities/:community_id/threads", get(list_community_threads_handler))
        .route("/communities/:community_id/members", post(join_community_handler))
        .route(
            "/communities/:community_id/members/:user_id",
            delete(remove_member_handler),
        )
        .with_state(app_state)
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(TraceLayer::new_for_http())
}
