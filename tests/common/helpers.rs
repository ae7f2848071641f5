// tests/common/helpers.rs
//! Shared helper functions for integration tests
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    http::{self, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use threads_server::{
    auth::USER_ID_HEADER,
    config::ServerConfig,
    create_router,
    models::{Community, Thread, User},
    store::{MemoryStore, PgStore},
};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_MAX_BODY_SIZE: usize = 64 * 1024;

/// Router over a fresh in-memory store. The store is returned for direct checks.
pub fn create_test_app() -> (Router, MemoryStore) {
    let store = MemoryStore::new();
    let config = ServerConfig::new("Test Threads".to_string(), TEST_MAX_BODY_SIZE);
    let app = create_router(Arc::new(store.clone()), config);
    (app, store)
}

/// Router over the Postgres driver. `#[sqlx::test]` hands in a migrated pool.
pub fn create_pg_test_app(pool: PgPool) -> Router {
    let config = ServerConfig::new("Test Threads".to_string(), TEST_MAX_BODY_SIZE);
    create_router(Arc::new(PgStore::new(pool)), config)
}

pub fn get_request(uri: &str, auth_id: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(http::Method::GET).uri(uri);
    if let Some(auth_id) = auth_id {
        builder = builder.header(USER_ID_HEADER, auth_id);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(
    method: http::Method,
    uri: &str,
    auth_id: Option<&str>,
    body: Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());
    if let Some(auth_id) = auth_id {
        builder = builder.header(USER_ID_HEADER, auth_id);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn delete_request(uri: &str, auth_id: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(http::Method::DELETE).uri(uri);
    if let Some(auth_id) = auth_id {
        builder = builder.header(USER_ID_HEADER, auth_id);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Bytes) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body)
}

/// Send and deserialize, asserting the expected status.
pub async fn send_json<T: DeserializeOwned>(
    app: &Router,
    request: Request<Body>,
    expected: StatusCode,
) -> T {
    let (status, body) = send(app, request).await;
    assert_eq!(
        status,
        expected,
        "unexpected status, body: {}",
        String::from_utf8_lossy(&body)
    );
    serde_json::from_slice(&body).expect("Failed to deserialize response body")
}

pub async fn onboard_user(app: &Router, auth_id: &str, username: &str) -> User {
    send_json(
        app,
        json_request(
            http::Method::PUT,
            "/users/me",
            Some(auth_id),
            json!({
                "username": username,
                "name": format!("{} name", username),
                "bio": "test bio",
                "image": format!("/img/{}.png", username),
            }),
        ),
        StatusCode::OK,
    )
    .await
}

pub async fn create_test_thread(
    app: &Router,
    auth_id: &str,
    text: &str,
    community_id: Option<Uuid>,
) -> Thread {
    send_json(
        app,
        json_request(
            http::Method::POST,
            "/threads",
            Some(auth_id),
            json!({ "text": text, "community_id": community_id }),
        ),
        StatusCode::CREATED,
    )
    .await
}

pub async fn create_test_comment(app: &Router, auth_id: &str, parent_id: Uuid, text: &str) -> Thread {
    send_json(
        app,
        json_request(
            http::Method::POST,
            &format!("/threads/{}/comments", parent_id),
            Some(auth_id),
            json!({ "text": text }),
        ),
        StatusCode::CREATED,
    )
    .await
}

pub async fn create_test_community(app: &Router, auth_id: &str, slug: &str) -> Community {
    send_json(
        app,
        json_request(
            http::Method::POST,
            "/communities",
            Some(auth_id),
            json!({ "slug": slug, "name": format!("{} community", slug) }),
        ),
        StatusCode::CREATED,
    )
    .await
}
