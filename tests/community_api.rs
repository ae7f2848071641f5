// tests/community_api.rs
mod common;

use axum::http::{self, StatusCode};
use serde_json::json;
use threads_server::models::{Community, CommunityDetails, Page, ThreadView, UserProfile};
use uuid::Uuid;

use common::helpers::{
    create_test_app, create_test_comment, create_test_community, create_test_thread,
    delete_request, get_request, json_request, onboard_user, send, send_json,
};

#[tokio::test]
async fn test_create_community_success() {
    let (app, _) = create_test_app();
    let alice = onboard_user(&app, "auth_alice", "alice").await;

    let community = create_test_community(&app, "auth_alice", "Chess").await;
    assert_eq!(community.slug, "chess");
    assert_eq!(community.created_by, alice.id);
    assert_eq!(community.members, vec![alice.id]);

    let details: CommunityDetails = send_json(
        &app,
        get_request(&format!("/communities/{}", community.id), None),
        StatusCode::OK,
    )
    .await;
    assert_eq!(details.creator.id, alice.id);
    assert_eq!(details.member_summaries.len(), 1);
    assert_eq!(details.member_summaries[0].username, "alice");
}

#[tokio::test]
async fn test_create_community_duplicate_slug() {
    let (app, _) = create_test_app();
    onboard_user(&app, "auth_alice", "alice").await;
    create_test_community(&app, "auth_alice", "chess").await;

    let (status, _) = send(
        &app,
        json_request(
            http::Method::POST,
            "/communities",
            Some("auth_alice"),
            json!({ "slug": "chess", "name": "Chess again" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_get_community_not_found() {
    let (app, _) = create_test_app();

    let (status, _) = send(&app, get_request(&format!("/communities/{}", Uuid::new_v4()), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_communities_search_and_pagination() {
    let (app, _) = create_test_app();
    onboard_user(&app, "auth_alice", "alice").await;
    create_test_community(&app, "auth_alice", "chess").await;
    create_test_community(&app, "auth_alice", "go").await;
    create_test_community(&app, "auth_alice", "chess-variants").await;

    let found: Page<Community> =
        send_json(&app, get_request("/communities?search=CHESS", None), StatusCode::OK).await;
    let slugs: Vec<&str> = found.items.iter().map(|c| c.slug.as_str()).collect();
    assert_eq!(slugs, vec!["chess-variants", "chess"]);

    let page: Page<Community> = send_json(
        &app,
        get_request("/communities?page_number=1&page_size=2", None),
        StatusCode::OK,
    )
    .await;
    assert_eq!(page.items.len(), 2);
    assert!(page.is_next);
}

#[tokio::test]
async fn test_join_and_leave_community() {
    let (app, _) = create_test_app();
    onboard_user(&app, "auth_alice", "alice").await;
    let bob = onboard_user(&app, "auth_bob", "bob").await;
    let community = create_test_community(&app, "auth_alice", "chess").await;

    let joined: Community = send_json(
        &app,
        json_request(
            http::Method::POST,
            &format!("/communities/{}/members", community.id),
            Some("auth_bob"),
            json!({}),
        ),
        StatusCode::OK,
    )
    .await;
    assert!(joined.members.contains(&bob.id));

    // Joining twice changes nothing
    let again: Community = send_json(
        &app,
        json_request(
            http::Method::POST,
            &format!("/communities/{}/members", community.id),
            Some("auth_bob"),
            json!({}),
        ),
        StatusCode::OK,
    )
    .await;
    assert_eq!(again.members.len(), 2);

    let profile: UserProfile =
        send_json(&app, get_request("/users/auth_bob", None), StatusCode::OK).await;
    assert_eq!(profile.user.communities, vec![community.id]);

    let left: Community = send_json(
        &app,
        delete_request(
            &format!("/communities/{}/members/{}", community.id, bob.id),
            Some("auth_bob"),
        ),
        StatusCode::OK,
    )
    .await;
    assert!(!left.members.contains(&bob.id));

    // No longer a member
    let (status, _) = send(
        &app,
        delete_request(
            &format!("/communities/{}/members/{}", community.id, bob.id),
            Some("auth_bob"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_only_creator_removes_others() {
    let (app, _) = create_test_app();
    let alice = onboard_user(&app, "auth_alice", "alice").await;
    let bob = onboard_user(&app, "auth_bob", "bob").await;
    onboard_user(&app, "auth_carol", "carol").await;
    let community = create_test_community(&app, "auth_alice", "chess").await;

    for auth_id in ["auth_bob", "auth_carol"] {
        let (status, _) = send(
            &app,
            json_request(
                http::Method::POST,
                &format!("/communities/{}/members", community.id),
                Some(auth_id),
                json!({}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    // Carol can't remove Bob
    let (status, _) = send(
        &app,
        delete_request(
            &format!("/communities/{}/members/{}", community.id, bob.id),
            Some("auth_carol"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The creator can
    let updated: Community = send_json(
        &app,
        delete_request(
            &format!("/communities/{}/members/{}", community.id, bob.id),
            Some("auth_alice"),
        ),
        StatusCode::OK,
    )
    .await;
    assert_eq!(updated.members.len(), 2);
    assert!(updated.members.contains(&alice.id));
}

#[tokio::test]
async fn test_community_threads() {
    let (app, _) = create_test_app();
    onboard_user(&app, "auth_alice", "alice").await;
    onboard_user(&app, "auth_bob", "bob").await;
    let community = create_test_community(&app, "auth_alice", "chess").await;

    let first = create_test_thread(&app, "auth_alice", "e4", Some(community.id)).await;
    let second = create_test_thread(&app, "auth_bob", "d4", Some(community.id)).await;
    create_test_thread(&app, "auth_bob", "Outside", None).await;
    create_test_comment(&app, "auth_bob", first.id, "e5").await;

    let threads: Vec<ThreadView> = send_json(
        &app,
        get_request(&format!("/communities/{}/threads", community.id), None),
        StatusCode::OK,
    )
    .await;
    let ids: Vec<Uuid> = threads.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
    assert_eq!(threads[1].children.len(), 1);
    assert!(threads.iter().all(|t| t.community.as_ref().map(|c| c.id) == Some(community.id)));
}

#[tokio::test]
async fn test_list_communities_page_number_past_range() {
    let (app, _) = create_test_app();
    onboard_user(&app, "auth_alice", "alice").await;
    create_test_community(&app, "auth_alice", "chess").await;

    let page: Page<Community> = send_json(
        &app,
        get_request(
            &format!("/communities?page_number={}&page_size=100", u64::MAX),
            None,
        ),
        StatusCode::OK,
    )
    .await;
    assert!(page.items.is_empty());
    assert!(!page.is_next);
}
