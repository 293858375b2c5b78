//! Integration tests for group lifecycle endpoints.

mod common;

use axum::http::{Method, StatusCode};
use common::{
    create_seeded_group, create_test_app, create_test_group, get_request_with_auth, json_request,
    json_request_with_auth, request_with_auth, send, LogMessages, ADMIN_TOKEN, BROKEN_TOKEN,
    CREATOR, CREATOR_TOKEN, DWELLER_TOKEN, OUTSIDER_TOKEN,
};
use serde_json::json;

// ============================================================================
// Creation
// ============================================================================

#[tokio::test]
async fn test_create_group_success() {
    let app = create_test_app().router;

    let (status, body) = send(
        &app,
        json_request_with_auth(
            Method::POST,
            "/group/group",
            json!({"title": "Flatmates", "description": "Shared bills", "url": "flat-42"}),
            CREATOR_TOKEN,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["id"].as_i64().unwrap() > 0);
    assert_eq!(body["title"], "Flatmates");
    assert_eq!(body["url"], "flat-42");
    assert_eq!(body["create_by"], CREATOR);
    assert_eq!(body["status"], 1);
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_create_group_requires_auth() {
    let app = create_test_app().router;

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/group/group",
            json!({"title": "Flatmates", "url": "flat-42"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_empty_bearer_is_missing_auth() {
    let app = create_test_app().router;

    let request = axum::http::Request::builder()
        .method(Method::GET)
        .uri("/group/list")
        .header("authorization", "Bearer ")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Missing Authorization header");
}

#[tokio::test]
async fn test_create_group_unknown_session() {
    let app = create_test_app().router;

    let (status, _) = send(
        &app,
        json_request_with_auth(
            Method::POST,
            "/group/group",
            json!({"title": "Flatmates", "url": "flat-42"}),
            "token-nobody",
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_service_failure_is_bad_gateway() {
    let app = create_test_app().router;

    let (status, body) = send(&app, get_request_with_auth("/group/list", BROKEN_TOKEN)).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "upstream_error");
}

#[tokio::test]
async fn test_create_group_raw_token_header() {
    let app = create_test_app().router;

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/group/group")
        .header("content-type", "application/json")
        .header("authorization", CREATOR_TOKEN)
        .body(axum::body::Body::from(
            json!({"title": "Flatmates", "url": "flat-42"}).to_string(),
        ))
        .unwrap();

    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_create_group_url_too_short() {
    let app = create_test_app().router;

    let (status, body) = send(
        &app,
        json_request_with_auth(
            Method::POST,
            "/group/group",
            json!({"title": "Flatmates", "url": "ab"}),
            CREATOR_TOKEN,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"].as_str().unwrap().contains("Group link"));
}

#[tokio::test]
async fn test_create_group_description_too_long() {
    let app = create_test_app().router;

    let (status, body) = send(
        &app,
        json_request_with_auth(
            Method::POST,
            "/group/group",
            json!({"title": "Flatmates", "url": "flat-42", "description": "d".repeat(501)}),
            CREATOR_TOKEN,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("description"));
}

// ============================================================================
// Reading
// ============================================================================

#[tokio::test]
async fn test_get_group_includes_caller_role() {
    let app = create_test_app().router;
    let group_id = create_seeded_group(&app, "flat-42").await;

    let (status, body) = send(
        &app,
        get_request_with_auth(&format!("/group/group/{}", group_id), DWELLER_TOKEN),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], group_id);
    assert_eq!(body["count"], 3);
    assert_eq!(body["user_role"]["role_id"], 3);
    assert_eq!(body["user_role"]["role_name"], "dweller");
}

#[tokio::test]
async fn test_get_group_non_member_forbidden() {
    let app = create_test_app().router;
    let group_id = create_seeded_group(&app, "flat-42").await;

    let (status, body) = send(
        &app,
        get_request_with_auth(&format!("/group/group/{}", group_id), OUTSIDER_TOKEN),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "user is not a member of this group");
}

#[tokio::test]
async fn test_get_missing_group_not_found() {
    let app = create_test_app().router;

    let (status, _) = send(&app, get_request_with_auth("/group/group/999", CREATOR_TOKEN)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_groups() {
    let app = create_test_app().router;
    let first = create_seeded_group(&app, "flat-42").await;
    let second = create_test_group(&app, ADMIN_TOKEN, "book-club").await;

    let (status, body) = send(&app, get_request_with_auth("/group/list", ADMIN_TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);

    let (status, body) = send(
        &app,
        get_request_with_auth(&format!("/group/list?group_id={}", second), ADMIN_TOKEN),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["id"], second);
    assert_eq!(body["data"][0]["user_role"]["role_id"], 1);

    let (_, body) = send(&app, get_request_with_auth("/group/list", OUTSIDER_TOKEN)).await;
    assert_eq!(body["count"], 0);
    assert_ne!(first, second);
}

// ============================================================================
// Updating and deleting
// ============================================================================

#[tokio::test]
async fn test_update_group_by_admin() {
    let app = create_test_app().router;
    let group_id = create_seeded_group(&app, "flat-42").await;

    let (status, body) = send(
        &app,
        json_request_with_auth(
            Method::PUT,
            &format!("/group/group/{}", group_id),
            json!({"title": "Flat 42", "description": "", "url": "flat-42b"}),
            ADMIN_TOKEN,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Flat 42");
    assert_eq!(body["url"], "flat-42b");
}

#[tokio::test]
async fn test_update_group_by_dweller_forbidden() {
    let app = create_test_app().router;
    let group_id = create_seeded_group(&app, "flat-42").await;

    let (status, body) = send(
        &app,
        json_request_with_auth(
            Method::PUT,
            &format!("/group/group/{}", group_id),
            json!({"title": "Mine now", "url": "flat-42"}),
            DWELLER_TOKEN,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "user has no permission for this action");
}

#[tokio::test]
async fn test_delete_group_is_soft() {
    let app = create_test_app().router;
    let group_id = create_seeded_group(&app, "flat-42").await;

    let (status, body) = send(
        &app,
        request_with_auth(Method::DELETE, &format!("/group/group/{}", group_id), CREATOR_TOKEN),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 2);

    // Deleted groups stay in the member's list with their status.
    let (_, body) = send(&app, get_request_with_auth("/group/list", DWELLER_TOKEN)).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["status"], 2);
}

#[tokio::test]
async fn test_delete_group_by_dweller_forbidden() {
    let app = create_test_app().router;
    let group_id = create_seeded_group(&app, "flat-42").await;

    let (status, _) = send(
        &app,
        request_with_auth(Method::DELETE, &format!("/group/group/{}", group_id), DWELLER_TOKEN),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_group_lifecycle_is_logged_once() {
    let app = create_test_app().router;
    let (logs, _guard) = LogMessages::capture();

    let group_id = create_test_group(&app, CREATOR_TOKEN, "flat-42").await;
    let (status, _) = send(
        &app,
        json_request_with_auth(
            Method::PUT,
            &format!("/group/group/{}", group_id),
            json!({"title": "Flat 42", "url": "flat-42"}),
            CREATOR_TOKEN,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        &app,
        request_with_auth(Method::DELETE, &format!("/group/group/{}", group_id), CREATOR_TOKEN),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(logs.count("Group created"), 1);
    assert_eq!(logs.count("Group updated"), 1);
    assert_eq!(logs.count("Group deleted"), 1);
}
