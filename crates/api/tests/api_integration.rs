//! API integration tests.
//!
//! These drive the full router, middleware included, against a mock database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    middleware,
};
use chrono::{DateTime, Duration, FixedOffset};
use folio_api::{
    AppState, RateLimitConfig, RateLimiterState, middleware::auth_middleware,
    rate_limit::rate_limit_middleware, router as api_router,
};
use folio_common::config::PaginationConfig;
use folio_db::entities::{
    comment,
    post::{self, Category, Status},
    profile,
};
use sea_orm::{DatabaseBackend, MockDatabase};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

fn at(seconds: i64) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2024-06-01T09:00:00Z").unwrap() + Duration::seconds(seconds)
}

fn create_test_profile(id: &str) -> profile::Model {
    profile::Model {
        id: id.to_string(),
        username: id.to_string(),
        display_name: None,
        avatar_url: None,
        token: Some(format!("token-{id}")),
        created_at: at(0),
        updated_at: at(0),
    }
}

fn create_test_post(id: &str, status: Status, seconds: i64) -> post::Model {
    post::Model {
        id: id.to_string(),
        author_id: "alice".to_string(),
        title: format!("Post {id}"),
        content: "<p>body</p>".to_string(),
        category: Category::Blog,
        status,
        created_at: at(seconds),
        updated_at: at(seconds),
    }
}

fn create_test_comment(id: &str, parent: Option<&str>, seconds: i64) -> comment::Model {
    comment::Model {
        id: id.to_string(),
        post_id: "p1".to_string(),
        author_id: "bob".to_string(),
        parent_comment_id: parent.map(str::to_string),
        content: format!("Comment {id}"),
        created_at: at(seconds),
        updated_at: at(seconds),
    }
}

/// Full app over `db`, with auth and rate limiting.
fn create_test_app(db: MockDatabase, limiter: RateLimiterState) -> Router {
    let state = AppState::new(Arc::new(db.into_connection()), &PaginationConfig::default());

    api_router()
        .layer(middleware::from_fn_with_state(limiter, rate_limit_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
}

fn create_test_router(db: MockDatabase) -> Router {
    create_test_app(db, RateLimiterState::new())
}

fn empty_db() -> MockDatabase {
    MockDatabase::new(DatabaseBackend::Postgres)
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_json_as(uri: &str, token: &str, body: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/nonexistent/endpoint")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_post_without_token_is_unauthorized() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(post_json("/posts/create", r#"{"title":"Hello"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_unknown_token_is_treated_as_anonymous() {
    let db = empty_db().append_query_results([Vec::<profile::Model>::new()]);
    let app = create_test_router(db);

    let response = app
        .oneshot(post_json_as(
            "/reactions/toggle",
            "stale",
            r#"{"postId":"p1","reaction":"like"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_post_as_author() {
    let created = create_test_post("p1", Status::Draft, 0);
    let db = empty_db()
        .append_query_results([[create_test_profile("alice")]])
        .append_query_results([[created]]);
    let app = create_test_router(db);

    let response = app
        .oneshot(post_json_as(
            "/posts/create",
            "token-alice",
            r#"{"title":"Post p1","content":"<p>body</p>","category":"blog"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["id"], "p1");
    assert_eq!(body["data"]["status"], "draft");
    assert_eq!(body["data"]["category"], "blog");
    assert!(response_has_no_token(&body));
}

fn response_has_no_token(body: &Value) -> bool {
    !body.to_string().contains("token-")
}

#[tokio::test]
async fn test_feed_returns_page_contract() {
    let rows = vec![
        create_test_post("p2", Status::Published, 20),
        create_test_post("p1", Status::Published, 10),
    ];
    let app = create_test_router(empty_db().append_query_results([rows]));

    let response = app
        .oneshot(post_json("/posts/feed", r#"{"limit":5}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["hasMore"], false);
    assert!(body["data"]["nextCursor"].is_null());
}

#[tokio::test]
async fn test_feed_emits_next_cursor() {
    let rows = vec![
        create_test_post("p3", Status::Published, 30),
        create_test_post("p2", Status::Published, 20),
        create_test_post("p1", Status::Published, 10),
    ];
    let app = create_test_router(empty_db().append_query_results([rows]));

    let response = app
        .oneshot(post_json("/posts/feed", r#"{"limit":2}"#))
        .await
        .unwrap();

    let body = json_body(response).await;
    assert_eq!(body["data"]["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["hasMore"], true);
    assert_eq!(body["data"]["nextCursor"], "2024-06-01T09:00:20Z_p2");
}

#[tokio::test]
async fn test_feed_with_malformed_cursor_is_empty() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(post_json("/posts/feed", r#"{"cursor":"not-a-cursor"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(
        body["data"],
        serde_json::json!({"data": [], "nextCursor": null, "hasMore": false})
    );
}

#[tokio::test]
async fn test_feed_store_failure_is_empty() {
    // No queued results: the page query fails.
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(post_json("/posts/feed", "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["hasMore"], false);
    assert!(body["data"]["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_show_draft_to_anonymous_is_not_found() {
    let db = empty_db().append_query_results([[create_test_post("p1", Status::Draft, 0)]]);
    let app = create_test_router(db);

    let response = app
        .oneshot(post_json("/posts/show", r#"{"postId":"p1"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "POST_NOT_FOUND");
}

#[tokio::test]
async fn test_comment_thread_is_nested() {
    let db = empty_db()
        .append_query_results([[create_test_post("p1", Status::Published, 0)]])
        .append_query_results([vec![
            create_test_comment("A", None, 1),
            create_test_comment("B", None, 2),
            create_test_comment("C", Some("A"), 3),
            create_test_comment("D", Some("C"), 4),
        ]])
        .append_query_results([[create_test_profile("bob")]]);
    let app = create_test_router(db);

    let response = app
        .oneshot(post_json("/comments/thread", r#"{"postId":"p1"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let roots = body["data"].as_array().unwrap();
    assert_eq!(roots.len(), 2);
    assert_eq!(roots[0]["id"], "A");
    assert_eq!(roots[0]["author"]["username"], "bob");
    assert_eq!(roots[0]["replies"][0]["id"], "C");
    assert_eq!(roots[0]["replies"][0]["replies"][0]["id"], "D");
    assert_eq!(roots[1]["id"], "B");
    assert!(roots[1]["replies"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_rate_limit_rejects_with_retry_after() {
    let limiter = RateLimiterState {
        read: RateLimitConfig::new(2, 60),
        ..RateLimiterState::new()
    };
    let app = create_test_app(empty_db(), limiter);
    let request = || {
        let mut req = post_json("/posts/feed", r#"{"cursor":"bad"}"#);
        req.headers_mut()
            .insert("x-forwarded-for", "203.0.113.9".parse().unwrap());
        req
    };

    for remaining in ["1", "0"] {
        let response = app.clone().oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["X-RateLimit-Remaining"], remaining);
    }

    let response = app.oneshot(request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("Retry-After"));
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "RATE_LIMITED");
}
