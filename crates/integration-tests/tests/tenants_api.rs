//! Tenant registration, listing and health endpoint tests.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::json;
use storesync_core::UserId;
use storesync_integration_tests::TestContext;

const OWNER: UserId = UserId::new(42);
const STRANGER: UserId = UserId::new(7);

#[tokio::test]
async fn test_health_endpoints() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.get("/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Server is running!");

    let (status, body) = ctx.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");

    let (status, _) = ctx.get("/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_then_list() {
    let ctx = TestContext::new().await;

    let (status, created) = ctx
        .post_json(
            "/tenants",
            OWNER,
            &json!({
                "name": "Demo",
                "storeUrl": "https://demo.myshopify.com/",
                "apiToken": "shpat_secret"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["name"], "Demo");
    assert_eq!(created["storeUrl"], "https://demo.myshopify.com");
    assert_eq!(created["userId"], 42);
    assert!(created.get("apiToken").is_none());

    let (status, listed) = ctx.get("/tenants", Some(OWNER)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([created]));

    let (_, aliased) = ctx.get("/stores", Some(OWNER)).await;
    assert_eq!(aliased, listed);
}

#[tokio::test]
async fn test_list_only_shows_own_tenants() {
    let ctx = TestContext::new().await;
    ctx.register_tenant(OWNER, "Mine").await;
    ctx.register_tenant(STRANGER, "Theirs").await;

    let (_, listed) = ctx.get("/tenants", Some(OWNER)).await;

    let names: Vec<_> = listed
        .as_array()
        .expect("array body")
        .iter()
        .map(|t| t["name"].clone())
        .collect();
    assert_eq!(names, vec![json!("Mine")]);
}

#[tokio::test]
async fn test_register_rejects_invalid_body() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .post_json(
            "/tenants",
            OWNER,
            &json!({"name": "Demo", "storeUrl": "not a url", "apiToken": "t"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "storeUrl must be an http(s) URL"}));

    let (status, _) = ctx
        .post_json(
            "/tenants",
            OWNER,
            &json!({"name": " ", "storeUrl": "https://demo.myshopify.com", "apiToken": "t"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rejects_bad_tokens() {
    let ctx = TestContext::new().await;

    let request = Request::get("/tenants")
        .header(header::AUTHORIZATION, "Bearer not.a.jwt")
        .body(Body::empty())
        .expect("request");
    let (status, body) = ctx.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Invalid token"}));

    let request = Request::get("/tenants")
        .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .expect("request");
    let (status, _) = ctx.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
