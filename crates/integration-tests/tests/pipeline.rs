//! End-to-end tests for the gateway pipeline over real HTTP.

#![allow(clippy::unwrap_used)]

use axum::{Json, Router, http::StatusCode as AxumStatus, routing::post};
use proshop_core::{ErrorEnvelope, ResourceGroup};
use proshop_integration_tests::{
    ENTRY_DOCUMENT, TEST_ORIGIN, TEST_PAYPAL_CLIENT_ID, TestServer,
};
use proshop_storefront::HandlerGroups;
use proshop_storefront::error::AppError;
use proshop_storefront::middleware::RequestContext;
use reqwest::{
    Method, StatusCode,
    header::{
        ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL,
        CONTENT_TYPE, SERVER,
    },
};
use serde_json::{Value, json};

const API_CACHE_CONTROL: &str = "no-store, no-cache, must-revalidate, private";
const UPLOADS_CACHE_CONTROL: &str = "no-store, no-cache, must-revalidate, proxy-revalidate";

/// A users group that echoes what the pipeline decoded.
fn users() -> HandlerGroups {
    let router = Router::new()
        .route(
            "/login",
            post(|context: RequestContext| async move {
                Json(json!({
                    "body": context.body.value().cloned(),
                    "jwt": context.cookies.get("jwt"),
                }))
            }),
        )
        .route(
            "/profile",
            post(|| async {
                Err::<(), _>(AppError::handler(
                    AxumStatus::UNAUTHORIZED,
                    "Not authorized, no token",
                ))
            }),
        );
    HandlerGroups::detached().with(ResourceGroup::Users, router)
}

fn cache_directives(response: &reqwest::Response) -> Vec<String> {
    response
        .headers()
        .get_all(CACHE_CONTROL)
        .iter()
        .map(|v| v.to_str().expect("non-ascii cache-control").to_string())
        .collect()
}

// ============================================================================
// Header, origin and cache policies
// ============================================================================

#[tokio::test]
async fn test_no_server_identity_headers() {
    let server = TestServer::start("production", users()).await;
    for path in ["/api/config/paypal", "/product/42", "/api/missing", "/health"] {
        let response = server.get(path).await;
        assert!(response.headers().get(SERVER).is_none(), "{path}");
        assert!(response.headers().get("x-powered-by").is_none(), "{path}");
        assert_eq!(
            response.headers().get("referrer-policy").unwrap(),
            "no-referrer"
        );
    }
}

#[tokio::test]
async fn test_csp_allows_payment_origin() {
    let server = TestServer::start("development", HandlerGroups::detached()).await;
    let response = server.get("/").await;
    let csp = response
        .headers()
        .get("content-security-policy")
        .expect("missing CSP")
        .to_str()
        .unwrap();
    assert!(csp.contains("script-src 'self' 'unsafe-inline' 'unsafe-eval' *.paypal.com"));
    assert!(csp.contains("frame-src 'self' *.paypal.com"));
}

#[tokio::test]
async fn test_cors_for_configured_origin_only() {
    let server = TestServer::start("development", HandlerGroups::detached()).await;

    let allowed = server
        .client()
        .get(server.url("/api/config/paypal"))
        .header("origin", TEST_ORIGIN)
        .send()
        .await
        .unwrap();
    assert_eq!(
        allowed.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        TEST_ORIGIN
    );
    assert_eq!(
        allowed
            .headers()
            .get(ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .unwrap(),
        "true"
    );

    let other = server
        .client()
        .get(server.url("/api/config/paypal"))
        .header("origin", "https://evil.example")
        .send()
        .await
        .unwrap();
    assert_eq!(other.status(), StatusCode::OK);
    assert_ne!(
        other
            .headers()
            .get(ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|v| v.to_str().unwrap()),
        Some("https://evil.example")
    );
}

#[tokio::test]
async fn test_preflight_is_answered() {
    let server = TestServer::start("production", users()).await;
    let response = server
        .client()
        .request(Method::OPTIONS, server.url("/api/users/login"))
        .header("origin", TEST_ORIGIN)
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-headers")
            .unwrap(),
        "content-type"
    );
    assert!(response.headers().get(SERVER).is_none());
}

#[tokio::test]
async fn test_api_cache_directive() {
    let server = TestServer::start("development", users()).await;
    for path in ["/api/config/paypal", "/api/products", "/api/users/nowhere"] {
        let response = server.get(path).await;
        assert_eq!(cache_directives(&response), vec![API_CACHE_CONTROL], "{path}");
    }
}

// ============================================================================
// Static delivery and fallback
// ============================================================================

#[tokio::test]
async fn test_uploads() {
    let server = TestServer::start("production", HandlerGroups::detached()).await;
    std::fs::write(server.uploads_dir().join("image-1700000000.png"), b"png").unwrap();

    let response = server.get("/uploads/image-1700000000.png").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(cache_directives(&response), vec![UPLOADS_CACHE_CONTROL]);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.bytes().await.unwrap().as_ref(), b"png");

    let missing = server.get("/uploads/image-0.png").await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let envelope: ErrorEnvelope = missing.json().await.unwrap();
    assert_eq!(envelope.message, "Not Found - /uploads/image-0.png");
}

#[tokio::test]
async fn test_production_spa_fallback() {
    let server = TestServer::start("production", HandlerGroups::detached()).await;

    let response = server.get("/any/unmatched/path").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), ENTRY_DOCUMENT);

    let bundle = server.get("/static/js/main.js").await;
    assert_eq!(bundle.status(), StatusCode::OK);
    assert_eq!(bundle.text().await.unwrap(), "console.log('proshop')");
}

#[tokio::test]
async fn test_production_unknown_api_path_gets_entry_document() {
    let server = TestServer::start("production", HandlerGroups::detached()).await;
    let response = server.get("/api/nothing").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(cache_directives(&response), vec![API_CACHE_CONTROL]);
    assert_eq!(response.text().await.unwrap(), ENTRY_DOCUMENT);
}

#[tokio::test]
async fn test_development_liveness() {
    let server = TestServer::start("development", HandlerGroups::detached()).await;

    let response = server.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "API is running....");

    let missing = server.get("/nonexistent").await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let envelope: ErrorEnvelope = missing.json().await.unwrap();
    assert_eq!(envelope.message, "Not Found - /nonexistent");
    assert!(envelope.stack.is_none());
}

// ============================================================================
// Dispatch, body decoding and error boundary
// ============================================================================

#[tokio::test]
async fn test_paypal_config() {
    let server = TestServer::start("production", HandlerGroups::detached()).await;
    let response = server.get("/api/config/paypal").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"clientId": TEST_PAYPAL_CLIENT_ID}));
}

#[tokio::test]
async fn test_json_form_and_cookies_reach_group() {
    let server = TestServer::start("development", users()).await;
    let response = server
        .client()
        .post(server.url("/api/users/login"))
        .header("cookie", "jwt=abc%20123")
        .json(&json!({"email": "admin@example.com", "password": "123456"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["body"]["email"], "admin@example.com");
    assert_eq!(body["jwt"], "abc 123");

    let response = server
        .client()
        .post(server.url("/api/users/login"))
        .form(&[("user[name]", "Jane"), ("tags[]", "new"), ("tags[]", "vip")])
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["body"],
        json!({"user": {"name": "Jane"}, "tags": ["new", "vip"]})
    );
}

#[tokio::test]
async fn test_malformed_json_by_mode() {
    let development = TestServer::start("development", users()).await;
    let response = development
        .client()
        .post(development.url("/api/users/login"))
        .header(CONTENT_TYPE, "application/json")
        .body("{\"email\":")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let envelope: ErrorEnvelope = response.json().await.unwrap();
    assert!(!envelope.stack.expect("stack in development").is_empty());

    let production = TestServer::start("production", users()).await;
    let response = production
        .client()
        .post(production.url("/api/users/login"))
        .header(CONTENT_TYPE, "application/json")
        .body("{\"email\":")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let envelope: ErrorEnvelope = response.json().await.unwrap();
    assert_eq!(envelope.message, "Server Error");
    assert!(envelope.stack.is_none());
}

#[tokio::test]
async fn test_handler_failure_keeps_status_and_message() {
    let server = TestServer::start("production", users()).await;
    let response = server
        .client()
        .post(server.url("/api/users/profile"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(cache_directives(&response), vec![API_CACHE_CONTROL]);
    let envelope: ErrorEnvelope = response.json().await.unwrap();
    assert_eq!(envelope.message, "Not authorized, no token");
    assert!(envelope.stack.is_none());
}

#[tokio::test]
async fn test_detached_groups_answer_unavailable() {
    let server = TestServer::start("production", HandlerGroups::detached()).await;
    let response = server.get("/api/products/64f0c2").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let envelope: ErrorEnvelope = response.json().await.unwrap();
    assert_eq!(envelope.message, "products service unavailable");
}

#[tokio::test]
async fn test_unsupported_method_gets_not_found_envelope() {
    let server = TestServer::start("production", users()).await;

    let response = server
        .client()
        .post(server.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let envelope: ErrorEnvelope = response.json().await.unwrap();
    assert_eq!(envelope.message, "Not Found - /health");

    let response = server.get("/api/users/login").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(cache_directives(&response), vec![API_CACHE_CONTROL]);
    let envelope: ErrorEnvelope = response.json().await.unwrap();
    assert_eq!(envelope.message, "Not Found - /api/users/login");
}
