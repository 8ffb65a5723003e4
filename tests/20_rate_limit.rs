mod common;

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::json;

use common::{get, request, test_config, TestApp};
use social_admin_api::config::{Environment, RateLimitConfig};

fn from_ip(uri: &str, ip: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri).header("x-forwarded-for", ip);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn security_group_admits_50_then_rejects_51st() {
    let app = TestApp::new().await;
    let token = app.admin_token();

    for i in 0..50 {
        let (status, _) = app.send(get("/api/admin/security/users", Some(&token))).await;
        assert_eq!(status, StatusCode::OK, "request {} should pass", i + 1);
    }

    let (status, body) = app.send(get("/api/admin/security/users", Some(&token))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Too many requests from this IP, please try again later.");
}

#[tokio::test]
async fn window_reopens_after_fifteen_minutes() {
    let app = TestApp::new().await;
    let token = app.admin_token();

    for _ in 0..50 {
        app.send(get("/api/admin/security/users", Some(&token))).await;
    }
    let (status, _) = app.send(get("/api/admin/security/users", Some(&token))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    app.clock.advance(Duration::from_secs(14 * 60));
    let (status, _) = app.send(get("/api/admin/security/users", Some(&token))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    app.clock.advance(Duration::from_secs(60));
    let (status, _) = app.send(get("/api/admin/security/users", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn route_groups_have_independent_quotas() {
    let app = TestApp::new().await;
    let token = app.admin_token();

    for _ in 0..50 {
        app.send(get("/api/admin/security/users", Some(&token))).await;
    }
    let (status, _) = app.send(get("/api/admin/security/users", Some(&token))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    // Settings group has its own 100-request budget
    for i in 0..100 {
        let (status, _) = app.send(get("/api/admin/settings", Some(&token))).await;
        assert_eq!(status, StatusCode::OK, "settings request {}", i + 1);
    }
    let (status, _) = app.send(get("/api/admin/settings", Some(&token))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn client_addresses_are_counted_separately() {
    let app = TestApp::new().await;
    let token = app.admin_token();

    for _ in 0..50 {
        app.send(from_ip("/api/admin/security/users", "198.51.100.1", Some(&token))).await;
    }
    let (status, _) = app.send(from_ip("/api/admin/security/users", "198.51.100.1", Some(&token))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    let (status, _) = app.send(from_ip("/api/admin/security/users", "198.51.100.2", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn limiter_runs_before_token_verification() {
    let app = TestApp::new().await;

    for _ in 0..50 {
        let (status, _) = app.send(get("/api/admin/security/users", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    // Even a valid admin is now limited: unauthenticated attempts consumed the budget
    let token = app.admin_token();
    let (status, _) = app.send(get("/api/admin/security/users", Some(&token))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn ai_quota_is_per_user_with_retry_after() {
    let agent_url = common::spawn_agent_service().await;
    let mut config = test_config(Environment::Development);
    config.agent.base_url = agent_url;
    config.rate_limit.ai_per_user = RateLimitConfig::new(2, 3600);
    let app = TestApp::with_config(config).await;

    let alice = app.token("alice", "user");
    let bob = app.token("bob", "user");
    let body = json!({ "input": { "topic": "launch" } });

    for _ in 0..2 {
        let (status, _) = app
            .send(request(Method::POST, "/api/ai/workflows/wf-1/steps/draft", Some(&alice), Some(body.clone())))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    app.clock.advance(Duration::from_secs(600));
    let (status, limited) = app
        .send(request(Method::POST, "/api/ai/workflows/wf-1/steps/draft", Some(&alice), Some(body.clone())))
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited["retryAfter"], 3000);

    // Same address, different user: the per-user budget is separate
    let (status, _) = app
        .send(request(Method::POST, "/api/ai/workflows/wf-1/steps/draft", Some(&bob), Some(body)))
        .await;
    assert_eq!(status, StatusCode::OK);
}
