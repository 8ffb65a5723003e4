mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use common::{get, request, TestApp, USER_ID};

fn strategy_request(business_name: &str) -> Value {
    json!({
        "businessName": business_name,
        "industry": "coffee",
        "targetAudience": "commuters",
        "goals": ["awareness", "loyalty"],
    })
}

#[tokio::test]
async fn strategy_with_missing_fields_is_400() {
    let app = TestApp::with_agent_service(common::spawn_agent_service().await).await;
    let token = app.user_token();

    let (status, body) = app
        .send(request(
            Method::POST,
            "/api/ai/strategy",
            Some(&token),
            Some(json!({ "businessName": "Bean There", "industry": "" })),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["missingFields"], json!(["industry", "targetAudience", "goals"]));
}

#[tokio::test]
async fn strategy_is_created_for_the_caller() {
    let app = TestApp::with_agent_service(common::spawn_agent_service().await).await;
    let token = app.user_token();

    let (status, body) = app
        .send(request(Method::POST, "/api/ai/strategy", Some(&token), Some(strategy_request("Bean There"))))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["userId"], USER_ID);
}

#[tokio::test]
async fn client_supplied_user_id_is_overwritten() {
    let app = TestApp::with_agent_service(common::spawn_agent_service().await).await;
    let token = app.user_token();
    let mut payload = strategy_request("Bean There");
    payload["userId"] = json!("someone-else");

    let (_, body) = app
        .send(request(Method::POST, "/api/ai/strategy", Some(&token), Some(payload)))
        .await;

    assert_eq!(body["data"]["userId"], USER_ID);
}

#[tokio::test]
async fn agent_failure_is_tagged_with_agent_name() {
    let app = TestApp::with_agent_service(common::spawn_agent_service().await).await;
    let token = app.user_token();

    let (status, body) = app
        .send(request(Method::POST, "/api/ai/strategy", Some(&token), Some(strategy_request("explode"))))
        .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Agent Error");
    assert_eq!(body["details"]["type"], "agent_error");
    assert_eq!(body["agentName"], "strategy-agent");
    assert_eq!(body["details"]["agentName"], "strategy-agent");
    assert_eq!(body["message"], "boom");
}

#[tokio::test]
async fn upstream_quota_keeps_429_inside_agent_error() {
    let app = TestApp::with_agent_service(common::spawn_agent_service().await).await;
    let token = app.user_token();

    let (status, body) = app
        .send(request(Method::POST, "/api/ai/strategy", Some(&token), Some(strategy_request("busy"))))
        .await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["details"]["type"], "agent_error");
}

#[tokio::test]
async fn workflow_step_runs_for_the_caller() {
    let app = TestApp::with_agent_service(common::spawn_agent_service().await).await;
    let token = app.user_token();

    let (status, body) = app
        .send(request(
            Method::POST,
            "/api/ai/workflows/wf-42/steps/draft",
            Some(&token),
            Some(json!({ "topic": "spring menu" })),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["workflowId"], "wf-42");
    assert_eq!(body["data"]["step"], "draft");
    assert_eq!(body["data"]["userId"], USER_ID);
    assert_eq!(body["data"]["output"]["topic"], "spring menu");
}

#[tokio::test]
async fn workflow_failure_names_workflow_and_step() {
    let app = TestApp::with_agent_service(common::spawn_agent_service().await).await;
    let token = app.user_token();

    let (status, body) = app
        .send(request(
            Method::POST,
            "/api/ai/workflows/wf-42/steps/publish",
            Some(&token),
            Some(json!({ "topic": "spring menu" })),
        ))
        .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["details"]["type"], "workflow_error");
    assert_eq!(body["workflowId"], "wf-42");
    assert_eq!(body["step"], "publish");
    assert_eq!(body["message"], "publish target rejected the post");
}

#[tokio::test]
async fn broken_agent_service_is_external_service_error() {
    let app = TestApp::with_agent_service(common::spawn_broken_agent_service().await).await;
    let token = app.user_token();

    let (status, body) = app.send(get("/api/ai/agents", Some(&token))).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["details"]["type"], "external_service_error");
    assert_eq!(body["message"], "AI service is temporarily unavailable");
    // Upstream detail stays in the logs
    assert!(!body["message"].as_str().unwrap().contains("crashed"));
}

#[tokio::test]
async fn unreachable_agent_service_is_network_error() {
    let app = TestApp::new().await;
    let token = app.user_token();

    let (status, body) = app.send(get("/api/ai/agents", Some(&token))).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["details"]["type"], "network_error");
    assert_eq!(body["details"]["recoverable"], true);
}

#[tokio::test]
async fn workflow_ids_cannot_reroute_the_upstream_call() {
    let app = TestApp::with_agent_service(common::spawn_agent_service().await).await;
    let token = app.user_token();

    let (status, body) = app
        .send(request(
            Method::POST,
            "/api/ai/workflows/x/steps/..%2F..%2F..%2Fagents%2Fstrategy%2Fgenerate",
            Some(&token),
            Some(json!({})),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["details"]["type"], "database_error");
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn empty_strategy_body_lists_every_missing_field() {
    let app = TestApp::with_agent_service(common::spawn_agent_service().await).await;
    let token = app.user_token();

    let (status, body) = app
        .send(request(Method::POST, "/api/ai/strategy", Some(&token), None))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["missingFields"],
        json!(["businessName", "industry", "targetAudience", "goals"])
    );
}

#[tokio::test]
async fn malformed_strategy_body_is_classified() {
    let app = TestApp::with_agent_service(common::spawn_agent_service().await).await;
    let token = app.user_token();
    let malformed = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/ai/strategy")
        .header(axum::http::header::AUTHORIZATION, format!("Bearer {}", token))
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from("{\"businessName\": "))
        .unwrap();

    let (status, body) = app.send(malformed).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["type"], "database_error");
    assert_eq!(body["message"], "Invalid data provided");
}
