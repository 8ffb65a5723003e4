#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::Path,
    http::{header, Method, Request, StatusCode},
    routing::post,
    Json, Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use social_admin_api::{
    agent::AgentClient,
    app,
    auth::{generate_jwt, Claims},
    config::{AppConfig, Environment},
    limiter::ManualClock,
    store::{MemoryStore, Role, Store, User},
    AppState,
};

pub const ADMIN_ID: &str = "admin-1";
pub const USER_ID: &str = "user-1";

pub struct TestApp {
    pub router: Router,
    pub clock: ManualClock,
    pub store: Arc<MemoryStore>,
    pub config: Arc<AppConfig>,
}

impl TestApp {
    /// Development config, agent service pointed at a closed port
    pub async fn new() -> Self {
        Self::with_config(test_config(Environment::Development)).await
    }

    pub async fn with_agent_service(agent_url: String) -> Self {
        let mut config = test_config(Environment::Development);
        config.agent.base_url = agent_url;
        Self::with_config(config).await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::with_users([
            User::new(ADMIN_ID, "admin@example.com", "Admin", Role::Admin),
            User::new(USER_ID, "user@example.com", "User", Role::User),
        ]));
        store.connect().await.expect("memory store connects");

        let agents = AgentClient::new(&config.agent).expect("agent client builds");
        let clock = ManualClock::new();
        let config = Arc::new(config);
        let state = AppState::with_clock(config.clone(), store.clone(), Arc::new(agents), Arc::new(clock.clone()));

        Self {
            router: app(state),
            clock,
            store,
            config,
        }
    }

    pub fn token(&self, subject: &str, role: &str) -> String {
        generate_jwt(&Claims::new(subject, role, 1), &self.config.security.jwt_secret).expect("token signs")
    }

    pub fn admin_token(&self) -> String {
        self.token(ADMIN_ID, "admin")
    }

    pub fn user_token(&self) -> String {
        self.token(USER_ID, "user")
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.expect("router is infallible");
        let status = response.status();
        let bytes = response.into_body().collect().await.expect("body reads").to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response body is JSON")
        };
        (status, body)
    }
}

pub fn test_config(environment: Environment) -> AppConfig {
    let mut config = AppConfig::for_environment(environment);
    config.security.jwt_secret = "integration-test-secret".to_string();
    config.security.jwt_leeway_secs = 0;
    config.server.enable_request_logging = false;
    config.agent.base_url = closed_port_url();
    config.agent.timeout_secs = 5;
    config
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    request(Method::GET, uri, token, None)
}

fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{}", addr)
}

/// Fake agent service.
///
/// * `GET /agents` lists agents
/// * `POST /agents/strategy/generate` echoes the caller, except
///   `businessName: "explode"` (502) and `"busy"` (429)
/// * `POST /workflows/:id/steps/:step` succeeds except for step `publish` (500)
pub async fn spawn_agent_service() -> String {
    let router = Router::new()
        .route("/agents", axum::routing::get(|| async { Json(json!({ "agents": ["strategy-agent", "content-agent"] })) }))
        .route("/agents/strategy/generate", post(generate_strategy))
        .route("/workflows/:workflow_id/steps/:step", post(run_step));

    serve(router).await
}

/// Agent service that fails every call with 500
pub async fn spawn_broken_agent_service() -> String {
    let router = Router::new().fallback(|| async {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "model backend crashed" })))
    });

    serve(router).await
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind fake agent service");
    let addr: SocketAddr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("fake agent service runs");
    });
    format!("http://{}", addr)
}

async fn generate_strategy(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    match body["businessName"].as_str() {
        Some("explode") => (StatusCode::BAD_GATEWAY, Json(json!({ "message": "boom" }))),
        Some("busy") => (StatusCode::TOO_MANY_REQUESTS, Json(json!({ "message": "slow down" }))),
        _ => (
            StatusCode::OK,
            Json(json!({
                "strategy": { "pillars": ["education", "community"] },
                "userId": body["userId"],
            })),
        ),
    }
}

async fn run_step(Path((workflow_id, step)): Path<(String, String)>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if step == "publish" {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "publish target rejected the post" })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "workflowId": workflow_id,
            "step": step,
            "userId": body["userId"],
            "output": body["input"],
        })),
    )
}
