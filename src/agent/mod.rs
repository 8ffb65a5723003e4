//! HTTP client for the external AI-agent service.
//!
//! Constructed once at startup and shared through `AppState`. Every error is
//! turned into a [`Failure`] here so handlers only tag context:
//!
//! * connection refused / timed out -> `Failure::Network`
//! * upstream answered 429 -> `Failure::RateLimited`
//! * any other non-2xx answer or undecodable body -> `Failure::UpstreamService`

use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::AgentConfig;
use crate::failure::Failure;

pub const AGENT_SERVICE: &str = "ai-agents";

#[derive(Debug, Error)]
pub enum AgentClientError {
    #[error("invalid agent service URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
    #[error("agent service URL '{0}' cannot carry a path")]
    NotABase(String),
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct AgentClient {
    http: reqwest::Client,
    base_url: Url,
}

impl AgentClient {
    pub fn new(config: &AgentConfig) -> Result<Self, AgentClientError> {
        let base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(AgentClientError::NotABase(config.base_url.clone()));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Base URL plus `segments`, each percent-encoded as a single path segment
    /// (`/` becomes `%2F`), so caller-supplied ids never change the route.
    pub fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// GET /agents
    pub async fn list_agents(&self) -> Result<Value, Failure> {
        let response = self
            .http
            .get(self.endpoint(["agents"]))
            .send()
            .await
            .map_err(transport_failure)?;
        decode(response).await
    }

    /// POST /agents/strategy/generate
    pub async fn generate_strategy(&self, input: &Value) -> Result<Value, Failure> {
        self.post(self.endpoint(["agents", "strategy", "generate"]), input)
            .await
    }

    /// POST /workflows/:workflow_id/steps/:step
    pub async fn run_workflow_step(&self, workflow_id: &str, step: &str, input: &Value) -> Result<Value, Failure> {
        self.post(self.endpoint(["workflows", workflow_id, "steps", step]), input)
            .await
    }

    async fn post(&self, url: Url, body: &Value) -> Result<Value, Failure> {
        tracing::debug!(path = url.path(), "calling agent service");
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(transport_failure)?;
        decode(response).await
    }
}

async fn decode(response: reqwest::Response) -> Result<Value, Failure> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(Failure::RateLimited {
            message: format!("{} rejected the request with 429", AGENT_SERVICE),
        });
    }

    if !status.is_success() {
        let detail = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| {
                body.get("message")
                    .or_else(|| body.get("error"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| status.to_string());

        return Err(Failure::UpstreamService {
            service: AGENT_SERVICE.to_string(),
            message: detail,
            status: Some(status.as_u16()),
        });
    }

    response.json::<Value>().await.map_err(|e| Failure::UpstreamService {
        service: AGENT_SERVICE.to_string(),
        message: format!("invalid response body: {}", e),
        status: Some(status.as_u16()),
    })
}

fn transport_failure(err: reqwest::Error) -> Failure {
    if err.is_connect() || err.is_timeout() {
        Failure::Network {
            message: format!("{}: {}", AGENT_SERVICE, err),
        }
    } else {
        Failure::UpstreamService {
            service: AGENT_SERVICE.to_string(),
            message: err.to_string(),
            status: err.status().map(|s| s.as_u16()),
        }
    }
}
