// handlers/ai/mod.rs - AI agent routes (JWT + per-user AI quota)
//
// Thin pass-through to the external agent service. Failures are tagged with
// the agent or workflow they came from before reaching the classifier.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Extension,
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::failure::{Failure, FailureContext};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};

pub const STRATEGY_AGENT: &str = "strategy-agent";

const STRATEGY_REQUIRED_FIELDS: &[&str] = &["businessName", "industry", "targetAudience", "goals"];

/// Either a request rejected up front or a failure for the classifier
#[derive(Debug)]
pub enum AiError {
    Invalid(ApiError),
    Failed(Failure),
}

impl From<ApiError> for AiError {
    fn from(err: ApiError) -> Self {
        AiError::Invalid(err)
    }
}

impl From<Failure> for AiError {
    fn from(err: Failure) -> Self {
        AiError::Failed(err)
    }
}

impl IntoResponse for AiError {
    fn into_response(self) -> Response {
        match self {
            AiError::Invalid(err) => err.into_response(),
            AiError::Failed(err) => err.into_response(),
        }
    }
}

/// Names of required fields that are absent, null or blank
pub fn missing_fields(body: &Value, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|field| match body.get(**field) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(_) => false,
        })
        .map(|field| field.to_string())
        .collect()
}

/// Ids forwarded to the agent service must stay a single path segment
fn path_segment(name: &str, value: &str) -> Result<(), Failure> {
    if value.is_empty() || value == "." || value == ".." || value.contains(['/', '\\']) {
        return Err(Failure::validation(format!("{} '{}' is not a valid identifier", name, value)));
    }
    Ok(())
}

/// GET /api/ai/agents
pub async fn agents_get(State(state): State<AppState>) -> ApiResult<Value> {
    Ok(ApiResponse::success(state.agents.list_agents().await?))
}

/// POST /api/ai/strategy
pub async fn strategy_post(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    JsonBody(mut body): JsonBody<Value>,
) -> Result<ApiResponse<Value>, AiError> {
    let missing = missing_fields(&body, STRATEGY_REQUIRED_FIELDS);
    if !missing.is_empty() {
        return Err(ApiError::missing_fields(missing).into());
    }

    body["userId"] = json!(caller.user_id);
    let strategy = state
        .agents
        .generate_strategy(&body)
        .await
        .agent_context(STRATEGY_AGENT)?;

    tracing::info!(user = %caller.user_id, agent = STRATEGY_AGENT, "strategy generated");
    Ok(ApiResponse::created(strategy))
}

/// POST /api/ai/workflows/:workflow_id/steps/:step
pub async fn workflow_step_post(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path((workflow_id, step)): Path<(String, String)>,
    JsonBody(input): JsonBody<Value>,
) -> ApiResult<Value> {
    path_segment("workflowId", &workflow_id)?;
    path_segment("step", &step)?;

    let payload = json!({
        "userId": caller.user_id,
        "input": input,
    });

    let result = state
        .agents
        .run_workflow_step(&workflow_id, &step, &payload)
        .await
        .workflow_context(&workflow_id, &step)?;

    Ok(ApiResponse::success(result))
}
