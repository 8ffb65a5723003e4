use axum::http::StatusCode;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};

use super::Failure;
use crate::config::Environment;

const GENERIC_MESSAGE: &str = "An unexpected error occurred";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ExternalServiceError,
    AgentError,
    WorkflowError,
    DatabaseError,
    AuthError,
    RateLimitError,
    NetworkError,
    UnknownError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ExternalServiceError => "external_service_error",
            ErrorKind::AgentError => "agent_error",
            ErrorKind::WorkflowError => "workflow_error",
            ErrorKind::DatabaseError => "database_error",
            ErrorKind::AuthError => "auth_error",
            ErrorKind::RateLimitError => "rate_limit_error",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::UnknownError => "unknown_error",
        }
    }

    /// Category label for the envelope's `error` field
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::ExternalServiceError => "External Service Error",
            ErrorKind::AgentError => "Agent Error",
            ErrorKind::WorkflowError => "Workflow Error",
            ErrorKind::DatabaseError => "Database Error",
            ErrorKind::AuthError => "Authentication Error",
            ErrorKind::RateLimitError => "Rate Limit Exceeded",
            ErrorKind::NetworkError => "Network Error",
            ErrorKind::UnknownError => "Internal Server Error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub status: StatusCode,
    pub message: String,
    /// Extra identifiers (`agentName`, `workflowId`, `step`)
    pub context: Map<String, Value>,
    pub recoverable: bool,
    pub suggested_action: &'static str,
    pub stack: Option<String>,
}

pub fn classify(failure: &Failure, environment: Environment) -> ClassifiedError {
    let production = environment.is_production();
    let mut context = Map::new();

    let (kind, message, recoverable, suggested_action) = match failure {
        Failure::UpstreamService { .. } => (
            ErrorKind::ExternalServiceError,
            "AI service is temporarily unavailable".to_string(),
            true,
            "Please try again in a few moments",
        ),
        Failure::Agent { agent_name, message, .. } => {
            context.insert("agentName".to_string(), json!(agent_name));
            (
                ErrorKind::AgentError,
                message.clone(),
                true,
                "Retry the request or contact support if the problem persists",
            )
        }
        Failure::Workflow { workflow_id, step, message, .. } => {
            context.insert("workflowId".to_string(), json!(workflow_id));
            context.insert("step".to_string(), json!(step));
            (
                ErrorKind::WorkflowError,
                message.clone(),
                true,
                "Retry the workflow from the failed step",
            )
        }
        Failure::Persistence { .. } => (
            ErrorKind::DatabaseError,
            "Invalid data provided".to_string(),
            true,
            "Check the submitted data and try again",
        ),
        Failure::Credential { .. } => (
            ErrorKind::AuthError,
            "Authentication failed".to_string(),
            true,
            "Please log in again",
        ),
        Failure::RateLimited { .. } => (
            ErrorKind::RateLimitError,
            "Too many requests, please slow down".to_string(),
            true,
            "Wait a few minutes before making more requests",
        ),
        Failure::Network { .. } => (
            ErrorKind::NetworkError,
            "Network connectivity issue".to_string(),
            true,
            "Check your connection and try again",
        ),
        Failure::Unclassified { message, .. } => (
            ErrorKind::UnknownError,
            if production { GENERIC_MESSAGE.to_string() } else { message.clone() },
            false,
            "Contact support if the problem persists",
        ),
    };

    let status = StatusCode::from_u16(failure.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let stack = (!production).then(|| format!("{failure:#?}"));

    ClassifiedError {
        kind,
        status,
        message,
        context,
        recoverable,
        suggested_action,
        stack,
    }
}

impl ClassifiedError {
    pub fn to_json(&self, timestamp: DateTime<Utc>) -> Value {
        let mut details = Map::new();
        details.insert("type".to_string(), json!(self.kind));
        details.insert("recoverable".to_string(), json!(self.recoverable));
        details.insert("suggestedAction".to_string(), json!(self.suggested_action));
        details.extend(self.context.clone());

        let mut body = Map::new();
        body.insert("success".to_string(), json!(false));
        body.insert("error".to_string(), json!(self.kind.label()));
        body.insert("message".to_string(), json!(self.message));
        body.extend(self.context.clone());
        body.insert("details".to_string(), Value::Object(details));
        body.insert(
            "timestamp".to_string(),
            json!(timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        if let Some(stack) = &self.stack {
            body.insert("stack".to_string(), json!(stack));
        }

        Value::Object(body)
    }
}
