// Failures raised by route handlers and the operations they call.
//
// Each failure is tagged with its kind where it is raised; the classifier in
// `classify` turns it into a status code and response envelope. Conversions
// from lower-level errors pick the variant once, at the boundary.

use thiserror::Error;

use crate::auth::{AuthFailure, JwtError};
use crate::store::StoreError;

pub mod classify;

pub use classify::{classify, ClassifiedError, ErrorKind};

#[derive(Debug, Clone, Error)]
pub enum Failure {
    /// The external AI-agent service answered with an error or garbage
    #[error("{service} request failed: {message}")]
    UpstreamService {
        service: String,
        message: String,
        status: Option<u16>,
    },

    #[error("agent '{agent_name}' failed: {message}")]
    Agent {
        agent_name: String,
        message: String,
        status: Option<u16>,
    },

    #[error("workflow '{workflow_id}' failed at step '{step}': {message}")]
    Workflow {
        workflow_id: String,
        step: String,
        message: String,
        status: Option<u16>,
    },

    /// Persistence or input validation failure; never shown verbatim to clients
    #[error("persistence failure: {message}")]
    Persistence { message: String },

    #[error("credential failure: {message}")]
    Credential { message: String },

    #[error("quota exceeded: {message}")]
    RateLimited { message: String },

    /// Connection refused or timed out
    #[error("network failure: {message}")]
    Network { message: String },

    #[error("{message}")]
    Unclassified { message: String, status: Option<u16> },
}

impl Failure {
    pub fn validation(message: impl Into<String>) -> Self {
        Failure::Persistence { message: message.into() }
    }

    pub fn unclassified(message: impl Into<String>) -> Self {
        Failure::Unclassified {
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(message: impl Into<String>, status: u16) -> Self {
        Failure::Unclassified {
            message: message.into(),
            status: Some(status),
        }
    }

    /// Error name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Failure::UpstreamService { .. } => "UpstreamServiceFailure",
            Failure::Agent { .. } => "AgentFailure",
            Failure::Workflow { .. } => "WorkflowFailure",
            Failure::Persistence { .. } => "PersistenceFailure",
            Failure::Credential { .. } => "CredentialFailure",
            Failure::RateLimited { .. } => "RateLimitExceeded",
            Failure::Network { .. } => "NetworkFailure",
            Failure::Unclassified { .. } => "UnclassifiedFailure",
        }
    }

    /// The raw message, without the kind prefix of `Display`
    pub fn message(&self) -> &str {
        match self {
            Failure::UpstreamService { message, .. }
            | Failure::Agent { message, .. }
            | Failure::Workflow { message, .. }
            | Failure::Persistence { message }
            | Failure::Credential { message }
            | Failure::RateLimited { message }
            | Failure::Network { message }
            | Failure::Unclassified { message, .. } => message,
        }
    }

    /// HTTP status this failure is answered with
    pub fn status_code(&self) -> u16 {
        match self {
            Failure::UpstreamService { .. } => 503,
            Failure::Agent { status, .. }
            | Failure::Workflow { status, .. }
            | Failure::Unclassified { status, .. } => status.unwrap_or(500),
            Failure::Persistence { .. } => 400,
            Failure::Credential { .. } => 401,
            Failure::RateLimited { .. } => 429,
            Failure::Network { .. } => 503,
        }
    }
}

impl From<StoreError> for Failure {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(message) => Failure::Persistence { message },
            StoreError::Unavailable(message) => Failure::Network { message },
            StoreError::NotFound(what) => Failure::with_status(format!("{} not found", what), 404),
        }
    }
}

impl From<AuthFailure> for Failure {
    fn from(err: AuthFailure) -> Self {
        Failure::Credential { message: err.to_string() }
    }
}

impl From<JwtError> for Failure {
    fn from(err: JwtError) -> Self {
        Failure::Credential { message: err.to_string() }
    }
}

/// Tag failures from AI operations with the agent or workflow they came from.
///
/// The tagged failure keeps the inner message and the status the inner failure
/// would have been answered with (`status_code`), not the upstream's raw status:
/// an upstream 502 is reported as 503, an upstream 429 stays 429.
///
/// ```ignore
/// let plan = agents.generate_strategy(&input).await.agent_context("strategy-agent")?;
/// ```
pub trait FailureContext<T> {
    fn agent_context(self, agent_name: &str) -> Result<T, Failure>;
    fn workflow_context(self, workflow_id: &str, step: &str) -> Result<T, Failure>;
}

impl<T, E> FailureContext<T> for Result<T, E>
where
    E: Into<Failure>,
{
    fn agent_context(self, agent_name: &str) -> Result<T, Failure> {
        self.map_err(|err| {
            let err = err.into();
            Failure::Agent {
                agent_name: agent_name.to_string(),
                message: err.message().to_string(),
                status: Some(err.status_code()),
            }
        })
    }

    fn workflow_context(self, workflow_id: &str, step: &str) -> Result<T, Failure> {
        self.map_err(|err| {
            let err = err.into();
            Failure::Workflow {
                workflow_id: workflow_id.to_string(),
                step: step.to_string(),
                message: err.message().to_string(),
                status: Some(err.status_code()),
            }
        })
    }
}
