use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;

use super::auth::AuthUser;
use crate::config::AppConfig;
use crate::failure::{classify, Failure};

/// Failure carried on a response until the classifier middleware renders it
#[derive(Clone, Debug)]
pub struct FailureReport(pub Arc<Failure>);

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = status.into_response();
        response.extensions_mut().insert(FailureReport(Arc::new(self)));
        response
    }
}

/// Error-handling hook: classifies, logs and renders any failure a handler returned.
pub async fn error_classifier_middleware(
    State(config): State<Arc<AppConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let caller = request.extensions().get::<AuthUser>().map(|user| user.user_id.clone());

    let mut response = next.run(request).await;
    let Some(FailureReport(failure)) = response.extensions_mut().remove::<FailureReport>() else {
        return response;
    };

    let classified = classify(&failure, config.environment);
    let now = Utc::now();

    let (agent_name, workflow_id, step) = match failure.as_ref() {
        Failure::Agent { agent_name, .. } => (Some(agent_name.as_str()), None, None),
        Failure::Workflow { workflow_id, step, .. } => (None, Some(workflow_id.as_str()), Some(step.as_str())),
        _ => (None, None, None),
    };

    let timestamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
    let caller = caller.as_deref().unwrap_or("anonymous");

    macro_rules! log_failure {
        ($level:ident) => {
            tracing::$level!(
                error.name = failure.name(),
                error.message = %failure,
                error.kind = classified.kind.as_str(),
                error.stack = ?failure,
                agent_name,
                workflow_id,
                step,
                %timestamp,
                %method,
                %path,
                caller,
                status = classified.status.as_u16(),
                "request failed"
            )
        };
    }

    if classified.status.is_server_error() {
        log_failure!(error);
    } else {
        log_failure!(warn);
    }

    (classified.status, Json(classified.to_json(now))).into_response()
}
