// HTTP API Error Types
//
// Responses produced directly by the middleware gates and request validation.
// Failures raised inside handlers go through `failure::classify` instead.
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::auth::AuthFailure;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        missing_fields: Vec<String>,
    },

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 429 Too Many Requests
    TooManyRequests {
        message: String,
        retry_after_secs: Option<u64>,
    },

    // 500 Internal Server Error
    InternalServerError(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::TooManyRequests { message, .. } => message,
            ApiError::InternalServerError(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::TooManyRequests { .. } => "TOO_MANY_REQUESTS",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "success": false,
            "error": self.message(),
            "message": self.message(),
            "code": self.error_code()
        });

        match self {
            ApiError::ValidationError { missing_fields, .. } => {
                response["missingFields"] = json!(missing_fields);
            }
            ApiError::TooManyRequests {
                retry_after_secs: Some(secs),
                ..
            } => {
                response["retryAfter"] = json!(secs);
            }
            _ => {}
        }

        response
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn missing_fields(missing_fields: Vec<String>) -> Self {
        ApiError::ValidationError {
            message: format!("Missing required fields: {}", missing_fields.join(", ")),
            missing_fields,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn too_many_requests(message: impl Into<String>, retry_after_secs: Option<u64>) -> Self {
        ApiError::TooManyRequests {
            message: message.into(),
            retry_after_secs,
        }
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }
}

impl From<AuthFailure> for ApiError {
    fn from(failure: AuthFailure) -> Self {
        match failure {
            AuthFailure::MissingToken => ApiError::unauthorized("Access token required"),
            AuthFailure::InvalidOrExpired(_) => ApiError::forbidden("Invalid or expired token"),
            AuthFailure::InsufficientRole { required } => {
                ApiError::forbidden(format!("Access denied: {} privileges required", required))
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_map_to_401_and_403() {
        assert_eq!(ApiError::from(AuthFailure::MissingToken).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::from(AuthFailure::InvalidOrExpired("bad signature".into())).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn insufficient_role_names_required_privilege_only() {
        let err = ApiError::from(AuthFailure::InsufficientRole { required: "admin".into() });
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.message(), "Access denied: admin privileges required");
    }

    #[test]
    fn validation_error_lists_missing_fields() {
        let body = ApiError::missing_fields(vec!["industry".into(), "goals".into()]).to_json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["missingFields"], json!(["industry", "goals"]));
        assert_eq!(body["success"], false);
    }

    #[test]
    fn too_many_requests_carries_retry_after() {
        let body = ApiError::too_many_requests("slow down", Some(42)).to_json();
        assert_eq!(body["retryAfter"], 42);
        assert!(ApiError::too_many_requests("slow down", None).to_json().get("retryAfter").is_none());
    }
}
