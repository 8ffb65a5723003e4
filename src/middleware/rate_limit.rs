use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::sync::Arc;

use super::auth::AuthUser;
use crate::error::ApiError;
use crate::limiter::{Admission, FixedWindowLimiter};

const RATE_LIMIT_MESSAGE: &str = "Too many requests from this IP, please try again later.";
const AI_RATE_LIMIT_MESSAGE: &str = "Too many AI requests, please try again later.";

/// Client address key: first `X-Forwarded-For` hop, then the peer address.
pub fn client_key(request: &Request) -> String {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Per-address limiter for one route group
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<FixedWindowLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = client_key(&request);

    match limiter.admit(&key) {
        Admission::Admitted { .. } => Ok(next.run(request).await),
        Admission::Rejected { .. } => Err(ApiError::too_many_requests(RATE_LIMIT_MESSAGE, None)),
    }
}

/// Per-user limiter for AI routes; requests without an authenticated user
/// are left to the address-based limiter.
pub async fn user_rate_limit_middleware(
    State(limiter): State<Arc<FixedWindowLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(user_id) = request.extensions().get::<AuthUser>().map(|user| user.user_id.clone()) else {
        return Ok(next.run(request).await);
    };

    match limiter.admit(&user_id) {
        Admission::Admitted { .. } => Ok(next.run(request).await),
        Admission::Rejected { retry_after } => {
            // Round up so clients never retry a moment too early
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            Err(ApiError::too_many_requests(AI_RATE_LIMIT_MESSAGE, Some(secs)))
        }
    }
}
