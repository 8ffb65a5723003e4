use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::{authorize, extract_bearer, Claims, TokenVerifier, ADMIN_ROLE};
use crate::error::ApiError;

/// Authenticated caller extracted from the bearer token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
    pub role: String,
    pub claims: Claims,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub.clone(),
            role: claims.role.clone(),
            claims,
        }
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
pub async fn jwt_auth_middleware(
    State(verifier): State<Arc<TokenVerifier>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(request.headers()).map_err(|failure| {
        tracing::debug!(path = %request.uri().path(), "rejected request: {}", failure);
        ApiError::from(failure)
    })?;

    let claims = verifier.verify(token).map_err(|failure| {
        tracing::warn!(path = %request.uri().path(), "rejected request: {}", failure);
        ApiError::from(failure)
    })?;

    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}

/// Role gate for admin routes; must run after `jwt_auth_middleware`
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let auth_user = request.extensions().get::<AuthUser>().ok_or_else(|| {
        tracing::error!(path = %request.uri().path(), "role gate reached without authenticated user");
        ApiError::internal_server_error("Authentication required before role validation")
    })?;

    if let Err(failure) = authorize(&auth_user.claims, ADMIN_ROLE) {
        tracing::warn!(
            path = %request.uri().path(),
            user_id = %auth_user.user_id,
            "rejected request: {}",
            failure
        );
        return Err(failure.into());
    }

    Ok(next.run(request).await)
}
