// handlers/admin/security.rs - user and credential administration

use axum::{
    extract::{Path, State},
    Extension,
};
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::failure::Failure;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};
use crate::store::{Role, User};

#[derive(Debug, Deserialize)]
pub struct RoleUpdate {
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenInspect {
    pub token: String,
}

/// GET /api/admin/security/users
pub async fn users_get(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    let users = state.store.list_users().await?;
    Ok(ApiResponse::success(users))
}

/// PUT /api/admin/security/users/:id/role
pub async fn user_role_put(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<RoleUpdate>,
) -> ApiResult<User> {
    let role: Role = body.role.parse()?;

    if id == caller.user_id && role != Role::Admin {
        return Err(Failure::validation("administrators cannot remove their own admin role"));
    }

    let user = state.store.set_user_role(&id, role).await?;
    tracing::info!(admin = %caller.user_id, user = %id, %role, "user role changed");

    Ok(ApiResponse::success(user))
}

/// POST /api/admin/security/users/:id/suspend
pub async fn user_suspend_post(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<User> {
    if id == caller.user_id {
        return Err(Failure::validation("administrators cannot suspend themselves"));
    }

    let user = state.store.suspend_user(&id).await?;
    tracing::info!(admin = %caller.user_id, user = %id, "user suspended");

    Ok(ApiResponse::success(user))
}

/// POST /api/admin/security/tokens/inspect - verify a user's token on their behalf
pub async fn token_inspect_post(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<TokenInspect>,
) -> ApiResult<Value> {
    let claims = state.verifier.verify(body.token.trim())?;

    let issued_at = Utc.timestamp_opt(claims.iat, 0).single();
    let expires_at = Utc.timestamp_opt(claims.exp, 0).single();

    Ok(ApiResponse::success(json!({
        "valid": true,
        "subject": claims.sub,
        "role": claims.role,
        "issuedAt": issued_at,
        "expiresAt": expires_at,
    })))
}
