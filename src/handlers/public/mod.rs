// handlers/public/mod.rs - Public handlers (no authentication)

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::failure::Failure;
use crate::middleware::{ApiResponse, ApiResult};

/// GET / - service description
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Social Admin API",
            "version": version,
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "security": "/api/admin/security/* (admin, 50 requests / 15 min)",
                "settings": "/api/admin/settings[/:key] (admin, 100 requests / 15 min)",
                "ai": "/api/ai/* (authenticated, per-user AI quota)",
            }
        }
    }))
}

/// GET /health - store connectivity
pub async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    state.store.health_check().await.map_err(Failure::from)?;

    Ok(ApiResponse::success(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "database": "ok",
        "environment": state.config.environment,
    })))
}

pub async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
