// handlers/admin/settings.rs - platform configuration

use axum::{
    extract::{Path, State},
    Extension,
};
use serde::Deserialize;
use serde_json::Value;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};
use crate::store::Setting;

#[derive(Debug, Deserialize)]
pub struct SettingUpdate {
    #[serde(default)]
    pub value: Value,
}

/// GET /api/admin/settings
pub async fn settings_get(State(state): State<AppState>) -> ApiResult<Vec<Setting>> {
    Ok(ApiResponse::success(state.store.list_settings().await?))
}

/// PUT /api/admin/settings/:key
pub async fn setting_put(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(key): Path<String>,
    JsonBody(body): JsonBody<SettingUpdate>,
) -> ApiResult<Setting> {
    let setting = state.store.put_setting(&key, body.value, &caller.user_id).await?;
    tracing::info!(admin = %caller.user_id, key = %setting.key, "setting updated");

    Ok(ApiResponse::success(setting))
}
