//! Admin settings endpoints. Every route here sits behind the bearer-token
//! gate and the `admin` rate tier.

use crate::error::{ServerError, ServerResult};
use crate::routes::ok;
use crate::state::ServerState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Returns all settings in their string form
pub async fn list_settings(
    State(state): State<Arc<ServerState>>,
) -> ServerResult<impl IntoResponse> {
    let settings: BTreeMap<String, String> = state
        .settings
        .get_all()
        .into_iter()
        .map(|(key, value)| (key, value.to_string()))
        .collect();
    Ok(ok(settings))
}

#[derive(Debug, Deserialize)]
pub struct SetSettingRequest {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// Sets or updates a setting
pub async fn set_setting(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<SetSettingRequest>, JsonRejection>,
) -> ServerResult<impl IntoResponse> {
    let Json(request) =
        payload.map_err(|_| ServerError::BadRequest("Invalid request body".to_string()))?;

    if request.key.is_empty() {
        return Err(ServerError::BadRequest("Key is required".to_string()));
    }

    // The settings write commits to the backing store; keep it off the
    // async runtime.
    let worker = state.clone();
    tokio::task::spawn_blocking(move || worker.settings.set(&request.key, &request.value))
        .await??;

    Ok(ok(json!({"message": "Setting updated successfully"})))
}

/// Deletes a setting by key
pub async fn delete_setting(
    State(state): State<Arc<ServerState>>,
    Path(key): Path<String>,
) -> ServerResult<impl IntoResponse> {
    let worker = state.clone();
    tokio::task::spawn_blocking(move || worker.settings.delete(&key)).await??;

    Ok(ok(json!({"message": "Setting deleted successfully"})))
}
