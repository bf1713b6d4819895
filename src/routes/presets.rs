use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::routes::error::AppError;
use crate::settings::{ChartSettings, Preset};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NewPreset {
    pub name: String,
    pub settings: ChartSettings,
}

pub async fn list_presets(State(state): State<AppState>) -> Result<Json<Vec<Preset>>, AppError> {
    Ok(Json(state.database.list_presets().await?))
}

pub async fn create_preset(
    State(state): State<AppState>,
    Json(body): Json<NewPreset>,
) -> Result<(StatusCode, Json<Preset>), AppError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("INVALID_PRESET", "Preset name must not be empty"));
    }
    let preset = state.database.insert_preset(name, &body.settings).await?;
    tracing::info!(preset_id = %preset.id, name = %preset.name, "Created preset");
    Ok((StatusCode::CREATED, Json(preset)))
}

pub async fn delete_preset(
    State(state): State<AppState>,
    Path(preset_id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.database.delete_preset(&preset_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(&format!("Unknown preset {preset_id}")))
    }
}
