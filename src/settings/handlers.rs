use axum::{extract::State, http::StatusCode, Json};
use tracing::instrument;

use crate::settings::repo::{self, AppSettings, SettingsUpdate};
use crate::state::AppState;

#[instrument(skip(state))]
pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<AppSettings>, (StatusCode, String)> {
    let settings = repo::get_settings(&state.db).await.map_err(internal)?;
    Ok(Json(settings))
}

#[instrument(skip(state, payload))]
pub async fn update_settings(
    State(state): State<AppState>,
    Json(payload): Json<SettingsUpdate>,
) -> Result<Json<AppSettings>, (StatusCode, String)> {
    let settings = repo::update_settings(&state.db, &payload)
        .await
        .map_err(internal)?;
    Ok(Json(settings))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
