use axum::{extract::State, http::StatusCode, Json};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tracing::{instrument, warn};

use crate::ai::dto::{RecipesRequest, RecipesResponse, ScanLabelRequest};
use crate::ai::error::AiError;
use crate::ai::label::{self, ScannedProduct};
use crate::ai::recipes;
use crate::inventory::dto::ItemFilter;
use crate::inventory::repo as inventory_repo;
use crate::state::AppState;
use crate::status;

#[instrument(skip(state, body))]
pub async fn scan_label(
    State(state): State<AppState>,
    Json(body): Json<ScanLabelRequest>,
) -> Result<Json<ScannedProduct>, (StatusCode, String)> {
    let image = body.image_base64.trim();
    if image.is_empty() {
        warn!("scan request without image data");
        return Err((StatusCode::BAD_REQUEST, "image_base64 is required".into()));
    }
    if BASE64.decode(image).is_err() {
        return Err((
            StatusCode::BAD_REQUEST,
            "image_base64 is not valid base64".into(),
        ));
    }

    let scanned = label::scan_product_label(
        state.ai.as_ref(),
        &state.config.openai.vision_model,
        image,
    )
    .await
    .map_err(ai_error)?;

    Ok(Json(scanned))
}

#[instrument(skip(state))]
pub async fn suggest_recipes(
    State(state): State<AppState>,
    Json(body): Json<RecipesRequest>,
) -> Result<Json<RecipesResponse>, (StatusCode, String)> {
    let today = status::today();
    let items = inventory_repo::list_items(&state.db, &ItemFilter::default(), today)
        .await
        .map_err(internal)?;

    let recipes = recipes::generate_recipes(
        state.ai.as_ref(),
        &state.config.openai.model,
        &items,
        body.count,
        today,
    )
    .await
    .map_err(ai_error)?;

    Ok(Json(RecipesResponse { recipes }))
}

fn ai_error(e: AiError) -> (StatusCode, String) {
    warn!(error = %e, "model call failed");
    (e.status(), e.to_string())
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scan_rejects_bad_base64_before_calling_the_model() {
        let state = AppState::fake().await;
        let body = ScanLabelRequest {
            image_base64: "not base64!!!".into(),
        };
        let err = scan_label(State(state), Json(body)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn scan_rejects_empty_payload() {
        let state = AppState::fake().await;
        let body = ScanLabelRequest {
            image_base64: "   ".into(),
        };
        let err = scan_label(State(state), Json(body)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }
}
