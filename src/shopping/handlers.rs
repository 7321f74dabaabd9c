use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::shopping::dto::{CreateShoppingItemRequest, SetCheckedRequest, ShoppingCount};
use crate::shopping::repo::{self, NewShoppingItem, ShoppingListItem};
use crate::state::AppState;

#[instrument(skip(state))]
pub async fn list_items(
    State(state): State<AppState>,
) -> Result<Json<Vec<ShoppingListItem>>, (StatusCode, String)> {
    let items = repo::list_items(&state.db).await.map_err(internal)?;
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn unchecked_count(
    State(state): State<AppState>,
) -> Result<Json<ShoppingCount>, (StatusCode, String)> {
    let count = repo::unchecked_count(&state.db).await.map_err(internal)?;
    Ok(Json(ShoppingCount { count }))
}

#[instrument(skip(state, payload))]
pub async fn create_item(
    State(state): State<AppState>,
    Json(payload): Json<CreateShoppingItemRequest>,
) -> Result<(StatusCode, Json<ShoppingListItem>), (StatusCode, String)> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        warn!("shopping entry without a name");
        return Err((StatusCode::BAD_REQUEST, "Name is required".into()));
    }

    let item = repo::insert_item(
        &state.db,
        NewShoppingItem {
            name,
            category: payload.category,
            quantity: payload.quantity,
            unit: payload.unit,
            source_item_id: payload.source_item_id,
        },
    )
    .await
    .map_err(internal)?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[instrument(skip(state))]
pub async fn set_checked(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetCheckedRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    let updated = repo::set_checked(&state.db, id, payload.checked)
        .await
        .map_err(internal)?;
    if updated {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Entry not found".into()))
    }
}

#[instrument(skip(state))]
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let deleted = repo::delete_item(&state.db, id).await.map_err(internal)?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Entry not found".into()))
    }
}

#[instrument(skip(state))]
pub async fn clear_checked(
    State(state): State<AppState>,
) -> Result<StatusCode, (StatusCode, String)> {
    repo::clear_checked(&state.db).await.map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
