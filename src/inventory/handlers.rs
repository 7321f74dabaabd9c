use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::inventory::dto::{
    CreateItemRequest, ExpiringQuery, FoodItemResponse, ItemFilter, UpdateItemRequest,
};
use crate::inventory::repo::{self, InventoryStats, NewFoodItem, WasteStats};
use crate::state::AppState;
use crate::status;

#[instrument(skip(state))]
pub async fn list_items(
    State(state): State<AppState>,
    Query(filter): Query<ItemFilter>,
) -> Result<Json<Vec<FoodItemResponse>>, (StatusCode, String)> {
    let today = status::today();
    let items = repo::list_items(&state.db, &filter, today)
        .await
        .map_err(internal)?;
    Ok(Json(
        items
            .into_iter()
            .map(|item| FoodItemResponse::new(item, today))
            .collect(),
    ))
}

#[instrument(skip(state))]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FoodItemResponse>, (StatusCode, String)> {
    let today = status::today();
    let item = repo::get_item(&state.db, id, today)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Item not found".to_string()))?;
    Ok(Json(FoodItemResponse::new(item, today)))
}

#[instrument(skip(state, payload))]
pub async fn create_item(
    State(state): State<AppState>,
    Json(payload): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<FoodItemResponse>), (StatusCode, String)> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        warn!("item create without a name");
        return Err((StatusCode::BAD_REQUEST, "Name is required".into()));
    }
    if payload.quantity < 0.0 {
        warn!(quantity = payload.quantity, "negative quantity");
        return Err((StatusCode::BAD_REQUEST, "Quantity must not be negative".into()));
    }

    let today = status::today();
    let new = NewFoodItem {
        name,
        category: payload.category,
        quantity: payload.quantity,
        unit: payload.unit,
        purchase_date: payload.purchase_date.unwrap_or(today),
        expiration_date: payload.expiration_date,
        storage_location: payload.storage_location,
        price: payload.price,
        currency: payload.currency,
        notes: payload.notes,
    };
    let item = repo::insert_item(&state.db, new, today)
        .await
        .map_err(internal)?;

    Ok((StatusCode::CREATED, Json(FoodItemResponse::new(item, today))))
}

#[instrument(skip(state, payload))]
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateItemRequest>,
) -> Result<Json<FoodItemResponse>, (StatusCode, String)> {
    if let Some(name) = &payload.name {
        if name.trim().is_empty() {
            return Err((StatusCode::BAD_REQUEST, "Name must not be empty".into()));
        }
    }
    if let Some(quantity) = payload.quantity {
        if quantity < 0.0 {
            return Err((StatusCode::BAD_REQUEST, "Quantity must not be negative".into()));
        }
    }

    let today = status::today();
    let existing = repo::get_item(&state.db, id, today)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Item not found".to_string()))?;

    // Consumed / thrown-away are final.
    if let Some(disposition) = payload.disposition {
        if existing.disposition.is_terminal() && disposition != existing.disposition {
            warn!(item = %id, "attempted to change a terminal disposition");
            return Err((
                StatusCode::CONFLICT,
                "Item disposition is already final".into(),
            ));
        }
    }

    repo::update_item(&state.db, id, &payload, today)
        .await
        .map_err(internal)?;

    let item = repo::get_item(&state.db, id, today)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Item not found".to_string()))?;
    Ok(Json(FoodItemResponse::new(item, today)))
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
        Err((StatusCode::NOT_FOUND, "Item not found".into()))
    }
}

#[instrument(skip(state))]
pub async fn expiring_items(
    State(state): State<AppState>,
    Query(query): Query<ExpiringQuery>,
) -> Result<Json<Vec<FoodItemResponse>>, (StatusCode, String)> {
    let today = status::today();
    let items = repo::expiring_items(&state.db, query.days, today)
        .await
        .map_err(internal)?;
    Ok(Json(
        items
            .into_iter()
            .map(|item| FoodItemResponse::new(item, today))
            .collect(),
    ))
}

#[instrument(skip(state))]
pub async fn expired_items(
    State(state): State<AppState>,
) -> Result<Json<Vec<FoodItemResponse>>, (StatusCode, String)> {
    let today = status::today();
    let items = repo::expired_items(&state.db, today)
        .await
        .map_err(internal)?;
    Ok(Json(
        items
            .into_iter()
            .map(|item| FoodItemResponse::new(item, today))
            .collect(),
    ))
}

#[instrument(skip(state))]
pub async fn inventory_stats(
    State(state): State<AppState>,
) -> Result<Json<InventoryStats>, (StatusCode, String)> {
    let stats = repo::inventory_stats(&state.db, status::today())
        .await
        .map_err(internal)?;
    Ok(Json(stats))
}

#[instrument(skip(state))]
pub async fn waste_stats(
    State(state): State<AppState>,
) -> Result<Json<WasteStats>, (StatusCode, String)> {
    let stats = repo::waste_stats(&state.db).await.map_err(internal)?;
    Ok(Json(stats))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemDisposition;
    use time::macros::date;

    fn create_payload(name: &str) -> CreateItemRequest {
        CreateItemRequest {
            name: name.to_string(),
            category: crate::types::FoodCategory::Other,
            quantity: 1.0,
            unit: "pcs".to_string(),
            purchase_date: None,
            expiration_date: date!(2030 - 01 - 01),
            storage_location: crate::types::StorageLocation::Pantry,
            price: None,
            currency: "MXN".to_string(),
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn create_rejects_blank_names_before_persisting() {
        let state = AppState::fake().await;
        let err = create_item(State(state.clone()), Json(create_payload("   ")))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM food_items")
            .fetch_one(&state.db)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn terminal_dispositions_are_one_way() {
        let state = AppState::fake().await;
        let (_, Json(created)) = create_item(State(state.clone()), Json(create_payload("rice")))
            .await
            .unwrap();

        let consume = UpdateItemRequest {
            disposition: Some(ItemDisposition::Consumed),
            ..Default::default()
        };
        update_item(State(state.clone()), Path(created.item.id), Json(consume))
            .await
            .unwrap();

        let revive = UpdateItemRequest {
            disposition: Some(ItemDisposition::Active),
            ..Default::default()
        };
        let err = update_item(State(state.clone()), Path(created.item.id), Json(revive))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::CONFLICT);

        // Re-asserting the same terminal disposition is a no-op, not a conflict.
        let same = UpdateItemRequest {
            disposition: Some(ItemDisposition::Consumed),
            ..Default::default()
        };
        update_item(State(state), Path(created.item.id), Json(same))
            .await
            .unwrap();
    }
}
