use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::meals::dto::{
    CreateMealRequest, DailyNutritionQuery, MealDetails, MealsQuery, UpdateMealRequest,
};
use crate::meals::repo::{self, DailyNutrition, Meal, NewMeal, NewMealItem};
use crate::state::AppState;

#[instrument(skip(state))]
pub async fn list_meals(
    State(state): State<AppState>,
    Query(query): Query<MealsQuery>,
) -> Result<Json<Vec<Meal>>, (StatusCode, String)> {
    let meals = repo::meals_by_date(&state.db, query.date, query.meal_type)
        .await
        .map_err(internal)?;
    Ok(Json(meals))
}

#[instrument(skip(state))]
pub async fn get_meal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MealDetails>, (StatusCode, String)> {
    let (meal, items) = repo::get_meal_with_items(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Meal not found".to_string()))?;
    Ok(Json(MealDetails { meal, items }))
}

#[instrument(skip(state, payload))]
pub async fn create_meal(
    State(state): State<AppState>,
    Json(payload): Json<CreateMealRequest>,
) -> Result<(StatusCode, Json<MealDetails>), (StatusCode, String)> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        warn!("meal create without a name");
        return Err((StatusCode::BAD_REQUEST, "Name is required".into()));
    }

    let new = NewMeal {
        name,
        meal_type: payload.meal_type,
        date: payload.date,
        calories: payload.calories,
        protein: payload.protein,
        fats: payload.fats,
        carbs: payload.carbs,
        serving_size: payload.serving_size,
        emoji: payload.emoji,
        notes: payload.notes,
        source: payload.source,
    };
    let items = payload
        .items
        .into_iter()
        .map(|item| NewMealItem {
            food_item_id: item.food_item_id,
            name: item.name,
            quantity: item.quantity,
            unit: item.unit,
            calories: item.calories,
            protein: item.protein,
            fats: item.fats,
            carbs: item.carbs,
        })
        .collect();

    let (meal, items) = repo::insert_meal(&state.db, new, items)
        .await
        .map_err(internal)?;
    Ok((StatusCode::CREATED, Json(MealDetails { meal, items })))
}

#[instrument(skip(state, payload))]
pub async fn update_meal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMealRequest>,
) -> Result<Json<MealDetails>, (StatusCode, String)> {
    if let Some(name) = &payload.name {
        if name.trim().is_empty() {
            return Err((StatusCode::BAD_REQUEST, "Name must not be empty".into()));
        }
    }

    let updated = repo::update_meal(&state.db, id, &payload)
        .await
        .map_err(internal)?;
    if !updated {
        return Err((StatusCode::NOT_FOUND, "Meal not found".into()));
    }

    let (meal, items) = repo::get_meal_with_items(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Meal not found".to_string()))?;
    Ok(Json(MealDetails { meal, items }))
}

#[instrument(skip(state))]
pub async fn delete_meal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let deleted = repo::delete_meal(&state.db, id).await.map_err(internal)?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Meal not found".into()))
    }
}

#[instrument(skip(state))]
pub async fn daily_nutrition(
    State(state): State<AppState>,
    Query(query): Query<DailyNutritionQuery>,
) -> Result<Json<DailyNutrition>, (StatusCode, String)> {
    let rollup = repo::daily_nutrition(&state.db, query.date)
        .await
        .map_err(internal)?;
    Ok(Json(rollup))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
