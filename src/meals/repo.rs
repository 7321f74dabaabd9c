use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::meals::dto::UpdateMealRequest;
use crate::types::MealType;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Meal {
    pub id: Uuid,
    pub name: String,
    pub meal_type: MealType,
    pub date: Date,
    pub calories: f64,
    pub protein: f64,
    pub fats: f64,
    pub carbs: f64,
    pub serving_size: String,
    pub emoji: String,
    pub notes: String,
    pub source: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A meal component. `food_item_id` is a weak reference: deleting the food
/// item nulls it out here without touching the meal item itself.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MealItem {
    pub id: Uuid,
    pub meal_id: Uuid,
    pub food_item_id: Option<Uuid>,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub calories: f64,
    pub protein: f64,
    pub fats: f64,
    pub carbs: f64,
}

#[derive(Debug)]
pub struct NewMeal {
    pub name: String,
    pub meal_type: MealType,
    pub date: Date,
    pub calories: f64,
    pub protein: f64,
    pub fats: f64,
    pub carbs: f64,
    pub serving_size: String,
    pub emoji: String,
    pub notes: String,
    pub source: String,
}

#[derive(Debug)]
pub struct NewMealItem {
    pub food_item_id: Option<Uuid>,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub calories: f64,
    pub protein: f64,
    pub fats: f64,
    pub carbs: f64,
}

#[derive(Debug, Serialize)]
pub struct DailyNutrition {
    pub date: Date,
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_fats: f64,
    pub total_carbs: f64,
    pub meals: Vec<Meal>,
}

/// Insert a meal and its items in one transaction.
pub async fn insert_meal(
    db: &SqlitePool,
    new: NewMeal,
    items: Vec<NewMealItem>,
) -> anyhow::Result<(Meal, Vec<MealItem>)> {
    let id = Uuid::new_v4();
    let now = OffsetDateTime::now_utc();
    let mut tx = db.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO meals (id, name, meal_type, date, calories, protein, fats, carbs,
                           serving_size, emoji, notes, source, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(&new.name)
    .bind(new.meal_type)
    .bind(new.date)
    .bind(new.calories)
    .bind(new.protein)
    .bind(new.fats)
    .bind(new.carbs)
    .bind(&new.serving_size)
    .bind(&new.emoji)
    .bind(&new.notes)
    .bind(&new.source)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let mut stored_items = Vec::with_capacity(items.len());
    for item in items {
        let item_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO meal_items (id, meal_id, food_item_id, name, quantity, unit,
                                    calories, protein, fats, carbs)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(item_id)
        .bind(id)
        .bind(item.food_item_id)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(&item.unit)
        .bind(item.calories)
        .bind(item.protein)
        .bind(item.fats)
        .bind(item.carbs)
        .execute(&mut *tx)
        .await?;
        stored_items.push(MealItem {
            id: item_id,
            meal_id: id,
            food_item_id: item.food_item_id,
            name: item.name,
            quantity: item.quantity,
            unit: item.unit,
            calories: item.calories,
            protein: item.protein,
            fats: item.fats,
            carbs: item.carbs,
        });
    }

    tx.commit().await?;

    Ok((
        Meal {
            id,
            name: new.name,
            meal_type: new.meal_type,
            date: new.date,
            calories: new.calories,
            protein: new.protein,
            fats: new.fats,
            carbs: new.carbs,
            serving_size: new.serving_size,
            emoji: new.emoji,
            notes: new.notes,
            source: new.source,
            created_at: now,
            updated_at: now,
        },
        stored_items,
    ))
}

pub async fn meals_by_date(
    db: &SqlitePool,
    date: Date,
    meal_type: Option<MealType>,
) -> anyhow::Result<Vec<Meal>> {
    let rows = match meal_type {
        Some(meal_type) => {
            sqlx::query_as::<_, Meal>(
                "SELECT * FROM meals WHERE date = ? AND meal_type = ? ORDER BY created_at ASC",
            )
            .bind(date)
            .bind(meal_type)
            .fetch_all(db)
            .await?
        }
        None => {
            sqlx::query_as::<_, Meal>("SELECT * FROM meals WHERE date = ? ORDER BY created_at ASC")
                .bind(date)
                .fetch_all(db)
                .await?
        }
    };
    Ok(rows)
}

pub async fn get_meal_with_items(
    db: &SqlitePool,
    id: Uuid,
) -> anyhow::Result<Option<(Meal, Vec<MealItem>)>> {
    let meal = sqlx::query_as::<_, Meal>("SELECT * FROM meals WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    let Some(meal) = meal else {
        return Ok(None);
    };
    let items = sqlx::query_as::<_, MealItem>("SELECT * FROM meal_items WHERE meal_id = ?")
        .bind(id)
        .fetch_all(db)
        .await?;
    Ok(Some((meal, items)))
}

pub async fn update_meal(
    db: &SqlitePool,
    id: Uuid,
    update: &UpdateMealRequest,
) -> anyhow::Result<bool> {
    let now = OffsetDateTime::now_utc();
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE meals SET ");
    {
        let mut fields = qb.separated(", ");
        if let Some(name) = &update.name {
            fields.push("name = ");
            fields.push_bind_unseparated(name.clone());
        }
        if let Some(meal_type) = update.meal_type {
            fields.push("meal_type = ");
            fields.push_bind_unseparated(meal_type);
        }
        if let Some(date) = update.date {
            fields.push("date = ");
            fields.push_bind_unseparated(date);
        }
        if let Some(calories) = update.calories {
            fields.push("calories = ");
            fields.push_bind_unseparated(calories);
        }
        if let Some(protein) = update.protein {
            fields.push("protein = ");
            fields.push_bind_unseparated(protein);
        }
        if let Some(fats) = update.fats {
            fields.push("fats = ");
            fields.push_bind_unseparated(fats);
        }
        if let Some(carbs) = update.carbs {
            fields.push("carbs = ");
            fields.push_bind_unseparated(carbs);
        }
        if let Some(serving_size) = &update.serving_size {
            fields.push("serving_size = ");
            fields.push_bind_unseparated(serving_size.clone());
        }
        if let Some(emoji) = &update.emoji {
            fields.push("emoji = ");
            fields.push_bind_unseparated(emoji.clone());
        }
        if let Some(notes) = &update.notes {
            fields.push("notes = ");
            fields.push_bind_unseparated(notes.clone());
        }
        if let Some(source) = &update.source {
            fields.push("source = ");
            fields.push_bind_unseparated(source.clone());
        }
        fields.push("updated_at = ");
        fields.push_bind_unseparated(now);
    }
    qb.push(" WHERE id = ");
    qb.push_bind(id);

    let result = qb.build().execute(db).await?;
    Ok(result.rows_affected() > 0)
}

/// Items go with the meal (FK cascade).
pub async fn delete_meal(db: &SqlitePool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM meals WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Sum the declared macros of every meal on `date`, one decimal place.
/// Item-level macros are detail and never feed the rollup.
pub async fn daily_nutrition(db: &SqlitePool, date: Date) -> anyhow::Result<DailyNutrition> {
    let meals = meals_by_date(db, date, None).await?;

    let mut total_calories = 0.0;
    let mut total_protein = 0.0;
    let mut total_fats = 0.0;
    let mut total_carbs = 0.0;
    for meal in &meals {
        total_calories += meal.calories;
        total_protein += meal.protein;
        total_fats += meal.fats;
        total_carbs += meal.carbs;
    }

    Ok(DailyNutrition {
        date,
        total_calories: round1(total_calories),
        total_protein: round1(total_protein),
        total_fats: round1(total_fats),
        total_carbs: round1(total_carbs),
        meals,
    })
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::dto::ItemFilter;
    use crate::inventory::repo as inventory_repo;
    use crate::state::test_pool;
    use crate::types::{FoodCategory, StorageLocation};
    use time::macros::date;

    fn new_meal(name: &str, meal_type: MealType, date: Date, calories: f64) -> NewMeal {
        NewMeal {
            name: name.to_string(),
            meal_type,
            date,
            calories,
            protein: 10.0,
            fats: 5.0,
            carbs: 20.0,
            serving_size: "1 serving".to_string(),
            emoji: "🍽️".to_string(),
            notes: String::new(),
            source: "manual".to_string(),
        }
    }

    fn new_meal_item(name: &str, food_item_id: Option<Uuid>) -> NewMealItem {
        NewMealItem {
            food_item_id,
            name: name.to_string(),
            quantity: 1.0,
            unit: "pcs".to_string(),
            calories: 40.0,
            protein: 2.0,
            fats: 1.0,
            carbs: 6.0,
        }
    }

    #[tokio::test]
    async fn insert_stores_meal_and_items_together() {
        let db = test_pool().await;
        let day = date!(2026 - 03 - 15);
        let (meal, items) = insert_meal(
            &db,
            new_meal("omelette", MealType::Breakfast, day, 320.0),
            vec![new_meal_item("eggs", None), new_meal_item("cheese", None)],
        )
        .await
        .unwrap();

        let (fetched, fetched_items) = get_meal_with_items(&db, meal.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "omelette");
        assert_eq!(fetched.meal_type, MealType::Breakfast);
        assert_eq!(fetched_items.len(), 2);
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn listing_filters_by_date_and_type() {
        let db = test_pool().await;
        let day = date!(2026 - 03 - 15);
        insert_meal(&db, new_meal("oats", MealType::Breakfast, day, 200.0), vec![])
            .await
            .unwrap();
        insert_meal(&db, new_meal("tacos", MealType::Dinner, day, 600.0), vec![])
            .await
            .unwrap();
        insert_meal(
            &db,
            new_meal("soup", MealType::Dinner, date!(2026 - 03 - 16), 300.0),
            vec![],
        )
        .await
        .unwrap();

        let all = meals_by_date(&db, day, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let dinners = meals_by_date(&db, day, Some(MealType::Dinner)).await.unwrap();
        assert_eq!(dinners.len(), 1);
        assert_eq!(dinners[0].name, "tacos");
    }

    #[tokio::test]
    async fn rollup_uses_declared_macros_not_item_sums() {
        let db = test_pool().await;
        let day = date!(2026 - 03 - 15);
        // Declared totals disagree with the item detail on purpose.
        insert_meal(
            &db,
            new_meal("salad", MealType::Lunch, day, 500.0),
            vec![new_meal_item("lettuce", None)],
        )
        .await
        .unwrap();

        let rollup = daily_nutrition(&db, day).await.unwrap();
        assert_eq!(rollup.total_calories, 500.0);
        assert_eq!(rollup.meals.len(), 1);
    }

    #[tokio::test]
    async fn rollup_rounds_to_one_decimal() {
        let db = test_pool().await;
        let day = date!(2026 - 03 - 15);
        let mut first = new_meal("a", MealType::Breakfast, day, 100.15);
        first.protein = 1.04;
        let mut second = new_meal("b", MealType::Lunch, day, 200.32);
        second.protein = 2.03;
        insert_meal(&db, first, vec![]).await.unwrap();
        insert_meal(&db, second, vec![]).await.unwrap();

        let rollup = daily_nutrition(&db, day).await.unwrap();
        assert!((rollup.total_calories - 300.5).abs() < 1e-9);
        assert!((rollup.total_protein - 3.1).abs() < 1e-9);
    }

    #[tokio::test]
    async fn rollup_of_an_empty_day_is_zero() {
        let db = test_pool().await;
        let rollup = daily_nutrition(&db, date!(2026 - 01 - 01)).await.unwrap();
        assert_eq!(rollup.total_calories, 0.0);
        assert_eq!(rollup.total_protein, 0.0);
        assert!(rollup.meals.is_empty());
    }

    #[tokio::test]
    async fn deleting_a_meal_cascades_to_its_items() {
        let db = test_pool().await;
        let day = date!(2026 - 03 - 15);
        let (meal, _) = insert_meal(
            &db,
            new_meal("pasta", MealType::Dinner, day, 700.0),
            vec![new_meal_item("spaghetti", None)],
        )
        .await
        .unwrap();

        assert!(delete_meal(&db, meal.id).await.unwrap());
        let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM meal_items WHERE meal_id = ?")
            .bind(meal.id)
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn deleting_a_food_item_nulls_the_weak_reference() {
        let db = test_pool().await;
        let today = crate::status::today();
        let food = inventory_repo::insert_item(
            &db,
            inventory_repo::NewFoodItem {
                name: "chicken".to_string(),
                category: FoodCategory::Meat,
                quantity: 1.0,
                unit: "kg".to_string(),
                purchase_date: today,
                expiration_date: today,
                storage_location: StorageLocation::Fridge,
                price: None,
                currency: "MXN".to_string(),
                notes: String::new(),
            },
            today,
        )
        .await
        .unwrap();

        let (meal, items) = insert_meal(
            &db,
            new_meal("stir fry", MealType::Dinner, today, 450.0),
            vec![new_meal_item("chicken", Some(food.id))],
        )
        .await
        .unwrap();
        assert_eq!(items[0].food_item_id, Some(food.id));

        assert!(inventory_repo::delete_item(&db, food.id).await.unwrap());

        let (fetched, fetched_items) = get_meal_with_items(&db, meal.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "stir fry");
        assert_eq!(fetched_items.len(), 1);
        assert_eq!(fetched_items[0].food_item_id, None);

        // The inventory listing no longer sees the item.
        let remaining = inventory_repo::list_items(&db, &ItemFilter::default(), today)
            .await
            .unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn update_touches_only_supplied_fields() {
        let db = test_pool().await;
        let day = date!(2026 - 03 - 15);
        let (meal, _) = insert_meal(&db, new_meal("bowl", MealType::Lunch, day, 400.0), vec![])
            .await
            .unwrap();

        let update = UpdateMealRequest {
            calories: Some(450.0),
            ..Default::default()
        };
        assert!(update_meal(&db, meal.id, &update).await.unwrap());

        let (fetched, _) = get_meal_with_items(&db, meal.id).await.unwrap().unwrap();
        assert_eq!(fetched.calories, 450.0);
        assert_eq!(fetched.name, "bowl");
        assert_eq!(fetched.protein, 10.0);
    }
}
