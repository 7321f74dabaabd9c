use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use time::{Date, Duration, OffsetDateTime};
use uuid::Uuid;

use crate::inventory::dto::{ItemFilter, UpdateItemRequest};
use crate::status::{compute_status, EXPIRING_WINDOW_DAYS};
use crate::types::{FoodCategory, FoodStatus, ItemDisposition, StorageLocation};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FoodItem {
    pub id: Uuid,
    pub name: String,
    pub category: FoodCategory,
    pub quantity: f64,
    pub unit: String,
    pub purchase_date: Date,
    pub expiration_date: Date,
    pub storage_location: StorageLocation,
    pub status: FoodStatus,
    pub disposition: ItemDisposition,
    pub price: Option<f64>,
    pub currency: String,
    pub notes: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl FoodItem {
    /// The persisted status can be stale; derive the current one on read.
    /// Terminal items keep whatever status they froze with.
    pub fn refreshed(mut self, today: Date) -> Self {
        if self.disposition == ItemDisposition::Active {
            self.status = compute_status(self.expiration_date, today);
        }
        self
    }
}

#[derive(Debug)]
pub struct NewFoodItem {
    pub name: String,
    pub category: FoodCategory,
    pub quantity: f64,
    pub unit: String,
    pub purchase_date: Date,
    pub expiration_date: Date,
    pub storage_location: StorageLocation,
    pub price: Option<f64>,
    pub currency: String,
    pub notes: String,
}

#[derive(Debug, Serialize)]
pub struct InventoryStats {
    pub total: i64,
    pub fresh: i64,
    pub expiring: i64,
    pub expired: i64,
    pub total_value: f64,
    pub wasted_value: f64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct CategoryWaste {
    pub category: FoodCategory,
    pub wasted: i64,
    pub consumed: i64,
}

#[derive(Debug, Serialize)]
pub struct WasteStats {
    pub total_wasted: i64,
    pub total_consumed: i64,
    pub wasted_value: f64,
    pub saved_value: f64,
    pub by_category: Vec<CategoryWaste>,
}

pub async fn insert_item(
    db: &SqlitePool,
    new: NewFoodItem,
    today: Date,
) -> anyhow::Result<FoodItem> {
    let id = Uuid::new_v4();
    let now = OffsetDateTime::now_utc();
    let status = compute_status(new.expiration_date, today);

    sqlx::query(
        r#"
        INSERT INTO food_items (id, name, category, quantity, unit, purchase_date,
                                expiration_date, storage_location, status, disposition,
                                price, currency, notes, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(&new.name)
    .bind(new.category)
    .bind(new.quantity)
    .bind(&new.unit)
    .bind(new.purchase_date)
    .bind(new.expiration_date)
    .bind(new.storage_location)
    .bind(status)
    .bind(ItemDisposition::Active)
    .bind(new.price)
    .bind(&new.currency)
    .bind(&new.notes)
    .bind(now)
    .bind(now)
    .execute(db)
    .await?;

    Ok(FoodItem {
        id,
        name: new.name,
        category: new.category,
        quantity: new.quantity,
        unit: new.unit,
        purchase_date: new.purchase_date,
        expiration_date: new.expiration_date,
        storage_location: new.storage_location,
        status,
        disposition: ItemDisposition::Active,
        price: new.price,
        currency: new.currency,
        notes: new.notes,
        created_at: now,
        updated_at: now,
    })
}

pub async fn get_item(db: &SqlitePool, id: Uuid, today: Date) -> anyhow::Result<Option<FoodItem>> {
    let row = sqlx::query_as::<_, FoodItem>("SELECT * FROM food_items WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row.map(|item| item.refreshed(today)))
}

/// Filtered listing, ascending by expiration date. Without an explicit
/// disposition filter only active items are returned.
pub async fn list_items(
    db: &SqlitePool,
    filter: &ItemFilter,
    today: Date,
) -> anyhow::Result<Vec<FoodItem>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM food_items WHERE disposition = ");
    qb.push_bind(filter.disposition.unwrap_or(ItemDisposition::Active));
    if let Some(category) = filter.category {
        qb.push(" AND category = ");
        qb.push_bind(category);
    }
    if let Some(location) = filter.storage_location {
        qb.push(" AND storage_location = ");
        qb.push_bind(location);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ");
        qb.push_bind(status);
    }
    if let Some(search) = &filter.search {
        qb.push(" AND name LIKE ");
        qb.push_bind(format!("%{search}%"));
    }
    qb.push(" ORDER BY expiration_date ASC");

    let rows = qb.build_query_as::<FoodItem>().fetch_all(db).await?;
    Ok(rows.into_iter().map(|item| item.refreshed(today)).collect())
}

/// Builds the UPDATE from exactly the supplied fields. Changing the
/// expiration date without an explicit status re-derives the status.
pub async fn update_item(
    db: &SqlitePool,
    id: Uuid,
    update: &UpdateItemRequest,
    today: Date,
) -> anyhow::Result<bool> {
    let now = OffsetDateTime::now_utc();
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE food_items SET ");
    {
        let mut fields = qb.separated(", ");
        if let Some(name) = &update.name {
            fields.push("name = ");
            fields.push_bind_unseparated(name.clone());
        }
        if let Some(category) = update.category {
            fields.push("category = ");
            fields.push_bind_unseparated(category);
        }
        if let Some(quantity) = update.quantity {
            fields.push("quantity = ");
            fields.push_bind_unseparated(quantity);
        }
        if let Some(unit) = &update.unit {
            fields.push("unit = ");
            fields.push_bind_unseparated(unit.clone());
        }
        if let Some(purchase_date) = update.purchase_date {
            fields.push("purchase_date = ");
            fields.push_bind_unseparated(purchase_date);
        }
        if let Some(expiration_date) = update.expiration_date {
            fields.push("expiration_date = ");
            fields.push_bind_unseparated(expiration_date);
        }
        if let Some(location) = update.storage_location {
            fields.push("storage_location = ");
            fields.push_bind_unseparated(location);
        }
        if let Some(status) = update.status {
            fields.push("status = ");
            fields.push_bind_unseparated(status);
        } else if let Some(expiration_date) = update.expiration_date {
            fields.push("status = ");
            fields.push_bind_unseparated(compute_status(expiration_date, today));
        }
        if let Some(disposition) = update.disposition {
            fields.push("disposition = ");
            fields.push_bind_unseparated(disposition);
        }
        if let Some(price) = update.price {
            fields.push("price = ");
            fields.push_bind_unseparated(price);
        }
        if let Some(currency) = &update.currency {
            fields.push("currency = ");
            fields.push_bind_unseparated(currency.clone());
        }
        if let Some(notes) = &update.notes {
            fields.push("notes = ");
            fields.push_bind_unseparated(notes.clone());
        }
        fields.push("updated_at = ");
        fields.push_bind_unseparated(now);
    }
    qb.push(" WHERE id = ");
    qb.push_bind(id);

    let result = qb.build().execute(db).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_item(db: &SqlitePool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM food_items WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Active items expiring within `[today, today + days_ahead]`, soonest first.
pub async fn expiring_items(
    db: &SqlitePool,
    days_ahead: i64,
    today: Date,
) -> anyhow::Result<Vec<FoodItem>> {
    let horizon = today + Duration::days(days_ahead);
    let rows = sqlx::query_as::<_, FoodItem>(
        r#"
        SELECT * FROM food_items
        WHERE disposition = 'active' AND expiration_date >= ? AND expiration_date <= ?
        ORDER BY expiration_date ASC
        "#,
    )
    .bind(today)
    .bind(horizon)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(|item| item.refreshed(today)).collect())
}

/// Active items whose expiration date is strictly before today, soonest first.
pub async fn expired_items(db: &SqlitePool, today: Date) -> anyhow::Result<Vec<FoodItem>> {
    let rows = sqlx::query_as::<_, FoodItem>(
        r#"
        SELECT * FROM food_items
        WHERE disposition = 'active' AND expiration_date < ?
        ORDER BY expiration_date ASC
        "#,
    )
    .bind(today)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(|item| item.refreshed(today)).collect())
}

/// Re-derive and persist the status of every active item in one
/// transaction, so readers never see a half-refreshed inventory.
pub async fn refresh_all_statuses(db: &SqlitePool, today: Date) -> anyhow::Result<()> {
    let horizon = today + Duration::days(EXPIRING_WINDOW_DAYS);
    let mut tx = db.begin().await?;
    sqlx::query(
        "UPDATE food_items SET status = 'expired' WHERE disposition = 'active' AND expiration_date < ?",
    )
    .bind(today)
    .execute(&mut *tx)
    .await?;
    sqlx::query(
        "UPDATE food_items SET status = 'expiring' WHERE disposition = 'active' AND expiration_date >= ? AND expiration_date <= ?",
    )
    .bind(today)
    .bind(horizon)
    .execute(&mut *tx)
    .await?;
    sqlx::query(
        "UPDATE food_items SET status = 'fresh' WHERE disposition = 'active' AND expiration_date > ?",
    )
    .bind(horizon)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(())
}

/// Counts and value of the current (active) inventory, after a bulk status
/// refresh. `SUM(price)` skips missing prices rather than counting zeros.
pub async fn inventory_stats(db: &SqlitePool, today: Date) -> anyhow::Result<InventoryStats> {
    refresh_all_statuses(db, today).await?;

    let (total, fresh, expiring, expired, total_value): (i64, i64, i64, i64, Option<f64>) =
        sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(CASE WHEN status = 'fresh' THEN 1 ELSE 0 END), 0),
                   COALESCE(SUM(CASE WHEN status = 'expiring' THEN 1 ELSE 0 END), 0),
                   COALESCE(SUM(CASE WHEN status = 'expired' THEN 1 ELSE 0 END), 0),
                   SUM(price)
            FROM food_items
            WHERE disposition = 'active'
            "#,
        )
        .fetch_one(db)
        .await?;

    let wasted_value: Option<f64> =
        sqlx::query_scalar("SELECT SUM(price) FROM food_items WHERE disposition = 'thrown_away'")
            .fetch_one(db)
            .await?;

    Ok(InventoryStats {
        total,
        fresh,
        expiring,
        expired,
        total_value: total_value.unwrap_or(0.0),
        wasted_value: wasted_value.unwrap_or(0.0),
    })
}

/// Tallies over items that left the inventory, split by how they left it.
pub async fn waste_stats(db: &SqlitePool) -> anyhow::Result<WasteStats> {
    let (total_wasted, total_consumed, wasted_value, saved_value): (
        i64,
        i64,
        Option<f64>,
        Option<f64>,
    ) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(CASE WHEN disposition = 'thrown_away' THEN 1 ELSE 0 END), 0),
               COALESCE(SUM(CASE WHEN disposition = 'consumed' THEN 1 ELSE 0 END), 0),
               SUM(CASE WHEN disposition = 'thrown_away' THEN price END),
               SUM(CASE WHEN disposition = 'consumed' THEN price END)
        FROM food_items
        WHERE disposition IN ('thrown_away', 'consumed')
        "#,
    )
    .fetch_one(db)
    .await?;

    let by_category = sqlx::query_as::<_, CategoryWaste>(
        r#"
        SELECT category,
               SUM(CASE WHEN disposition = 'thrown_away' THEN 1 ELSE 0 END) AS wasted,
               SUM(CASE WHEN disposition = 'consumed' THEN 1 ELSE 0 END) AS consumed
        FROM food_items
        WHERE disposition IN ('thrown_away', 'consumed')
        GROUP BY category
        "#,
    )
    .fetch_all(db)
    .await?;

    Ok(WasteStats {
        total_wasted,
        total_consumed,
        wasted_value: wasted_value.unwrap_or(0.0),
        saved_value: saved_value.unwrap_or(0.0),
        by_category,
    })
}
