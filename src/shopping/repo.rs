use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::types::FoodCategory;

/// A checklist entry. `source_item_id` is a plain stored identifier of the
/// food item it was created from, with no lifecycle coupling.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShoppingListItem {
    pub id: Uuid,
    pub name: String,
    pub category: FoodCategory,
    pub quantity: f64,
    pub unit: String,
    pub checked: bool,
    pub source_item_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug)]
pub struct NewShoppingItem {
    pub name: String,
    pub category: FoodCategory,
    pub quantity: f64,
    pub unit: String,
    pub source_item_id: Option<Uuid>,
}

pub async fn insert_item(
    db: &SqlitePool,
    new: NewShoppingItem,
) -> anyhow::Result<ShoppingListItem> {
    let id = Uuid::new_v4();
    let now = OffsetDateTime::now_utc();
    sqlx::query(
        r#"
        INSERT INTO shopping_list (id, name, category, quantity, unit, checked, source_item_id, created_at)
        VALUES (?, ?, ?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(id)
    .bind(&new.name)
    .bind(new.category)
    .bind(new.quantity)
    .bind(&new.unit)
    .bind(new.source_item_id)
    .bind(now)
    .execute(db)
    .await?;

    Ok(ShoppingListItem {
        id,
        name: new.name,
        category: new.category,
        quantity: new.quantity,
        unit: new.unit,
        checked: false,
        source_item_id: new.source_item_id,
        created_at: now,
    })
}

/// Unchecked entries first, newest first within each group.
pub async fn list_items(db: &SqlitePool) -> anyhow::Result<Vec<ShoppingListItem>> {
    let rows = sqlx::query_as::<_, ShoppingListItem>(
        "SELECT * FROM shopping_list ORDER BY checked ASC, created_at DESC",
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn set_checked(db: &SqlitePool, id: Uuid, checked: bool) -> anyhow::Result<bool> {
    let result = sqlx::query("UPDATE shopping_list SET checked = ? WHERE id = ?")
        .bind(checked)
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_item(db: &SqlitePool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM shopping_list WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn clear_checked(db: &SqlitePool) -> anyhow::Result<u64> {
    let result = sqlx::query("DELETE FROM shopping_list WHERE checked = 1")
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

/// How many entries are still to buy.
pub async fn unchecked_count(db: &SqlitePool) -> anyhow::Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM shopping_list WHERE checked = 0")
            .fetch_one(db)
            .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_pool;

    fn new_entry(name: &str) -> NewShoppingItem {
        NewShoppingItem {
            name: name.to_string(),
            category: FoodCategory::Other,
            quantity: 1.0,
            unit: "pcs".to_string(),
            source_item_id: None,
        }
    }

    #[tokio::test]
    async fn unchecked_entries_sort_before_checked_ones() {
        let db = test_pool().await;
        let bread = insert_item(&db, new_entry("bread")).await.unwrap();
        insert_item(&db, new_entry("milk")).await.unwrap();
        assert!(set_checked(&db, bread.id, true).await.unwrap());

        let items = list_items(&db).await.unwrap();
        let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["milk", "bread"]);
        assert!(!items[0].checked);
        assert!(items[1].checked);
    }

    #[tokio::test]
    async fn toggling_and_counting() {
        let db = test_pool().await;
        let a = insert_item(&db, new_entry("rice")).await.unwrap();
        insert_item(&db, new_entry("beans")).await.unwrap();
        assert_eq!(unchecked_count(&db).await.unwrap(), 2);

        set_checked(&db, a.id, true).await.unwrap();
        assert_eq!(unchecked_count(&db).await.unwrap(), 1);

        set_checked(&db, a.id, false).await.unwrap();
        assert_eq!(unchecked_count(&db).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn clear_checked_removes_only_checked_entries() {
        let db = test_pool().await;
        let a = insert_item(&db, new_entry("salt")).await.unwrap();
        let b = insert_item(&db, new_entry("pepper")).await.unwrap();
        set_checked(&db, a.id, true).await.unwrap();

        assert_eq!(clear_checked(&db).await.unwrap(), 1);
        let items = list_items(&db).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, b.id);
    }

    #[tokio::test]
    async fn missing_ids_report_nothing_done() {
        let db = test_pool().await;
        assert!(!set_checked(&db, Uuid::new_v4(), true).await.unwrap());
        assert!(!delete_item(&db, Uuid::new_v4()).await.unwrap());
    }
}
