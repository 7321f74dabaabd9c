use serde::{Deserialize, Serialize};

/// Closed set of food categories. Stored as snake_case TEXT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum FoodCategory {
    Fruits,
    Vegetables,
    Dairy,
    Cereals,
    Canned,
    Meat,
    Frozen,
    Beverages,
    Condiments,
    Snacks,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum StorageLocation {
    Fridge,
    Freezer,
    Pantry,
    Counter,
}

/// Derived freshness classification of an item, relative to a reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum FoodStatus {
    Fresh,
    Expiring,
    Expired,
}

/// Fate of an item. `Consumed` and `ThrownAway` are terminal; once an item
/// leaves `Active` its status freezes and it drops out of inventory counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ItemDisposition {
    Active,
    Consumed,
    ThrownAway,
}

impl ItemDisposition {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ItemDisposition::Active)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    Dark,
    System,
}
