use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::FoodCategory;

#[derive(Debug, Deserialize)]
pub struct CreateShoppingItemRequest {
    pub name: String,
    #[serde(default = "default_category")]
    pub category: FoodCategory,
    #[serde(default = "default_quantity")]
    pub quantity: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    pub source_item_id: Option<Uuid>,
}

fn default_category() -> FoodCategory {
    FoodCategory::Other
}

fn default_quantity() -> f64 {
    1.0
}

fn default_unit() -> String {
    "pcs".to_string()
}

#[derive(Debug, Deserialize)]
pub struct SetCheckedRequest {
    pub checked: bool,
}

#[derive(Debug, Serialize)]
pub struct ShoppingCount {
    pub count: i64,
}
