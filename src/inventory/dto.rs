use serde::{Deserialize, Deserializer, Serialize};
use time::Date;

use crate::inventory::repo::FoodItem;
use crate::status::expiration_label;
use crate::types::{FoodCategory, FoodStatus, ItemDisposition, StorageLocation};

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    #[serde(default = "default_category")]
    pub category: FoodCategory,
    #[serde(default = "default_quantity")]
    pub quantity: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    pub purchase_date: Option<Date>,
    pub expiration_date: Date,
    #[serde(default = "default_location")]
    pub storage_location: StorageLocation,
    pub price: Option<f64>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub notes: String,
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

fn default_location() -> StorageLocation {
    StorageLocation::Fridge
}

fn default_currency() -> String {
    "MXN".to_string()
}

/// Partial update; only supplied fields are written. `price` distinguishes
/// "absent" from an explicit `null`, which clears the stored price.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub category: Option<FoodCategory>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub purchase_date: Option<Date>,
    pub expiration_date: Option<Date>,
    pub storage_location: Option<StorageLocation>,
    pub status: Option<FoodStatus>,
    pub disposition: Option<ItemDisposition>,
    #[serde(deserialize_with = "double_option")]
    pub price: Option<Option<f64>>,
    pub currency: Option<String>,
    pub notes: Option<String>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ItemFilter {
    pub category: Option<FoodCategory>,
    pub storage_location: Option<StorageLocation>,
    pub disposition: Option<ItemDisposition>,
    pub status: Option<FoodStatus>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExpiringQuery {
    #[serde(default = "default_days_ahead")]
    pub days: i64,
}

fn default_days_ahead() -> i64 {
    3
}

#[derive(Debug, Serialize)]
pub struct FoodItemResponse {
    #[serde(flatten)]
    pub item: FoodItem,
    pub expiration_label: String,
}

impl FoodItemResponse {
    pub fn new(item: FoodItem, today: Date) -> Self {
        let expiration_label = expiration_label(item.expiration_date, today);
        Self {
            item,
            expiration_label,
        }
    }
}
