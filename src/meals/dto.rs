use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use crate::meals::repo::{Meal, MealItem};
use crate::types::MealType;

#[derive(Debug, Deserialize)]
pub struct CreateMealRequest {
    pub name: String,
    pub meal_type: MealType,
    pub date: Date,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub fats: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub serving_size: String,
    #[serde(default)]
    pub emoji: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub items: Vec<CreateMealItem>,
}

fn default_source() -> String {
    "manual".to_string()
}

#[derive(Debug, Deserialize)]
pub struct CreateMealItem {
    pub food_item_id: Option<Uuid>,
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub fats: f64,
    #[serde(default)]
    pub carbs: f64,
}

fn default_quantity() -> f64 {
    1.0
}

fn default_unit() -> String {
    "pcs".to_string()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateMealRequest {
    pub name: Option<String>,
    pub meal_type: Option<MealType>,
    pub date: Option<Date>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub fats: Option<f64>,
    pub carbs: Option<f64>,
    pub serving_size: Option<String>,
    pub emoji: Option<String>,
    pub notes: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MealsQuery {
    pub date: Date,
    pub meal_type: Option<MealType>,
}

#[derive(Debug, Deserialize)]
pub struct DailyNutritionQuery {
    pub date: Date,
}

#[derive(Debug, Serialize)]
pub struct MealDetails {
    #[serde(flatten)]
    pub meal: Meal,
    pub items: Vec<MealItem>,
}
