use serde::{Deserialize, Serialize};

use crate::ai::recipes::RecipeSuggestion;

#[derive(Debug, Deserialize)]
pub struct ScanLabelRequest {
    pub image_base64: String,
}

#[derive(Debug, Deserialize)]
pub struct RecipesRequest {
    #[serde(default = "default_count")]
    pub count: u32,
}

fn default_count() -> u32 {
    3
}

#[derive(Debug, Serialize)]
pub struct RecipesResponse {
    pub recipes: Vec<RecipeSuggestion>,
}
