pub mod client;
mod dto;
pub mod error;
pub mod handlers;
pub mod label;
pub mod recipes;

use axum::{routing::post, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ai/scan-label", post(handlers::scan_label))
        .route("/ai/recipes", post(handlers::suggest_recipes))
}
