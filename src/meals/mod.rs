pub mod dto;
pub mod handlers;
pub mod repo;

use axum::{routing::get, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/meals", get(handlers::list_meals).post(handlers::create_meal))
        .route(
            "/meals/:id",
            get(handlers::get_meal)
                .patch(handlers::update_meal)
                .delete(handlers::delete_meal),
        )
        .route("/nutrition/daily", get(handlers::daily_nutrition))
}
