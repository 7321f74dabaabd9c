pub mod dto;
pub mod handlers;
pub mod repo;

use axum::{routing::get, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/items", get(handlers::list_items).post(handlers::create_item))
        .route("/items/expiring", get(handlers::expiring_items))
        .route("/items/expired", get(handlers::expired_items))
        .route(
            "/items/:id",
            get(handlers::get_item)
                .patch(handlers::update_item)
                .delete(handlers::delete_item),
        )
        .route("/stats/inventory", get(handlers::inventory_stats))
        .route("/stats/waste", get(handlers::waste_stats))
}
