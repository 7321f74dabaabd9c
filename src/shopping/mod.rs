pub mod dto;
pub mod handlers;
pub mod repo;

use axum::{
    routing::{delete, get},
    Router,
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/shopping",
            get(handlers::list_items).post(handlers::create_item),
        )
        .route("/shopping/count", get(handlers::unchecked_count))
        .route("/shopping/checked", delete(handlers::clear_checked))
        .route(
            "/shopping/:id",
            axum::routing::patch(handlers::set_checked).delete(handlers::delete_item),
        )
}
