pub mod handlers;
pub mod repo;

use axum::{routing::get, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/settings",
        get(handlers::get_settings).patch(handlers::update_settings),
    )
}
