use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::injuries;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/injuries", get(injuries::list_injuries))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/injuries", post(injuries::create_injury))
        .route(
            "/injuries/:id",
            put(injuries::update_injury).delete(injuries::delete_injury),
        )
}
