use axum::{
    routing::{get, put},
    Router,
};

use crate::handlers::next_match;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/next-match", get(next_match::get_next_match))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route(
        "/next-match",
        put(next_match::save_next_match).post(next_match::save_next_match),
    )
}
