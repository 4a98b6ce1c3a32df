use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::players;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/players", get(players::list_players))
        .route("/players/:id", get(players::get_player))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/players", post(players::create_player))
        .route(
            "/players/:id",
            put(players::update_player).delete(players::delete_player),
        )
}
