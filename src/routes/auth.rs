use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::auth;
use crate::state::AppState;

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(auth::me))
        .route("/profile", get(auth::me).put(auth::update_profile))
}
