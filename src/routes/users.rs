use axum::{
    routing::{get, put},
    Router,
};

use crate::handlers::users;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/users", get(users::list_public_users))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(users::admin_list_users))
        .route("/users/:id", put(users::admin_update_user))
}
