use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers::{comments, news};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/news", get(news::list_news))
        .route("/news/:id", get(news::get_news))
        .route("/news/:id/comments", post(comments::create_comment))
        // POST aliases for clients behind proxies that drop PUT and DELETE
        .route(
            "/comments/:id",
            put(comments::edit_comment).delete(comments::delete_comment),
        )
        .route("/comments/:id/edit", post(comments::edit_comment))
        .route("/comments/:id/delete", post(comments::delete_comment))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/news", post(news::create_news))
        .route("/news/:id", put(news::update_news).delete(news::delete_news))
        .route("/comments/:id", delete(comments::admin_delete_comment))
}
