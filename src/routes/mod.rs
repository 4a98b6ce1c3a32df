use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::upload::serve_image;
use crate::middleware::auth::{auth_middleware, require_admin};
use crate::state::AppState;

pub mod auth;
pub mod injuries;
pub mod news;
pub mod next_match;
pub mod players;
pub mod users;

/// Room for the text fields and multipart framing around a full-size image.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let admin = Router::new()
        .merge(players::admin_routes())
        .merge(news::admin_routes())
        .merge(injuries::admin_routes())
        .merge(next_match::admin_routes())
        .merge(users::admin_routes())
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    let authenticated = Router::new()
        .merge(auth::routes())
        .merge(players::routes())
        .merge(news::routes())
        .merge(injuries::routes())
        .merge(next_match::routes())
        .merge(users::routes())
        .nest("/admin", admin)
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let api = Router::new()
        .route("/health", get(health_check))
        .merge(auth::public_routes())
        .merge(authenticated);

    let body_limit = state.config.max_upload_bytes + FORM_OVERHEAD_BYTES;
    let cors = cors_layer(&state.config.cors_origin);

    Router::new()
        .nest("/api", api)
        .route("/uploads/:file_name", get(serve_image))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let allow_origin = match origin.trim() {
        "" | "*" => AllowOrigin::from(Any),
        exact => match HeaderValue::from_str(exact) {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                tracing::warn!(origin = %exact, "Invalid CORS_ORIGIN, allowing any origin");
                AllowOrigin::from(Any)
            }
        },
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(false)
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "ok": true,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
