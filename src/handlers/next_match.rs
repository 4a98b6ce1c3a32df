use axum::{extract::State, response::Json, Extension};

use crate::errors::Result;
use crate::handlers::extract::JsonBody;
use crate::models::next_match::{NextMatchPayload, NextMatchState, NextMatchUpdate};
use crate::models::user::Claims;
use crate::state::AppState;

pub async fn get_next_match(State(state): State<AppState>) -> Result<Json<NextMatchState>> {
    Ok(Json(state.next_match.get().await?))
}

/// Upsert for both `PUT` and `POST`; some proxies drop `PUT`.
pub async fn save_next_match(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    JsonBody(payload): JsonBody<NextMatchPayload>,
) -> Result<Json<NextMatchState>> {
    let update = NextMatchUpdate::try_from(payload)?;
    let saved = state.next_match.upsert(update).await?;
    tracing::info!(admin = %claims.username, date = %saved.match_date, "Next match saved");
    Ok(Json(saved))
}
