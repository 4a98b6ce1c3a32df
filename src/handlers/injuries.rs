use axum::{
    extract::State,
    response::Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::errors::{AppError, Result};
use crate::handlers::extract::{JsonBody, PathParam};
use crate::models::injury::{Injury, InjuryRequest, InjuryResponse};
use crate::state::AppState;

pub async fn list_injuries(State(state): State<AppState>) -> Result<Json<Vec<InjuryResponse>>> {
    let injuries = state.repos.injuries.list().await?;
    Ok(Json(injuries.into_iter().map(InjuryResponse::from).collect()))
}

pub async fn create_injury(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<InjuryRequest>,
) -> Result<Json<InjuryResponse>> {
    let (player_name, injury, expected_return, status) = payload.validate()?;

    let injury = state
        .repos
        .injuries
        .insert(Injury {
            id: 0,
            player_name,
            injury,
            expected_return,
            status,
            created_at: Utc::now(),
        })
        .await?;

    tracing::info!(injury_id = injury.id, player = %injury.player_name, "Injury recorded");
    Ok(Json(injury.into()))
}

pub async fn update_injury(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
    JsonBody(payload): JsonBody<InjuryRequest>,
) -> Result<Json<InjuryResponse>> {
    let mut injury = state
        .repos
        .injuries
        .find(id)
        .await?
        .ok_or(AppError::NotFound("Injury"))?;
    let (player_name, description, expected_return, status) = payload.validate()?;

    injury.player_name = player_name;
    injury.injury = description;
    injury.expected_return = expected_return;
    injury.status = status;
    state.repos.injuries.update(&injury).await?;

    Ok(Json(injury.into()))
}

pub async fn delete_injury(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> Result<Json<Value>> {
    if !state.repos.injuries.delete(id).await? {
        return Err(AppError::NotFound("Injury"));
    }
    tracing::info!(injury_id = id, "Injury deleted");
    Ok(Json(json!({ "success": true })))
}
