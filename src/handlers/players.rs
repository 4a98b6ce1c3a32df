use axum::{
    extract::{Request, State},
    response::Json,
};
use serde_json::{json, Value};

use crate::errors::{AppError, Result};
use crate::handlers::extract::PathParam;
use crate::handlers::upload::FormFields;
use crate::models::player::{
    parse_count, validate_name, validate_position, PlayerFields, PlayerResponse,
};
use crate::services::media_service::MediaKind;
use crate::state::AppState;

fn player_fields(form: &FormFields) -> Result<PlayerFields> {
    Ok(PlayerFields {
        name: validate_name(form.text("name").unwrap_or(""))?,
        number: parse_count("number", form.text("number"))?,
        position: validate_position(form.text("position").unwrap_or(""))?,
        height: form.text("height").unwrap_or("").trim().to_string(),
        goals: parse_count("goals", form.text("goals"))?,
        matches: parse_count("matches", form.text("matches"))?,
        description: form.text("description").unwrap_or("").trim().to_string(),
    })
}

pub async fn list_players(State(state): State<AppState>) -> Result<Json<Vec<PlayerResponse>>> {
    let players = state.repos.players.list().await?;
    Ok(Json(players.into_iter().map(PlayerResponse::from).collect()))
}

pub async fn get_player(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> Result<Json<PlayerResponse>> {
    let player = state
        .repos
        .players
        .find(id)
        .await?
        .ok_or(AppError::NotFound("Player"))?;
    Ok(Json(player.into()))
}

pub async fn create_player(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<PlayerResponse>> {
    let mut form = FormFields::read(request, "image", state.media.max_bytes()).await?;
    let fields = player_fields(&form)?;

    let swap = state
        .media
        .prepare(MediaKind::Player, "", form.image_change())
        .await?;
    let inserted = state
        .repos
        .players
        .insert(fields.into_player(swap.path().to_string()))
        .await;
    let player = state.media.settle(swap, inserted).await?;

    tracing::info!(player_id = player.id, name = %player.name, "Player created");
    Ok(Json(player.into()))
}

pub async fn update_player(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
    request: Request,
) -> Result<Json<PlayerResponse>> {
    let mut form = FormFields::read(request, "image", state.media.max_bytes()).await?;
    let mut player = state
        .repos
        .players
        .find(id)
        .await?
        .ok_or(AppError::NotFound("Player"))?;
    let fields = player_fields(&form)?;

    let swap = state
        .media
        .prepare(MediaKind::Player, &player.image, form.image_change())
        .await?;
    player.image = swap.path().to_string();
    fields.apply_to(&mut player);
    let written = state.repos.players.update(&player).await;
    state.media.settle(swap, written).await?;

    tracing::info!(player_id = player.id, "Player updated");
    Ok(Json(player.into()))
}

pub async fn delete_player(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> Result<Json<Value>> {
    let player = state
        .repos
        .players
        .find(id)
        .await?
        .ok_or(AppError::NotFound("Player"))?;

    state.repos.players.delete(id).await?;
    state.media.remove(&player.image).await;

    tracing::info!(player_id = id, "Player deleted");
    Ok(Json(json!({ "success": true })))
}
