use axum::{
    extract::{Request, State},
    response::Json,
    Extension,
};
use bcrypt::{hash, verify};
use serde_json::{json, Value};
use validator::Validate;

use crate::dtos::auth_dtos::{LoginRequest, RegisterRequest};
use crate::errors::{AppError, Result};
use crate::handlers::extract::JsonBody;
use crate::handlers::upload::FormFields;
use crate::middleware::auth::current_user;
use crate::models::user::{AuthResponse, Claims, User, UserResponse};
use crate::services::media_service::MediaKind;
use crate::state::AppState;

pub(crate) const MIN_USERNAME_LENGTH: usize = 3;

fn auth_response(state: &AppState, user: &User) -> Result<Json<AuthResponse>> {
    let token = state.tokens.issue(user)?;
    Ok(Json(AuthResponse {
        user: UserResponse::from(user),
        token,
    }))
}

/// Checked before any image is touched so that a rename conflict leaves the
/// account unchanged.
pub(crate) async fn ensure_username_free(state: &AppState, username: &str, owner: i64) -> Result<()> {
    match state.repos.users.find_by_username(username).await? {
        Some(other) if other.id != owner => Err(AppError::DuplicateKey),
        _ => Ok(()),
    }
}

pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<Json<AuthResponse>> {
    payload.validate()?;
    let username = payload.username.trim().to_string();

    if state.repos.users.find_by_username(&username).await?.is_some() {
        return Err(AppError::DuplicateKey);
    }

    let password_hash = hash(&payload.password, state.config.bcrypt_cost)?;
    let user = state
        .repos
        .users
        .insert(User::new(username, password_hash))
        .await?;

    tracing::info!(user_id = user.id, username = %user.username, "User registered");
    auth_response(&state, &user)
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    payload.validate()?;

    let user = state
        .repos
        .users
        .find_by_username(payload.username.trim())
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify(&payload.password, &user.password_hash)? {
        tracing::debug!(username = %user.username, "Rejected login with wrong password");
        return Err(AppError::InvalidCredentials);
    }

    auth_response(&state, &user)
}

/// Shared by `/api/me` and `GET /api/profile`.
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>> {
    let user = state
        .repos
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    Ok(Json(json!({ "user": UserResponse::from(&user) })))
}

/// Self-service edit of username and avatar. Returns a fresh token since
/// the username is part of the claims.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    request: Request,
) -> Result<Json<AuthResponse>> {
    let mut form = FormFields::read(request, "avatar", state.media.max_bytes()).await?;
    let mut user = current_user(&state, &claims).await?;

    if let Some(username) = form.non_blank("username") {
        if username.chars().count() < MIN_USERNAME_LENGTH {
            return Err(AppError::invalid_data(
                "Username deve avere almeno 3 caratteri",
            ));
        }
        if username != user.username {
            ensure_username_free(&state, username, user.id).await?;
            user.username = username.to_string();
        }
    }

    let swap = state
        .media
        .prepare(MediaKind::User, &user.avatar, form.image_change())
        .await?;
    user.avatar = swap.path().to_string();
    let written = state.repos.users.update(&user).await;
    state.media.settle(swap, written).await?;

    tracing::info!(user_id = user.id, "Profile updated");
    auth_response(&state, &user)
}
