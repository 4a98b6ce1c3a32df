use axum::{
    extract::{Request, State},
    response::Json,
};

use crate::errors::{AppError, Result};
use crate::handlers::auth::{ensure_username_free, MIN_USERNAME_LENGTH};
use crate::handlers::extract::PathParam;
use crate::handlers::upload::FormFields;
use crate::models::user::{AdminUserView, PublicUser};
use crate::services::media_service::MediaKind;
use crate::state::AppState;

pub async fn admin_list_users(State(state): State<AppState>) -> Result<Json<Vec<AdminUserView>>> {
    let users = state.repos.users.list().await?;
    Ok(Json(users.into_iter().map(AdminUserView::from).collect()))
}

pub async fn list_public_users(State(state): State<AppState>) -> Result<Json<Vec<PublicUser>>> {
    let users = state.repos.users.list().await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

/// Admin edit of username, verified badge and avatar. The admin flag is not
/// editable here.
pub async fn admin_update_user(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
    request: Request,
) -> Result<Json<AdminUserView>> {
    let mut form = FormFields::read(request, "avatar", state.media.max_bytes()).await?;
    let mut user = state
        .repos
        .users
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

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
    if let Some(verified) = form.flag("verified") {
        user.verified = verified;
    }

    let swap = state
        .media
        .prepare(MediaKind::User, &user.avatar, form.image_change())
        .await?;
    user.avatar = swap.path().to_string();
    let written = state.repos.users.update(&user).await;
    state.media.settle(swap, written).await?;

    tracing::info!(user_id = user.id, verified = user.verified, "User updated by admin");
    Ok(Json(user.into()))
}
