use axum::{
    extract::State,
    response::Json,
    Extension,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::errors::{AppError, Result};
use crate::handlers::extract::{JsonBody, PathParam};
use crate::middleware::auth::current_user;
use crate::models::news::{
    validate_comment, AuthorInfo, Comment, CommentView, CreateCommentRequest,
    UpdateCommentRequest,
};
use crate::models::user::Claims;
use crate::state::AppState;

async fn find_comment(state: &AppState, id: i64) -> Result<Comment> {
    state
        .repos
        .comments
        .find(id)
        .await?
        .ok_or(AppError::NotFound("Comment"))
}

/// Who may act on a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Actor {
    Author,
    Admin,
}

async fn authorize(state: &AppState, claims: &Claims, comment: &Comment) -> Result<Actor> {
    let user = current_user(state, claims).await?;
    if user.is_admin {
        Ok(Actor::Admin)
    } else if user.id == comment.user_id {
        Ok(Actor::Author)
    } else {
        Err(AppError::Forbidden)
    }
}

async fn view(state: &AppState, comment: Comment) -> Result<CommentView> {
    let author = state
        .repos
        .users
        .find_by_id(comment.user_id)
        .await?
        .map(|u| AuthorInfo {
            avatar: u.avatar,
            verified: u.verified,
        });
    Ok(CommentView::resolve(comment, author.as_ref()))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    PathParam(news_id): PathParam<i64>,
    JsonBody(payload): JsonBody<CreateCommentRequest>,
) -> Result<Json<CommentView>> {
    let content = validate_comment(&payload.content)?;
    if state.repos.news.find(news_id).await?.is_none() {
        return Err(AppError::NotFound("News"));
    }

    if let Some(parent_id) = payload.parent_id {
        let valid_parent = state
            .repos
            .comments
            .find(parent_id)
            .await?
            .is_some_and(|p| p.news_id == news_id && p.is_top_level() && !p.deleted);
        if !valid_parent {
            return Err(AppError::invalid_data("Risposta non valida"));
        }
    }

    let user = current_user(&state, &claims).await?;
    let comment = state
        .repos
        .comments
        .insert(Comment {
            id: 0,
            news_id,
            user_id: user.id,
            username: user.username.clone(),
            avatar: user.avatar.clone(),
            content,
            parent_id: payload.parent_id,
            deleted: false,
            created_at: Utc::now(),
        })
        .await?;

    tracing::debug!(comment_id = comment.id, news_id, user_id = user.id, "Comment posted");
    let author = AuthorInfo {
        avatar: user.avatar,
        verified: user.verified,
    };
    Ok(Json(CommentView::resolve(comment, Some(&author))))
}

/// Handles both `PUT /comments/:id` and `POST /comments/:id/edit`.
pub async fn edit_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    PathParam(id): PathParam<i64>,
    JsonBody(payload): JsonBody<UpdateCommentRequest>,
) -> Result<Json<CommentView>> {
    let content = validate_comment(&payload.content)?;
    let mut comment = find_comment(&state, id).await?;
    if comment.deleted {
        return Err(AppError::NotFound("Comment"));
    }
    authorize(&state, &claims, &comment).await?;

    comment.content = content;
    state.repos.comments.update(&comment).await?;
    Ok(Json(view(&state, comment).await?))
}

/// Handles both `DELETE /comments/:id` and `POST /comments/:id/delete`.
/// Admins remove the thread; an author removing a top-level comment that
/// has replies only blanks it.
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    PathParam(id): PathParam<i64>,
) -> Result<Json<Value>> {
    let mut comment = find_comment(&state, id).await?;

    match authorize(&state, &claims, &comment).await? {
        Actor::Admin => {
            let removed = state.repos.comments.delete_with_replies(id).await?;
            tracing::info!(comment_id = id, removed, "Comment thread deleted by admin");
        }
        Actor::Author => {
            let has_replies =
                comment.is_top_level() && state.repos.comments.count_replies(id).await? > 0;
            if has_replies {
                comment.deleted = true;
                comment.content.clear();
                state.repos.comments.update(&comment).await?;
            } else {
                state.repos.comments.delete(id).await?;
            }
            tracing::debug!(comment_id = id, soft = has_replies, "Comment deleted by author");
        }
    }

    Ok(Json(json!({ "success": true })))
}

pub async fn admin_delete_comment(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> Result<Json<Value>> {
    let removed = state.repos.comments.delete_with_replies(id).await?;
    if removed == 0 {
        return Err(AppError::NotFound("Comment"));
    }
    tracing::info!(comment_id = id, removed, "Comment thread deleted by admin");
    Ok(Json(json!({ "success": true, "removed": removed })))
}
