use std::collections::HashMap;

use axum::{
    extract::{Request, State},
    response::Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::errors::{AppError, Result};
use crate::handlers::extract::PathParam;
use crate::handlers::upload::FormFields;
use crate::models::news::{validate_news, AuthorInfo, Comment, News, NewsView};
use crate::services::media_service::MediaKind;
use crate::state::AppState;

/// Current avatar and verified flag of every author in `comments`.
pub(crate) async fn author_infos(
    state: &AppState,
    comments: &[Comment],
) -> Result<HashMap<i64, AuthorInfo>> {
    let mut authors = HashMap::new();
    for comment in comments {
        if authors.contains_key(&comment.user_id) {
            continue;
        }
        if let Some(user) = state.repos.users.find_by_id(comment.user_id).await? {
            authors.insert(
                user.id,
                AuthorInfo {
                    avatar: user.avatar,
                    verified: user.verified,
                },
            );
        }
    }
    Ok(authors)
}

async fn news_view(state: &AppState, news: News) -> Result<NewsView> {
    let comments = state.repos.comments.list_for_news(news.id).await?;
    let authors = author_infos(state, &comments).await?;
    Ok(NewsView::assemble(news, comments, &authors))
}

pub async fn list_news(State(state): State<AppState>) -> Result<Json<Vec<NewsView>>> {
    let mut views = Vec::new();
    for news in state.repos.news.list().await? {
        views.push(news_view(&state, news).await?);
    }
    Ok(Json(views))
}

pub async fn get_news(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> Result<Json<NewsView>> {
    let news = state
        .repos
        .news
        .find(id)
        .await?
        .ok_or(AppError::NotFound("News"))?;
    Ok(Json(news_view(&state, news).await?))
}

pub async fn create_news(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<NewsView>> {
    let mut form = FormFields::read(request, "image", state.media.max_bytes()).await?;
    let (title, content) = validate_news(
        form.text("title").unwrap_or(""),
        form.text("content").unwrap_or(""),
    )?;

    let swap = state
        .media
        .prepare(MediaKind::News, "", form.image_change())
        .await?;
    let inserted = state
        .repos
        .news
        .insert(News {
            id: 0,
            title,
            content,
            image: swap.path().to_string(),
            created_at: Utc::now(),
        })
        .await;
    let news = state.media.settle(swap, inserted).await?;

    tracing::info!(news_id = news.id, "News published");
    Ok(Json(NewsView::assemble(news, Vec::new(), &HashMap::new())))
}

pub async fn update_news(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
    request: Request,
) -> Result<Json<NewsView>> {
    let mut form = FormFields::read(request, "image", state.media.max_bytes()).await?;
    let mut news = state
        .repos
        .news
        .find(id)
        .await?
        .ok_or(AppError::NotFound("News"))?;
    let (title, content) = validate_news(
        form.text("title").unwrap_or(""),
        form.text("content").unwrap_or(""),
    )?;

    let swap = state
        .media
        .prepare(MediaKind::News, &news.image, form.image_change())
        .await?;
    news.image = swap.path().to_string();
    news.title = title;
    news.content = content;
    let written = state.repos.news.update(&news).await;
    state.media.settle(swap, written).await?;

    tracing::info!(news_id = news.id, "News updated");
    Ok(Json(news_view(&state, news).await?))
}

/// Removes the item together with all of its comments and its image.
pub async fn delete_news(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> Result<Json<Value>> {
    let news = state
        .repos
        .news
        .find(id)
        .await?
        .ok_or(AppError::NotFound("News"))?;

    let comments = state.repos.comments.delete_for_news(id).await?;
    state.repos.news.delete(id).await?;
    state.media.remove(&news.image).await;

    tracing::info!(news_id = id, comments, "News deleted");
    Ok(Json(json!({ "success": true })))
}
