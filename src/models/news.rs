use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, Result};

pub const MAX_COMMENT_LENGTH: usize = 2000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct News {
    #[serde(rename = "_id")]
    pub id: i64,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub image: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: i64,
    pub news_id: i64,
    pub user_id: i64,
    /// Username at the time the comment was posted.
    pub username: String,
    #[serde(default)]
    pub avatar: String,
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    #[serde(default)]
    pub content: String,
}

/// Author details looked up at read time.
#[derive(Debug, Clone, Default)]
pub struct AuthorInfo {
    pub avatar: String,
    pub verified: bool,
}

#[derive(Debug, Serialize)]
pub struct CommentView {
    pub id: i64,
    pub news_id: i64,
    pub user_id: i64,
    pub username: String,
    pub content: String,
    /// Snapshot avatar, else the author's current one.
    pub avatar: String,
    pub verified: bool,
    pub parent_id: Option<i64>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replies: Option<Vec<CommentView>>,
}

impl CommentView {
    pub fn resolve(comment: Comment, author: Option<&AuthorInfo>) -> Self {
        let avatar = if comment.avatar.is_empty() {
            author.map(|a| a.avatar.clone()).unwrap_or_default()
        } else {
            comment.avatar
        };
        CommentView {
            id: comment.id,
            news_id: comment.news_id,
            user_id: comment.user_id,
            username: comment.username,
            content: comment.content,
            avatar,
            verified: author.map(|a| a.verified).unwrap_or(false),
            parent_id: comment.parent_id,
            deleted: comment.deleted,
            created_at: comment.created_at,
            replies: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NewsView {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub comments: Vec<CommentView>,
    #[serde(rename = "commentCount")]
    pub comment_count: usize,
}

impl NewsView {
    /// Groups `comments` (oldest first) into top-level entries with their
    /// direct replies. Replies whose parent is gone are shown top-level.
    pub fn assemble(
        news: News,
        comments: Vec<Comment>,
        authors: &HashMap<i64, AuthorInfo>,
    ) -> Self {
        let comment_count = comments.len();
        let top_ids: Vec<i64> = comments
            .iter()
            .filter(|c| c.is_top_level())
            .map(|c| c.id)
            .collect();

        let mut top: Vec<CommentView> = Vec::new();
        let mut replies: HashMap<i64, Vec<CommentView>> = HashMap::new();
        for comment in comments {
            let parent = comment.parent_id.filter(|p| top_ids.contains(p));
            let author = authors.get(&comment.user_id);
            let view = CommentView::resolve(comment, author);
            match parent {
                Some(parent_id) => replies.entry(parent_id).or_default().push(view),
                None => top.push(view),
            }
        }
        for view in top.iter_mut() {
            view.replies = Some(replies.remove(&view.id).unwrap_or_default());
        }

        NewsView {
            id: news.id,
            title: news.title,
            content: news.content,
            image: news.image,
            created_at: news.created_at,
            comments: top,
            comment_count,
        }
    }
}

pub fn validate_comment(content: &str) -> Result<String> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::invalid_data("Commento vuoto"));
    }
    if content.chars().count() > MAX_COMMENT_LENGTH {
        return Err(AppError::invalid_data(format!(
            "Comment must be at most {} characters",
            MAX_COMMENT_LENGTH
        )));
    }
    Ok(content.to_string())
}

pub fn validate_news(title: &str, content: &str) -> Result<(String, String)> {
    let (title, content) = (title.trim(), content.trim());
    if title.is_empty() || content.is_empty() {
        return Err(AppError::invalid_data("Titolo e contenuto obbligatori"));
    }
    Ok((title.to_string(), content.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: i64, user_id: i64, parent_id: Option<i64>, avatar: &str) -> Comment {
        Comment {
            id,
            news_id: 1,
            user_id,
            username: format!("user{}", user_id),
            avatar: avatar.to_string(),
            content: format!("comment {}", id),
            parent_id,
            deleted: false,
            created_at: Utc::now(),
        }
    }

    fn news() -> News {
        News {
            id: 1,
            title: "Primo turno disputato".to_string(),
            content: "Tutte le squadre sono scese in campo.".to_string(),
            image: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn replies_are_nested_under_their_parent() {
        let comments = vec![
            comment(10, 1, None, ""),
            comment(11, 2, Some(10), ""),
            comment(12, 2, None, ""),
            comment(13, 1, Some(10), ""),
        ];
        let view = NewsView::assemble(news(), comments, &HashMap::new());

        assert_eq!(view.comment_count, 4);
        assert_eq!(view.comments.len(), 2);
        let replies = view.comments[0].replies.as_ref().unwrap();
        assert_eq!(replies.iter().map(|r| r.id).collect::<Vec<_>>(), vec![11, 13]);
        assert!(view.comments[1].replies.as_ref().unwrap().is_empty());
    }

    #[test]
    fn orphan_replies_surface_at_top_level() {
        let view = NewsView::assemble(news(), vec![comment(20, 1, Some(99), "")], &HashMap::new());
        assert_eq!(view.comments.len(), 1);
        assert_eq!(view.comments[0].id, 20);
    }

    #[test]
    fn avatar_falls_back_to_author_and_verified_comes_from_author() {
        let mut authors = HashMap::new();
        authors.insert(
            1,
            AuthorInfo { avatar: "/uploads/user-1.png".to_string(), verified: true },
        );
        let comments = vec![comment(1, 1, None, ""), comment(2, 1, None, "/uploads/user-0.png")];
        let view = NewsView::assemble(news(), comments, &authors);

        assert_eq!(view.comments[0].avatar, "/uploads/user-1.png");
        assert_eq!(view.comments[1].avatar, "/uploads/user-0.png");
        assert!(view.comments.iter().all(|c| c.verified));
    }

    #[test]
    fn comment_content_rules() {
        assert_eq!(validate_comment("  forza!  ").unwrap(), "forza!");
        assert!(validate_comment("   ").is_err());
        assert!(validate_comment(&"x".repeat(MAX_COMMENT_LENGTH + 1)).is_err());
        assert!(validate_news("Titolo", " ").is_err());
    }
}
