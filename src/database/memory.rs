use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::database::{
    CommentRepository, InjuryRepository, NewsRepository, NextMatchRepository, PlayerRepository,
    UserRepository,
};
use crate::errors::{AppError, Result};
use crate::models::injury::Injury;
use crate::models::news::{Comment, News};
use crate::models::next_match::NextMatchRecord;
use crate::models::player::Player;
use crate::models::user::User;

#[derive(Default)]
struct Tables {
    seq: i64,
    users: BTreeMap<i64, User>,
    players: BTreeMap<i64, Player>,
    news: BTreeMap<i64, News>,
    comments: BTreeMap<i64, Comment>,
    injuries: BTreeMap<i64, Injury>,
    next_match: Option<NextMatchRecord>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.seq += 1;
        self.seq
    }

    fn username_taken(&self, username: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.username == username && Some(u.id) != except)
    }
}

/// Process-local store. Writers are serialized by the lock; ids come from a
/// single sequence shared by all tables.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn list(&self) -> Result<Vec<User>> {
        Ok(self.tables.read().await.users.values().rev().cloned().collect())
    }

    async fn insert(&self, mut user: User) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.username_taken(&user.username, None) {
            return Err(AppError::DuplicateKey);
        }
        user.id = tables.next_id();
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user.id) {
            return Err(AppError::NotFound("User"));
        }
        if tables.username_taken(&user.username, Some(user.id)) {
            return Err(AppError::DuplicateKey);
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn demote_admins_except(&self, username: &str) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let mut demoted = 0;
        for user in tables.users.values_mut() {
            if user.is_admin && user.username != username {
                user.is_admin = false;
                demoted += 1;
            }
        }
        Ok(demoted)
    }
}

#[async_trait]
impl PlayerRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<Player>> {
        let mut players: Vec<Player> = self.tables.read().await.players.values().cloned().collect();
        players.sort_by(|a, b| b.goals.cmp(&a.goals).then(a.id.cmp(&b.id)));
        Ok(players)
    }

    async fn find(&self, id: i64) -> Result<Option<Player>> {
        Ok(self.tables.read().await.players.get(&id).cloned())
    }

    async fn insert(&self, mut player: Player) -> Result<Player> {
        let mut tables = self.tables.write().await;
        player.id = tables.next_id();
        tables.players.insert(player.id, player.clone());
        Ok(player)
    }

    async fn update(&self, player: &Player) -> Result<()> {
        let mut tables = self.tables.write().await;
        match tables.players.get_mut(&player.id) {
            Some(existing) => {
                *existing = player.clone();
                Ok(())
            }
            None => Err(AppError::NotFound("Player")),
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.tables.write().await.players.remove(&id).is_some())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.tables.read().await.players.len() as u64)
    }
}

#[async_trait]
impl NewsRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<News>> {
        Ok(self.tables.read().await.news.values().rev().cloned().collect())
    }

    async fn find(&self, id: i64) -> Result<Option<News>> {
        Ok(self.tables.read().await.news.get(&id).cloned())
    }

    async fn insert(&self, mut news: News) -> Result<News> {
        let mut tables = self.tables.write().await;
        news.id = tables.next_id();
        tables.news.insert(news.id, news.clone());
        Ok(news)
    }

    async fn update(&self, news: &News) -> Result<()> {
        let mut tables = self.tables.write().await;
        match tables.news.get_mut(&news.id) {
            Some(existing) => {
                *existing = news.clone();
                Ok(())
            }
            None => Err(AppError::NotFound("News")),
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.tables.write().await.news.remove(&id).is_some())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.tables.read().await.news.len() as u64)
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn list_for_news(&self, news_id: i64) -> Result<Vec<Comment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .values()
            .filter(|c| c.news_id == news_id)
            .cloned()
            .collect())
    }

    async fn find(&self, id: i64) -> Result<Option<Comment>> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn insert(&self, mut comment: Comment) -> Result<Comment> {
        let mut tables = self.tables.write().await;
        comment.id = tables.next_id();
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn update(&self, comment: &Comment) -> Result<()> {
        let mut tables = self.tables.write().await;
        match tables.comments.get_mut(&comment.id) {
            Some(existing) => {
                *existing = comment.clone();
                Ok(())
            }
            None => Err(AppError::NotFound("Comment")),
        }
    }

    async fn count_replies(&self, parent_id: i64) -> Result<u64> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .values()
            .filter(|c| c.parent_id == Some(parent_id))
            .count() as u64)
    }

    async fn delete(&self, id: i64) -> Result<u64> {
        Ok(self.tables.write().await.comments.remove(&id).map_or(0, |_| 1))
    }

    async fn delete_with_replies(&self, id: i64) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.comments.len();
        tables
            .comments
            .retain(|_, c| c.id != id && c.parent_id != Some(id));
        Ok((before - tables.comments.len()) as u64)
    }

    async fn delete_for_news(&self, news_id: i64) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.comments.len();
        tables.comments.retain(|_, c| c.news_id != news_id);
        Ok((before - tables.comments.len()) as u64)
    }
}

#[async_trait]
impl InjuryRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<Injury>> {
        Ok(self.tables.read().await.injuries.values().rev().cloned().collect())
    }

    async fn find(&self, id: i64) -> Result<Option<Injury>> {
        Ok(self.tables.read().await.injuries.get(&id).cloned())
    }

    async fn insert(&self, mut injury: Injury) -> Result<Injury> {
        let mut tables = self.tables.write().await;
        injury.id = tables.next_id();
        tables.injuries.insert(injury.id, injury.clone());
        Ok(injury)
    }

    async fn update(&self, injury: &Injury) -> Result<()> {
        let mut tables = self.tables.write().await;
        match tables.injuries.get_mut(&injury.id) {
            Some(existing) => {
                *existing = injury.clone();
                Ok(())
            }
            None => Err(AppError::NotFound("Injury")),
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.tables.write().await.injuries.remove(&id).is_some())
    }
}

#[async_trait]
impl NextMatchRepository for MemoryStore {
    async fn load(&self) -> Result<Option<NextMatchRecord>> {
        Ok(self.tables.read().await.next_match.clone())
    }

    async fn save(&self, record: &NextMatchRecord) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let created = tables.next_match.is_none();
        tables.next_match = Some(record.clone());
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;

    fn comment(news_id: i64, parent_id: Option<i64>) -> Comment {
        Comment {
            id: 0,
            news_id,
            user_id: 1,
            username: "mario".to_string(),
            avatar: String::new(),
            content: "ciao".to_string(),
            parent_id,
            deleted: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn usernames_are_unique() {
        let users: Arc<dyn UserRepository> = Arc::new(MemoryStore::default());
        let first = users.insert(User::new("mario", "hash")).await.unwrap();
        assert!(matches!(
            users.insert(User::new("mario", "hash")).await,
            Err(AppError::DuplicateKey)
        ));

        let other = users.insert(User::new("luigi", "hash")).await.unwrap();
        let mut renamed = other.clone();
        renamed.username = first.username.clone();
        assert!(matches!(users.update(&renamed).await, Err(AppError::DuplicateKey)));
    }

    #[tokio::test]
    async fn delete_with_replies_only_touches_one_thread() {
        let comments: Arc<dyn CommentRepository> = Arc::new(MemoryStore::default());
        let parent = comments.insert(comment(1, None)).await.unwrap();
        let other = comments.insert(comment(1, None)).await.unwrap();
        for _ in 0..3 {
            comments.insert(comment(1, Some(parent.id))).await.unwrap();
        }
        comments.insert(comment(1, Some(other.id))).await.unwrap();

        assert_eq!(comments.count_replies(parent.id).await.unwrap(), 3);
        assert_eq!(comments.delete_with_replies(parent.id).await.unwrap(), 4);
        assert_eq!(comments.list_for_news(1).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn next_match_save_reports_creation_once() {
        let repo: Arc<dyn NextMatchRepository> = Arc::new(MemoryStore::default());
        let record = NextMatchRecord {
            match_date: "01/03/2026".to_string(),
            team1_score: None,
            team2_score: None,
            team1_lineup: "[]".to_string(),
            team2_lineup: "[]".to_string(),
        };
        assert!(repo.load().await.unwrap().is_none());
        assert!(repo.save(&record).await.unwrap());
        assert!(!repo.save(&record).await.unwrap());
        assert_eq!(repo.load().await.unwrap(), Some(record));
    }
}
