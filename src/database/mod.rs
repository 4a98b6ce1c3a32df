//! Storage seams. Each entity has an async repository trait with a MongoDB
//! implementation ([`mongo::MongoStore`]) and a process-local one
//! ([`memory::MemoryStore`]) used for development and tests.
//!
//! `insert` methods ignore the incoming `id` and return the stored entity
//! with its assigned id.

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::Result;
use crate::models::injury::Injury;
use crate::models::news::{Comment, News};
use crate::models::next_match::NextMatchRecord;
use crate::models::player::Player;
use crate::models::user::User;

pub mod connection;
pub mod memory;
pub mod mongo;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    /// Newest first.
    async fn list(&self) -> Result<Vec<User>>;
    /// Fails with `DuplicateKey` when the username is taken.
    async fn insert(&self, user: User) -> Result<User>;
    /// Fails with `DuplicateKey` when renaming onto a taken username.
    async fn update(&self, user: &User) -> Result<()>;
    /// Clears the admin flag on every account except `username`; returns
    /// how many accounts were demoted.
    async fn demote_admins_except(&self, username: &str) -> Result<u64>;
}

#[async_trait]
pub trait PlayerRepository: Send + Sync {
    /// Top scorers first.
    async fn list(&self) -> Result<Vec<Player>>;
    async fn find(&self, id: i64) -> Result<Option<Player>>;
    async fn insert(&self, player: Player) -> Result<Player>;
    async fn update(&self, player: &Player) -> Result<()>;
    async fn delete(&self, id: i64) -> Result<bool>;
    async fn count(&self) -> Result<u64>;
}

#[async_trait]
pub trait NewsRepository: Send + Sync {
    /// Newest first.
    async fn list(&self) -> Result<Vec<News>>;
    async fn find(&self, id: i64) -> Result<Option<News>>;
    async fn insert(&self, news: News) -> Result<News>;
    async fn update(&self, news: &News) -> Result<()>;
    async fn delete(&self, id: i64) -> Result<bool>;
    async fn count(&self) -> Result<u64>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Oldest first.
    async fn list_for_news(&self, news_id: i64) -> Result<Vec<Comment>>;
    async fn find(&self, id: i64) -> Result<Option<Comment>>;
    async fn insert(&self, comment: Comment) -> Result<Comment>;
    async fn update(&self, comment: &Comment) -> Result<()>;
    async fn count_replies(&self, parent_id: i64) -> Result<u64>;
    /// Removes the comment only.
    async fn delete(&self, id: i64) -> Result<u64>;
    /// Removes the comment and its direct replies.
    async fn delete_with_replies(&self, id: i64) -> Result<u64>;
    async fn delete_for_news(&self, news_id: i64) -> Result<u64>;
}

#[async_trait]
pub trait InjuryRepository: Send + Sync {
    /// Newest first.
    async fn list(&self) -> Result<Vec<Injury>>;
    async fn find(&self, id: i64) -> Result<Option<Injury>>;
    async fn insert(&self, injury: Injury) -> Result<Injury>;
    async fn update(&self, injury: &Injury) -> Result<()>;
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// Holder of the single next-match document. There is deliberately no
/// delete.
#[async_trait]
pub trait NextMatchRepository: Send + Sync {
    async fn load(&self) -> Result<Option<NextMatchRecord>>;
    /// Creates the document if absent, otherwise overwrites every field.
    /// Returns `true` when it was created.
    async fn save(&self, record: &NextMatchRecord) -> Result<bool>;
}

#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub players: Arc<dyn PlayerRepository>,
    pub news: Arc<dyn NewsRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub injuries: Arc<dyn InjuryRepository>,
    pub next_match: Arc<dyn NextMatchRepository>,
}

impl Repositories {
    pub fn mongo(db: mongodb::Database) -> Self {
        Self::from_store(Arc::new(mongo::MongoStore::new(db)))
    }

    pub fn memory() -> Self {
        Self::from_store(Arc::new(memory::MemoryStore::default()))
    }

    fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserRepository
            + PlayerRepository
            + NewsRepository
            + CommentRepository
            + InjuryRepository
            + NextMatchRepository
            + 'static,
    {
        Repositories {
            users: store.clone(),
            players: store.clone(),
            news: store.clone(),
            comments: store.clone(),
            injuries: store.clone(),
            next_match: store,
        }
    }
}
