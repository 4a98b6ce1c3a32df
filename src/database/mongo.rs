use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::ReturnDocument;
use mongodb::{Collection, Database};

use crate::database::{
    CommentRepository, InjuryRepository, NewsRepository, NextMatchRepository, PlayerRepository,
    UserRepository,
};
use crate::errors::{AppError, Result};
use crate::models::injury::Injury;
use crate::models::news::{Comment, News};
use crate::models::next_match::{NextMatchRecord, NEXT_MATCH_KEY};
use crate::models::player::Player;
use crate::models::user::User;

const DUPLICATE_KEY_CODE: i32 = 11000;

pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        MongoStore { db }
    }

    fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    fn players(&self) -> Collection<Player> {
        self.db.collection("players")
    }

    fn news(&self) -> Collection<News> {
        self.db.collection("news")
    }

    fn comments(&self) -> Collection<Comment> {
        self.db.collection("comments")
    }

    fn injuries(&self) -> Collection<Injury> {
        self.db.collection("injuries")
    }

    fn next_match(&self) -> Collection<Document> {
        self.db.collection("next_match")
    }

    /// Integer ids from a per-collection sequence in `counters`.
    async fn next_id(&self, collection: &str) -> Result<i64> {
        let counters: Collection<Document> = self.db.collection("counters");
        let counter = counters
            .find_one_and_update(doc! { "_id": collection }, doc! { "$inc": { "seq": 1_i64 } })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| AppError::service(format!("no counter returned for {}", collection)))?;

        match counter.get("seq") {
            Some(Bson::Int64(n)) => Ok(*n),
            Some(Bson::Int32(n)) => Ok(i64::from(*n)),
            _ => Err(AppError::service(format!("malformed counter for {}", collection))),
        }
    }
}

fn map_write_error(err: mongodb::error::Error) -> AppError {
    let duplicate = matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY_CODE
    );
    if duplicate {
        AppError::DuplicateKey
    } else {
        AppError::MongoDB(err)
    }
}

#[async_trait]
impl UserRepository for MongoStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.users().find_one(doc! { "_id": id }).await?)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.users().find_one(doc! { "username": username }).await?)
    }

    async fn list(&self) -> Result<Vec<User>> {
        let cursor = self.users().find(doc! {}).sort(doc! { "_id": -1 }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert(&self, mut user: User) -> Result<User> {
        user.id = self.next_id("users").await?;
        self.users().insert_one(&user).await.map_err(map_write_error)?;
        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<()> {
        let result = self
            .users()
            .replace_one(doc! { "_id": user.id }, user)
            .await
            .map_err(map_write_error)?;
        if result.matched_count == 0 {
            return Err(AppError::NotFound("User"));
        }
        Ok(())
    }

    async fn demote_admins_except(&self, username: &str) -> Result<u64> {
        let result = self
            .users()
            .update_many(
                doc! { "is_admin": true, "username": { "$ne": username } },
                doc! { "$set": { "is_admin": false } },
            )
            .await?;
        Ok(result.modified_count)
    }
}

#[async_trait]
impl PlayerRepository for MongoStore {
    async fn list(&self) -> Result<Vec<Player>> {
        let cursor = self
            .players()
            .find(doc! {})
            .sort(doc! { "goals": -1, "_id": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find(&self, id: i64) -> Result<Option<Player>> {
        Ok(self.players().find_one(doc! { "_id": id }).await?)
    }

    async fn insert(&self, mut player: Player) -> Result<Player> {
        player.id = self.next_id("players").await?;
        self.players().insert_one(&player).await?;
        Ok(player)
    }

    async fn update(&self, player: &Player) -> Result<()> {
        let result = self.players().replace_one(doc! { "_id": player.id }, player).await?;
        if result.matched_count == 0 {
            return Err(AppError::NotFound("Player"));
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.players().delete_one(doc! { "_id": id }).await?.deleted_count > 0)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.players().count_documents(doc! {}).await?)
    }
}

#[async_trait]
impl NewsRepository for MongoStore {
    async fn list(&self) -> Result<Vec<News>> {
        let cursor = self.news().find(doc! {}).sort(doc! { "_id": -1 }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find(&self, id: i64) -> Result<Option<News>> {
        Ok(self.news().find_one(doc! { "_id": id }).await?)
    }

    async fn insert(&self, mut news: News) -> Result<News> {
        news.id = self.next_id("news").await?;
        self.news().insert_one(&news).await?;
        Ok(news)
    }

    async fn update(&self, news: &News) -> Result<()> {
        let result = self.news().replace_one(doc! { "_id": news.id }, news).await?;
        if result.matched_count == 0 {
            return Err(AppError::NotFound("News"));
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.news().delete_one(doc! { "_id": id }).await?.deleted_count > 0)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.news().count_documents(doc! {}).await?)
    }
}

#[async_trait]
impl CommentRepository for MongoStore {
    async fn list_for_news(&self, news_id: i64) -> Result<Vec<Comment>> {
        let cursor = self
            .comments()
            .find(doc! { "news_id": news_id })
            .sort(doc! { "_id": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find(&self, id: i64) -> Result<Option<Comment>> {
        Ok(self.comments().find_one(doc! { "_id": id }).await?)
    }

    async fn insert(&self, mut comment: Comment) -> Result<Comment> {
        comment.id = self.next_id("comments").await?;
        self.comments().insert_one(&comment).await?;
        Ok(comment)
    }

    async fn update(&self, comment: &Comment) -> Result<()> {
        let result = self
            .comments()
            .replace_one(doc! { "_id": comment.id }, comment)
            .await?;
        if result.matched_count == 0 {
            return Err(AppError::NotFound("Comment"));
        }
        Ok(())
    }

    async fn count_replies(&self, parent_id: i64) -> Result<u64> {
        Ok(self
            .comments()
            .count_documents(doc! { "parent_id": parent_id })
            .await?)
    }

    async fn delete(&self, id: i64) -> Result<u64> {
        Ok(self.comments().delete_one(doc! { "_id": id }).await?.deleted_count)
    }

    async fn delete_with_replies(&self, id: i64) -> Result<u64> {
        let filter = doc! { "$or": [ { "_id": id }, { "parent_id": id } ] };
        Ok(self.comments().delete_many(filter).await?.deleted_count)
    }

    async fn delete_for_news(&self, news_id: i64) -> Result<u64> {
        Ok(self
            .comments()
            .delete_many(doc! { "news_id": news_id })
            .await?
            .deleted_count)
    }
}

#[async_trait]
impl InjuryRepository for MongoStore {
    async fn list(&self) -> Result<Vec<Injury>> {
        let cursor = self.injuries().find(doc! {}).sort(doc! { "_id": -1 }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find(&self, id: i64) -> Result<Option<Injury>> {
        Ok(self.injuries().find_one(doc! { "_id": id }).await?)
    }

    async fn insert(&self, mut injury: Injury) -> Result<Injury> {
        injury.id = self.next_id("injuries").await?;
        self.injuries().insert_one(&injury).await?;
        Ok(injury)
    }

    async fn update(&self, injury: &Injury) -> Result<()> {
        let result = self
            .injuries()
            .replace_one(doc! { "_id": injury.id }, injury)
            .await?;
        if result.matched_count == 0 {
            return Err(AppError::NotFound("Injury"));
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.injuries().delete_one(doc! { "_id": id }).await?.deleted_count > 0)
    }
}

#[async_trait]
impl NextMatchRepository for MongoStore {
    async fn load(&self) -> Result<Option<NextMatchRecord>> {
        let document = self.next_match().find_one(doc! { "_id": NEXT_MATCH_KEY }).await?;
        Ok(document.as_ref().map(record_from_document))
    }

    async fn save(&self, record: &NextMatchRecord) -> Result<bool> {
        let update = doc! {
            "$set": {
                "match_date": &record.match_date,
                "team1_score": record.team1_score,
                "team2_score": record.team2_score,
                "team1_lineup": &record.team1_lineup,
                "team2_lineup": &record.team2_lineup,
            }
        };
        let result = self
            .next_match()
            .update_one(doc! { "_id": NEXT_MATCH_KEY }, update)
            .upsert(true)
            .await?;
        Ok(result.upserted_id.is_some())
    }
}

/// Reads the stored document field by field so that a wrongly typed field
/// degrades to its default instead of failing the whole read.
fn record_from_document(document: &Document) -> NextMatchRecord {
    NextMatchRecord {
        match_date: document.get_str("match_date").unwrap_or("").to_string(),
        team1_score: score_field(document, "team1_score"),
        team2_score: score_field(document, "team2_score"),
        team1_lineup: lineup_field(document, "team1_lineup"),
        team2_lineup: lineup_field(document, "team2_lineup"),
    }
}

fn score_field(document: &Document, key: &str) -> Option<i64> {
    match document.get(key) {
        Some(Bson::Int32(n)) => Some(i64::from(*n)),
        Some(Bson::Int64(n)) => Some(*n),
        Some(Bson::Double(f)) if f.fract() == 0.0 => Some(*f as i64),
        _ => None,
    }
}

fn lineup_field(document: &Document, key: &str) -> String {
    match document.get(key) {
        Some(Bson::String(raw)) => raw.clone(),
        // Edited by hand into a BSON array.
        Some(array @ Bson::Array(_)) => array.clone().into_relaxed_extjson().to_string(),
        _ => String::new(),
    }
}
