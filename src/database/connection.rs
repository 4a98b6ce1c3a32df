use anyhow::Context;
use mongodb::bson::{doc, Document};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};

use crate::config::{AppConfig, StorageBackend};
use crate::database::Repositories;

pub async fn get_db_client(database_url: &str, db_name: &str) -> anyhow::Result<Database> {
    let client = Client::with_uri_str(database_url)
        .await
        .context("Failed to connect to MongoDB")?;

    let db = client.database(db_name);

    db.run_command(doc! { "ping": 1 })
        .await
        .with_context(|| format!("Database '{}' is not reachable", db_name))?;

    match db.list_collection_names().await {
        Ok(collections) => {
            tracing::info!("✅ Connected to database: {}", db_name);
            tracing::debug!("📂 Collections found: {:?}", collections);
        }
        Err(e) => {
            tracing::warn!("⚠️ Could not list collections in '{}': {}", db_name, e);
        }
    }

    ensure_indexes(&db).await?;
    Ok(db)
}

async fn ensure_indexes(db: &Database) -> anyhow::Result<()> {
    let users: Collection<Document> = db.collection("users");
    users
        .create_index(
            IndexModel::builder()
                .keys(doc! { "username": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        )
        .await
        .context("Failed to create unique username index")?;

    let comments: Collection<Document> = db.collection("comments");
    for key in ["news_id", "parent_id"] {
        comments
            .create_index(IndexModel::builder().keys(doc! { key: 1 }).build())
            .await
            .with_context(|| format!("Failed to create comments.{} index", key))?;
    }
    Ok(())
}

/// Opens the backend selected by `STORAGE_BACKEND`.
pub async fn connect_repositories(config: &AppConfig) -> anyhow::Result<Repositories> {
    match config.storage_backend {
        StorageBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            Ok(Repositories::memory())
        }
        StorageBackend::Mongo => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set for the mongo backend")?;
            let db = get_db_client(url, &config.database_name).await?;
            Ok(Repositories::mongo(db))
        }
    }
}
