//! MongoDB database wrapper.

use mongodb::bson::{doc, Document};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, IndexModel};
use tracing::info;

/// Database wrapper for MongoDB operations.
#[derive(Debug, Clone)]
pub struct Database {
    db: mongodb::Database,
}

impl Database {
    /// Connect to MongoDB with the given URI and database name.
    ///
    /// Pings the server and makes sure the indexes exist.
    pub async fn connect(uri: &str, db_name: &str) -> anyhow::Result<Self> {
        let client = Client::with_uri_str(uri).await?;

        // Ping the database to verify connection
        client.database("admin").run_command(doc! { "ping": 1 }).await?;
        info!("Successfully connected to MongoDB");

        let database = Self {
            db: client.database(db_name),
        };
        database.ensure_indexes().await?;

        Ok(database)
    }

    /// Get a typed collection from the database.
    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    /// Next value of a named sequence (SQL-style autoincrement).
    pub async fn next_sequence(&self, name: &str) -> mongodb::error::Result<i64> {
        let counter = self
            .collection::<Document>("counters")
            .find_one_and_update(doc! { "_id": name }, doc! { "$inc": { "seq": 1_i64 } })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?;

        Ok(counter
            .and_then(|c| c.get_i64("seq").ok())
            .unwrap_or(1))
    }

    async fn ensure_indexes(&self) -> anyhow::Result<()> {
        let unique = || IndexOptions::builder().unique(true).build();

        let users = self.collection::<Document>("users");
        users
            .create_index(IndexModel::builder().keys(doc! { "user_id": 1 }).options(unique()).build())
            .await?;
        users
            .create_index(IndexModel::builder().keys(doc! { "points": -1 }).build())
            .await?;

        let withdrawals = self.collection::<Document>("withdraw_requests");
        withdrawals
            .create_index(IndexModel::builder().keys(doc! { "request_id": 1 }).options(unique()).build())
            .await?;
        withdrawals
            .create_index(IndexModel::builder().keys(doc! { "user_id": 1, "created_at": -1 }).build())
            .await?;
        withdrawals
            .create_index(IndexModel::builder().keys(doc! { "status": 1 }).build())
            .await?;

        self.collection::<Document>("ads")
            .create_index(IndexModel::builder().keys(doc! { "ad_id": 1 }).options(unique()).build())
            .await?;
        self.collection::<Document>("quizzes")
            .create_index(IndexModel::builder().keys(doc! { "quiz_id": 1 }).options(unique()).build())
            .await?;

        info!("MongoDB indexes ensured");
        Ok(())
    }
}
