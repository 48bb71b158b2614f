//! Metadata store for record bookkeeping
//!
//! The router only talks to the [`MetadataStore`] trait; [`Database`] is the
//! sqlx/SQLite implementation used by the binary and the tests.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::models::{CollectionStats, RecordSummary, StoredRecord};

pub mod records;

/// Key-value operations over record metadata, keyed by record id.
///
/// `owner_id: None` means an unscoped lookup; `Some(owner)` restricts the
/// operation to records created by that owner.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn insert_record(&self, record: &StoredRecord) -> Result<()>;

    async fn find_record(&self, id: Uuid, owner_id: Option<&str>) -> Result<Option<StoredRecord>>;

    /// Overwrite the mutable fields (payload location, size, preview,
    /// `updated_at`) of the record with `record.id` owned by `record.owner_id`.
    /// Returns false if no such record exists.
    async fn update_record(&self, record: &StoredRecord) -> Result<bool>;

    /// Returns false if no matching record existed
    async fn delete_record(&self, id: Uuid, owner_id: Option<&str>) -> Result<bool>;

    /// Metadata-only listing, newest first
    async fn list_records(&self, owner_id: &str, collection: Option<&str>, limit: i64, skip: i64) -> Result<Vec<RecordSummary>>;

    async fn count_records(&self, owner_id: &str, collection: Option<&str>) -> Result<i64>;

    /// Per-collection record counts and total sizes, largest count first
    async fn collection_stats(&self, owner_id: &str) -> Result<Vec<CollectionStats>>;
}

#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        info!("Connected to metadata database");
        Ok(db)
    }

    /// Private in-memory database. A single connection that never expires
    /// keeps every query on the same memory store.
    pub async fn new_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    pub fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}
