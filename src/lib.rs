//! Size-routed record storage over a metadata store and a blob store.
//!
//! Small payloads are embedded in their metadata record; large ones are
//! offloaded to blob storage (local filesystem, S3 or R2). See
//! [`services::storage_router::StorageRouter`].

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod models;
pub mod services;
pub mod storage;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_helpers;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use config::Config;
use db::{Database, MetadataStore};
use events::{EventSink, TracingEventSink};
use services::batch::BatchService;
use services::storage_router::StorageRouter;
use storage::factory::{blob_config_from_env, create_blob_store};
use storage::BlobStore;

/// Application-wide handles, built once at startup and passed to whatever
/// needs storage. Routers are cheap and created per request from here.
#[derive(Clone)]
pub struct AppContext {
    pub config: Config,
    pub metadata: Arc<dyn MetadataStore>,
    pub blobs: Option<Arc<dyn BlobStore>>,
    pub events: Arc<dyn EventSink>,
}

impl AppContext {
    /// Connect the metadata database and blob store described by `config`
    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        let db = Database::new(&config.database_url).await?;
        let blobs = create_blob_store(blob_config_from_env(&config)).await?;

        Ok(Self {
            config,
            metadata: Arc::new(db),
            blobs,
            events: Arc::new(TracingEventSink),
        })
    }

    pub fn router(&self) -> StorageRouter {
        StorageRouter::new(self.metadata.clone(), self.blobs.clone())
    }

    pub fn batch(&self) -> BatchService {
        BatchService::new(self.router(), self.events.clone())
    }
}
