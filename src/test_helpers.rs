/*!
 * Test Helpers and Utilities
 *
 * This module provides utilities for creating test configurations and
 * application contexts with sensible defaults. Tests can modify the returned
 * objects as needed.
 */

use std::sync::Arc;

use crate::{
    config::{BlobBackendKind, Config},
    db::Database,
    events::{EventSink, TracingEventSink},
    storage::{local::LocalBlobStore, BlobStore},
    AppContext,
};

/// Creates a test configuration with sensible defaults
/// All fields are populated to avoid compilation errors when new fields are added
pub fn create_test_config(blob_path: &str) -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        blob_backend: BlobBackendKind::Local,
        blob_path: blob_path.to_string(),
        s3_config: None,
    }
}

/// Creates a context over an in-memory database and the given blob store
pub async fn create_test_context_with(blobs: Option<Arc<dyn BlobStore>>, events: Arc<dyn EventSink>) -> AppContext {
    let db = Database::new_in_memory()
        .await
        .expect("Failed to create in-memory test database");

    let mut config = create_test_config("/tmp/tierstore_test_blobs");
    if blobs.is_none() {
        config.blob_backend = BlobBackendKind::None;
    }

    AppContext {
        config,
        metadata: Arc::new(db),
        blobs,
        events,
    }
}

/// Creates a context with a local blob store rooted at `blob_path`
pub async fn create_test_context(blob_path: &str) -> AppContext {
    let store = LocalBlobStore::new(blob_path.to_string());
    let mut ctx = create_test_context_with(Some(Arc::new(store)), Arc::new(TracingEventSink)).await;
    ctx.config = create_test_config(blob_path);
    ctx
}

/// Creates a context with no blob store, so every payload stays inline
pub async fn create_inline_only_context() -> AppContext {
    create_test_context_with(None, Arc::new(TracingEventSink)).await
}
