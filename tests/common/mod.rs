//! Shared storage doubles for integration tests

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use tierstore::db::{Database, MetadataStore};
use tierstore::events::{EventSink, StorageEvent};
use tierstore::models::{CollectionStats, RecordSummary, StoredRecord};
use tierstore::storage::BlobStore;

/// In-memory blob store with switchable failures per operation
#[derive(Default)]
pub struct FlakyBlobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    pub fail_put: AtomicBool,
    pub fail_get: AtomicBool,
    pub fail_delete: AtomicBool,
    pub puts: AtomicUsize,
}

impl FlakyBlobStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    /// Remove an object behind the router's back
    pub fn remove_out_of_band(&self, key: &str) {
        self.objects.lock().unwrap().remove(key);
    }
}

#[async_trait]
impl BlobStore for FlakyBlobStore {
    async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(anyhow!("simulated put failure"));
        }
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.objects.lock().unwrap().insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(anyhow!("simulated get failure"));
        }
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow!("Blob not found: {}", key))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(anyhow!("simulated delete failure"));
        }
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.contains(key))
    }

    fn storage_type(&self) -> &'static str {
        "memory"
    }

    async fn initialize(&self) -> Result<()> {
        Ok(())
    }
}

/// In-memory SQLite metadata store whose writes can be made to fail
pub struct FailingMetadataStore {
    inner: Database,
    pub fail_insert: AtomicBool,
    pub fail_update: AtomicBool,
    pub fail_delete: AtomicBool,
}

impl FailingMetadataStore {
    pub async fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Database::new_in_memory().await.unwrap(),
            fail_insert: AtomicBool::new(false),
            fail_update: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl MetadataStore for FailingMetadataStore {
    async fn insert_record(&self, record: &StoredRecord) -> Result<()> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(anyhow!("simulated insert failure"));
        }
        self.inner.insert_record(record).await
    }

    async fn find_record(&self, id: Uuid, owner_id: Option<&str>) -> Result<Option<StoredRecord>> {
        self.inner.find_record(id, owner_id).await
    }

    async fn update_record(&self, record: &StoredRecord) -> Result<bool> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(anyhow!("simulated update failure"));
        }
        self.inner.update_record(record).await
    }

    async fn delete_record(&self, id: Uuid, owner_id: Option<&str>) -> Result<bool> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(anyhow!("simulated delete failure"));
        }
        self.inner.delete_record(id, owner_id).await
    }

    async fn list_records(&self, owner_id: &str, collection: Option<&str>, limit: i64, skip: i64) -> Result<Vec<RecordSummary>> {
        self.inner.list_records(owner_id, collection, limit, skip).await
    }

    async fn count_records(&self, owner_id: &str, collection: Option<&str>) -> Result<i64> {
        self.inner.count_records(owner_id, collection).await
    }

    async fn collection_stats(&self, owner_id: &str) -> Result<Vec<CollectionStats>> {
        self.inner.collection_stats(owner_id).await
    }
}

/// Event sink that remembers everything it was given
#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<StorageEvent>>,
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &StorageEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// JSON string payload whose compact serialization is exactly `size` bytes
pub fn payload_of_size(size: usize) -> serde_json::Value {
    assert!(size >= 2);
    serde_json::Value::String("a".repeat(size - 2))
}
