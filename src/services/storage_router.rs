//! Size-based storage routing
//!
//! Decides per write whether a payload is embedded in the metadata record
//! (inline tier) or offloaded to the blob store (blob tier), and is the only
//! code path that creates, mutates or destroys the paired metadata/blob state.
//!
//! Write ordering for the blob tier is blob first, metadata second. A failed
//! blob write therefore never leaves a metadata record behind. A metadata
//! write that fails after a successful blob write leaves an orphaned blob;
//! no compensating delete is attempted.

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::db::MetadataStore;
use crate::error::{RouterError, RouterResult};
use crate::models::{
    data_preview, CollectionStats, DeleteOutcome, ListQuery, RecordPage, RetrievedRecord, StorageTier,
    StoredPayload, StoredRecord, UpdateOutcome,
};
use crate::storage::{blob_key, BlobStore};

/// Payloads whose serialized size is at or above this many bytes go to the blob store
pub const SIZE_THRESHOLD: usize = 100 * 1024;

/// Byte length of the compact UTF-8 JSON serialization of `payload`
pub fn payload_size(payload: &Value) -> RouterResult<usize> {
    Ok(serde_json::to_vec(payload)?.len())
}

/// Stateless per-request router over a metadata store and an optional blob store
#[derive(Clone)]
pub struct StorageRouter {
    metadata: Arc<dyn MetadataStore>,
    blobs: Option<Arc<dyn BlobStore>>,
}

impl StorageRouter {
    pub fn new(metadata: Arc<dyn MetadataStore>, blobs: Option<Arc<dyn BlobStore>>) -> Self {
        debug!("Storage router created (blob store enabled: {})", blobs.is_some());
        Self { metadata, blobs }
    }

    pub fn blob_store_enabled(&self) -> bool {
        self.blobs.is_some()
    }

    /// Tier for a payload of `size` bytes. Without a blob store everything is inline.
    pub fn choose_tier(&self, size: usize) -> StorageTier {
        if self.blobs.is_some() && size >= SIZE_THRESHOLD {
            StorageTier::Blob
        } else {
            StorageTier::Inline
        }
    }

    /// Persist a new record, routing the payload by its serialized size
    pub async fn save(&self, owner_id: &str, collection: &str, payload: Value) -> RouterResult<StoredRecord> {
        let serialized = serde_json::to_vec(&payload)?;
        let size = serialized.len();
        let id = Uuid::new_v4();
        let now = Utc::now();

        if size >= SIZE_THRESHOLD && self.blobs.is_none() {
            warn!("No blob store configured; storing {} byte payload for {} inline", size, id);
        }

        let (stored, preview) = match (self.choose_tier(size), &self.blobs) {
            (StorageTier::Blob, Some(blobs)) => {
                let key = blob_key(owner_id, collection, id);
                if let Err(e) = blobs.put(&key, &serialized).await {
                    error!("Failed to write blob {} for new record: {}", key, e);
                    return Err(RouterError::blob(&key, e));
                }
                let preview = data_preview(&String::from_utf8_lossy(&serialized));
                (StoredPayload::Blob { key }, Some(preview))
            }
            _ => (StoredPayload::Inline { payload }, None),
        };

        let record = StoredRecord {
            id,
            owner_id: owner_id.to_string(),
            collection: collection.to_string(),
            stored,
            size_bytes: size as i64,
            data_preview: preview,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.metadata.insert_record(&record).await {
            if let Some(key) = record.blob_key() {
                error!("Metadata insert failed after blob write; blob {} is now orphaned: {}", key, e);
            }
            return Err(RouterError::Metadata(e));
        }

        info!(
            "Saved record {} to {} tier ({} bytes, collection {})",
            record.id,
            record.tier(),
            size,
            record.collection
        );
        Ok(record)
    }

    /// Payload of a record by id, without owner scoping
    pub async fn get(&self, id: Uuid) -> RouterResult<Option<Value>> {
        let Some(record) = self.find(id, None).await? else {
            return Ok(None);
        };
        Ok(Some(self.load_payload(&record).await?))
    }

    /// Full record with payload, scoped to `owner_id`
    pub async fn retrieve(&self, owner_id: &str, id: Uuid) -> RouterResult<Option<RetrievedRecord>> {
        let Some(record) = self.find(id, Some(owner_id)).await? else {
            return Ok(None);
        };
        let data = self.load_payload(&record).await?;
        Ok(Some(RetrievedRecord::from_record(record, data)))
    }

    /// Replace a record's payload without owner scoping
    pub async fn update(&self, id: Uuid, new_payload: Value) -> RouterResult<Option<UpdateOutcome>> {
        self.update_scoped(id, None, new_payload).await
    }

    /// Replace a record's payload, scoped to `owner_id`
    pub async fn update_with_user(&self, owner_id: &str, id: Uuid, new_payload: Value) -> RouterResult<Option<UpdateOutcome>> {
        self.update_scoped(id, Some(owner_id), new_payload).await
    }

    /// Delete a record without owner scoping
    pub async fn delete(&self, id: Uuid) -> RouterResult<DeleteOutcome> {
        self.delete_scoped(id, None).await
    }

    /// Delete a record, scoped to `owner_id`
    pub async fn delete_with_user(&self, owner_id: &str, id: Uuid) -> RouterResult<DeleteOutcome> {
        self.delete_scoped(id, Some(owner_id)).await
    }

    /// Metadata-only page of an owner's records, newest first
    pub async fn list(&self, owner_id: &str, query: &ListQuery) -> RouterResult<RecordPage> {
        let limit = query.effective_limit();
        let skip = query.effective_skip();
        let collection = query.collection.as_deref();

        let items = self
            .metadata
            .list_records(owner_id, collection, limit, skip)
            .await
            .map_err(RouterError::Metadata)?;
        let total = self
            .metadata
            .count_records(owner_id, collection)
            .await
            .map_err(RouterError::Metadata)?;

        Ok(RecordPage { items, total, limit, skip })
    }

    /// Record counts and total sizes per collection for an owner
    pub async fn collections(&self, owner_id: &str) -> RouterResult<Vec<CollectionStats>> {
        self.metadata.collection_stats(owner_id).await.map_err(RouterError::Metadata)
    }

    async fn find(&self, id: Uuid, owner_id: Option<&str>) -> RouterResult<Option<StoredRecord>> {
        let record = self.metadata.find_record(id, owner_id).await.map_err(RouterError::Metadata)?;
        if record.is_none() {
            debug!("Record {} not found", id);
        }
        Ok(record)
    }

    fn blob_store_for(&self, record: &StoredRecord) -> RouterResult<&Arc<dyn BlobStore>> {
        self.blobs
            .as_ref()
            .ok_or(RouterError::BlobStoreMissing { id: record.id })
    }

    async fn load_payload(&self, record: &StoredRecord) -> RouterResult<Value> {
        match &record.stored {
            StoredPayload::Inline { payload } => Ok(payload.clone()),
            StoredPayload::Blob { key } => {
                let blobs = self.blob_store_for(record)?;
                let bytes = blobs.get(key).await.map_err(|e| {
                    error!("Failed to read blob {} for record {}: {}", key, record.id, e);
                    RouterError::blob(key, e)
                })?;
                debug!("Loaded record {} from blob {}", record.id, key);
                Ok(serde_json::from_slice(&bytes)?)
            }
        }
    }

    /// The tier chosen at creation is kept: the payload is rewritten wherever
    /// the record already lives, and only size, preview and `updated_at` change
    /// alongside it.
    async fn update_scoped(&self, id: Uuid, owner_id: Option<&str>, new_payload: Value) -> RouterResult<Option<UpdateOutcome>> {
        let Some(existing) = self.find(id, owner_id).await? else {
            return Ok(None);
        };

        let serialized = serde_json::to_vec(&new_payload)?;
        let size = serialized.len();

        let mut updated = existing.clone();
        match &existing.stored {
            StoredPayload::Blob { key } => {
                let blobs = self.blob_store_for(&existing)?;
                if let Err(e) = blobs.put(key, &serialized).await {
                    error!("Failed to overwrite blob {} for record {}: {}", key, id, e);
                    return Err(RouterError::blob(key, e));
                }
                updated.data_preview = Some(data_preview(&String::from_utf8_lossy(&serialized)));
            }
            StoredPayload::Inline { .. } => {
                if self.choose_tier(size) == StorageTier::Blob {
                    debug!("Record {} grew to {} bytes but keeps its inline tier", id, size);
                }
                updated.stored = StoredPayload::Inline { payload: new_payload };
            }
        }
        updated.size_bytes = size as i64;
        updated.updated_at = Utc::now();

        let applied = self.metadata.update_record(&updated).await.map_err(RouterError::Metadata)?;
        if !applied {
            // Deleted concurrently between lookup and write
            warn!("Record {} disappeared during update", id);
            return Ok(None);
        }

        info!("Updated record {} in {} tier ({} bytes)", id, updated.tier(), size);
        Ok(Some(UpdateOutcome {
            id,
            size_bytes: updated.size_bytes,
            tier: updated.tier(),
            updated_at: updated.updated_at,
        }))
    }

    /// Blob cleanup is best-effort: a failure is logged and the metadata
    /// record is still removed, so no record stays pinned by an unreachable blob.
    async fn delete_scoped(&self, id: Uuid, owner_id: Option<&str>) -> RouterResult<DeleteOutcome> {
        let Some(record) = self.find(id, owner_id).await? else {
            return Ok(DeleteOutcome::not_found());
        };

        match &record.stored {
            StoredPayload::Blob { key } => match &self.blobs {
                Some(blobs) => {
                    if let Err(e) = blobs.delete(key).await {
                        warn!("Failed to delete blob {} for record {}, continuing: {}", key, id, e);
                    }
                }
                None => warn!("No blob store configured; leaving blob {} for record {} in place", key, id),
            },
            StoredPayload::Inline { .. } => {}
        }

        let deleted = self
            .metadata
            .delete_record(id, owner_id)
            .await
            .map_err(RouterError::Metadata)?;

        if !deleted {
            return Ok(DeleteOutcome::not_found());
        }

        info!("Deleted record {} ({} bytes freed)", id, record.size_bytes);
        Ok(DeleteOutcome {
            success: true,
            freed_bytes: record.size_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::storage::local::LocalBlobStore;
    use serde_json::json;
    use tempfile::TempDir;

    async fn router_with_blobs(dir: &TempDir) -> StorageRouter {
        let db = Database::new_in_memory().await.unwrap();
        let blobs = LocalBlobStore::new(dir.path().to_string_lossy().to_string());
        StorageRouter::new(Arc::new(db), Some(Arc::new(blobs)))
    }

    #[test]
    fn test_payload_size_is_compact_json_length() {
        assert_eq!(payload_size(&json!({"a": 1, "b": [true, null]})).unwrap(), r#"{"a":1,"b":[true,null]}"#.len());
        assert_eq!(payload_size(&json!("héllo")).unwrap(), "\"héllo\"".len());
    }

    #[tokio::test]
    async fn test_choose_tier_threshold() {
        let dir = TempDir::new().unwrap();
        let router = router_with_blobs(&dir).await;
        assert_eq!(router.choose_tier(SIZE_THRESHOLD - 1), StorageTier::Inline);
        assert_eq!(router.choose_tier(SIZE_THRESHOLD), StorageTier::Blob);

        let db = Database::new_in_memory().await.unwrap();
        let inline_only = StorageRouter::new(Arc::new(db), None);
        assert_eq!(inline_only.choose_tier(SIZE_THRESHOLD * 100), StorageTier::Inline);
    }

    #[tokio::test]
    async fn test_small_payload_round_trips_inline() {
        let dir = TempDir::new().unwrap();
        let router = router_with_blobs(&dir).await;
        let payload = json!({"name": "widget", "tags": ["a", "b"]});

        let record = router.save("alice", "items", payload.clone()).await.unwrap();
        assert_eq!(record.tier(), StorageTier::Inline);
        assert!(record.blob_key().is_none());
        assert_eq!(record.size_bytes as usize, payload_size(&payload).unwrap());

        assert_eq!(router.get(record.id).await.unwrap(), Some(payload));
    }

    #[tokio::test]
    async fn test_update_preserves_inline_tier_when_growing() {
        let dir = TempDir::new().unwrap();
        let router = router_with_blobs(&dir).await;
        let record = router.save("alice", "items", json!({"v": 1})).await.unwrap();

        let big = json!({"blob": "x".repeat(SIZE_THRESHOLD * 2)});
        let outcome = router.update_with_user("alice", record.id, big.clone()).await.unwrap().unwrap();
        assert_eq!(outcome.tier, StorageTier::Inline);
        assert_eq!(outcome.size_bytes as usize, payload_size(&big).unwrap());
        assert!(outcome.updated_at >= record.updated_at);

        let fetched = router.retrieve("alice", record.id).await.unwrap().unwrap();
        assert_eq!(fetched.data, big);
        assert_eq!(fetched.created_at, record.created_at);
    }

    #[tokio::test]
    async fn test_unscoped_operations_on_missing_ids() {
        let dir = TempDir::new().unwrap();
        let router = router_with_blobs(&dir).await;
        let id = Uuid::new_v4();

        assert!(router.get(id).await.unwrap().is_none());
        assert!(router.update(id, json!({})).await.unwrap().is_none());
        assert_eq!(router.delete(id).await.unwrap(), DeleteOutcome::not_found());
    }
}
