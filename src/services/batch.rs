//! Batch create/read/update/delete on top of the storage router.
//!
//! Each item is an independent single-record router call; there is no
//! cross-item atomicity. Per-item failures are collected instead of aborting
//! the batch.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::BatchError;
use crate::events::{EventSink, StorageEvent};
use crate::models::{RetrievedRecord, StorageTier};
use crate::services::storage_router::StorageRouter;

/// Maximum number of items accepted in one batch request
pub const MAX_BATCH_ITEMS: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchCreateItem {
    pub collection: String,
    pub data: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchUpdateItem {
    pub id: Uuid,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItemResult {
    pub index: usize,
    pub id: Uuid,
    pub size_bytes: i64,
    pub tier: StorageTier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItemFailure {
    pub index: usize,
    /// Absent for create failures, where no id was ever assigned
    pub id: Option<Uuid>,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchWriteResponse {
    pub success: bool,
    pub succeeded: Vec<BatchItemResult>,
    pub failed: Vec<BatchItemFailure>,
    pub total_size: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReadResponse {
    pub success: bool,
    pub found: Vec<RetrievedRecord>,
    pub not_found: Vec<Uuid>,
    /// Items whose metadata or blob could not be read
    pub failed: Vec<BatchItemFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchDeleteResponse {
    pub success: bool,
    pub deleted: Vec<Uuid>,
    pub not_found: Vec<Uuid>,
    pub failed: Vec<BatchItemFailure>,
    pub freed_bytes: i64,
}

fn validate_batch_len(len: usize) -> Result<(), BatchError> {
    if len == 0 {
        return Err(BatchError::EmptyBatch);
    }
    if len > MAX_BATCH_ITEMS {
        return Err(BatchError::TooManyItems { max: MAX_BATCH_ITEMS, got: len });
    }
    Ok(())
}

/// Owner-scoped batch operations; emits one event per successful item
pub struct BatchService {
    router: StorageRouter,
    events: Arc<dyn EventSink>,
}

impl BatchService {
    pub fn new(router: StorageRouter, events: Arc<dyn EventSink>) -> Self {
        Self { router, events }
    }

    pub async fn create(&self, owner_id: &str, items: Vec<BatchCreateItem>) -> Result<BatchWriteResponse, BatchError> {
        validate_batch_len(items.len())?;

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        let mut total_size = 0;

        for (index, item) in items.into_iter().enumerate() {
            match self.router.save(owner_id, &item.collection, item.data).await {
                Ok(record) => {
                    total_size += record.size_bytes;
                    self.events.emit(&StorageEvent::Created {
                        owner_id: owner_id.to_string(),
                        id: record.id,
                        collection: record.collection.clone(),
                        tier: record.tier(),
                        size_bytes: record.size_bytes,
                    });
                    succeeded.push(BatchItemResult {
                        index,
                        id: record.id,
                        size_bytes: record.size_bytes,
                        tier: record.tier(),
                    });
                }
                Err(e) => {
                    warn!("Batch create item {} failed: {}", index, e);
                    failed.push(BatchItemFailure { index, id: None, error: e.to_string() });
                }
            }
        }

        info!("Batch create for {}: {} created, {} failed", owner_id, succeeded.len(), failed.len());
        Ok(BatchWriteResponse {
            success: failed.is_empty(),
            succeeded,
            failed,
            total_size,
        })
    }

    /// Missing records go to `not_found`; backend errors go to `failed`
    pub async fn read(&self, owner_id: &str, ids: Vec<Uuid>) -> Result<BatchReadResponse, BatchError> {
        validate_batch_len(ids.len())?;

        let mut found = Vec::new();
        let mut not_found = Vec::new();
        let mut failed = Vec::new();

        for (index, id) in ids.into_iter().enumerate() {
            match self.router.retrieve(owner_id, id).await {
                Ok(Some(record)) => found.push(record),
                Ok(None) => not_found.push(id),
                Err(e) => {
                    warn!("Batch read of {} failed: {}", id, e);
                    failed.push(BatchItemFailure { index, id: Some(id), error: e.to_string() });
                }
            }
        }

        Ok(BatchReadResponse {
            success: not_found.is_empty() && failed.is_empty(),
            found,
            not_found,
            failed,
        })
    }

    pub async fn update(&self, owner_id: &str, items: Vec<BatchUpdateItem>) -> Result<BatchWriteResponse, BatchError> {
        validate_batch_len(items.len())?;

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        let mut total_size = 0;

        for (index, item) in items.into_iter().enumerate() {
            match self.router.update_with_user(owner_id, item.id, item.data).await {
                Ok(Some(outcome)) => {
                    total_size += outcome.size_bytes;
                    self.events.emit(&StorageEvent::Updated {
                        owner_id: owner_id.to_string(),
                        id: outcome.id,
                        tier: outcome.tier,
                        size_bytes: outcome.size_bytes,
                    });
                    succeeded.push(BatchItemResult {
                        index,
                        id: outcome.id,
                        size_bytes: outcome.size_bytes,
                        tier: outcome.tier,
                    });
                }
                Ok(None) => failed.push(BatchItemFailure {
                    index,
                    id: Some(item.id),
                    error: "Not found".to_string(),
                }),
                Err(e) => {
                    warn!("Batch update of {} failed: {}", item.id, e);
                    failed.push(BatchItemFailure { index, id: Some(item.id), error: e.to_string() });
                }
            }
        }

        info!("Batch update for {}: {} updated, {} failed", owner_id, succeeded.len(), failed.len());
        Ok(BatchWriteResponse {
            success: failed.is_empty(),
            succeeded,
            failed,
            total_size,
        })
    }

    pub async fn delete(&self, owner_id: &str, ids: Vec<Uuid>) -> Result<BatchDeleteResponse, BatchError> {
        validate_batch_len(ids.len())?;

        let mut deleted = Vec::new();
        let mut not_found = Vec::new();
        let mut failed = Vec::new();
        let mut freed_bytes = 0;

        for (index, id) in ids.into_iter().enumerate() {
            match self.router.delete_with_user(owner_id, id).await {
                Ok(outcome) if outcome.success => {
                    freed_bytes += outcome.freed_bytes;
                    self.events.emit(&StorageEvent::Deleted {
                        owner_id: owner_id.to_string(),
                        id,
                        freed_bytes: outcome.freed_bytes,
                    });
                    deleted.push(id);
                }
                Ok(_) => not_found.push(id),
                Err(e) => {
                    warn!("Batch delete of {} failed: {}", id, e);
                    failed.push(BatchItemFailure { index, id: Some(id), error: e.to_string() });
                }
            }
        }

        info!("Batch delete for {}: {} deleted, {} bytes freed", owner_id, deleted.len(), freed_bytes);
        Ok(BatchDeleteResponse {
            success: not_found.is_empty() && failed.is_empty(),
            deleted,
            not_found,
            failed,
            freed_bytes,
        })
    }
}
