//! Post-operation side effects (webhooks, audit trails) hang off this
//! observer interface. The router never emits events itself; its callers do,
//! after an operation has succeeded.

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::models::StorageTier;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StorageEvent {
    Created {
        owner_id: String,
        id: Uuid,
        collection: String,
        tier: StorageTier,
        size_bytes: i64,
    },
    Updated {
        owner_id: String,
        id: Uuid,
        tier: StorageTier,
        size_bytes: i64,
    },
    Deleted {
        owner_id: String,
        id: Uuid,
        freed_bytes: i64,
    },
}

impl StorageEvent {
    pub fn name(&self) -> &'static str {
        match self {
            StorageEvent::Created { .. } => "data.created",
            StorageEvent::Updated { .. } => "data.updated",
            StorageEvent::Deleted { .. } => "data.deleted",
        }
    }
}

/// Receiver for storage events. Implementations must not fail the caller;
/// delivery problems are theirs to log.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &StorageEvent);
}

/// Default sink: one structured log line per event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: &StorageEvent) {
        match event {
            StorageEvent::Created { owner_id, id, collection, tier, size_bytes } => {
                info!(event = event.name(), %owner_id, %id, %collection, %tier, size_bytes, "storage event");
            }
            StorageEvent::Updated { owner_id, id, tier, size_bytes } => {
                info!(event = event.name(), %owner_id, %id, %tier, size_bytes, "storage event");
            }
            StorageEvent::Deleted { owner_id, id, freed_bytes } => {
                info!(event = event.name(), %owner_id, %id, freed_bytes, "storage event");
            }
        }
    }
}
