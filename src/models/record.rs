use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Number of characters kept in `data_preview` for blob-tier records
pub const DATA_PREVIEW_CHARS: usize = 200;

/// Where a record's payload physically lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageTier {
    /// Embedded in the metadata record
    Inline,
    /// Offloaded to the blob store, referenced by key
    Blob,
}

impl fmt::Display for StorageTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageTier::Inline => write!(f, "inline"),
            StorageTier::Blob => write!(f, "blob"),
        }
    }
}

impl FromStr for StorageTier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inline" => Ok(StorageTier::Inline),
            "blob" => Ok(StorageTier::Blob),
            other => Err(anyhow::anyhow!("Unknown storage tier: {}", other)),
        }
    }
}

/// Payload location as recorded in metadata.
///
/// Exactly one of the inline value or the blob key exists for any record, so
/// every read, update and delete site matches on this instead of on a tier
/// string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tier", rename_all = "lowercase")]
pub enum StoredPayload {
    Inline { payload: Value },
    Blob { key: String },
}

impl StoredPayload {
    pub fn tier(&self) -> StorageTier {
        match self {
            StoredPayload::Inline { .. } => StorageTier::Inline,
            StoredPayload::Blob { .. } => StorageTier::Blob,
        }
    }

    pub fn blob_key(&self) -> Option<&str> {
        match self {
            StoredPayload::Inline { .. } => None,
            StoredPayload::Blob { key } => Some(key),
        }
    }
}

/// One logical stored item, as held by the metadata store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: Uuid,
    pub owner_id: String,
    pub collection: String,
    #[serde(flatten)]
    pub stored: StoredPayload,
    /// Byte length of the compact JSON serialization at last write
    pub size_bytes: i64,
    /// Leading characters of the serialized payload, blob tier only
    pub data_preview: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredRecord {
    pub fn tier(&self) -> StorageTier {
        self.stored.tier()
    }

    pub fn blob_key(&self) -> Option<&str> {
        self.stored.blob_key()
    }

    /// Inline payload, if this record keeps one
    pub fn inline_payload(&self) -> Option<&Value> {
        match &self.stored {
            StoredPayload::Inline { payload } => Some(payload),
            StoredPayload::Blob { .. } => None,
        }
    }
}

/// A record together with its resolved payload, whichever tier it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedRecord {
    pub id: Uuid,
    pub owner_id: String,
    pub collection: String,
    pub data: Value,
    pub size_bytes: i64,
    pub tier: StorageTier,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RetrievedRecord {
    pub fn from_record(record: StoredRecord, data: Value) -> Self {
        let tier = record.tier();
        Self {
            id: record.id,
            owner_id: record.owner_id,
            collection: record.collection,
            data,
            size_bytes: record.size_bytes,
            tier,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOutcome {
    pub id: Uuid,
    pub size_bytes: i64,
    pub tier: StorageTier,
    pub updated_at: DateTime<Utc>,
}

/// Result of a delete; `success` is false when the record did not exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub success: bool,
    pub freed_bytes: i64,
}

impl DeleteOutcome {
    pub fn not_found() -> Self {
        Self { success: false, freed_bytes: 0 }
    }
}

/// Leading `DATA_PREVIEW_CHARS` characters of a serialized payload
pub fn data_preview(serialized: &str) -> String {
    serialized.chars().take(DATA_PREVIEW_CHARS).collect()
}
