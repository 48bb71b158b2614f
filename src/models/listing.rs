use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::record::StorageTier;

/// Default page size for record listings
pub const DEFAULT_LIST_LIMIT: i64 = 100;
/// Upper bound on page size for record listings
pub const MAX_LIST_LIMIT: i64 = 1000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListQuery {
    /// Restrict to a single collection
    pub collection: Option<String>,
    /// Maximum number of results to return (default: 100, max: 1000)
    pub limit: Option<i64>,
    /// Number of results to skip for pagination (default: 0)
    pub skip: Option<i64>,
}

impl ListQuery {
    pub fn effective_limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
    }

    pub fn effective_skip(&self) -> i64 {
        self.skip.unwrap_or(0).max(0)
    }
}

/// Metadata-only view of a record; never touches the blob store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSummary {
    pub id: Uuid,
    pub collection: String,
    pub tier: StorageTier,
    pub size_bytes: i64,
    pub data_preview: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPage {
    pub items: Vec<RecordSummary>,
    pub total: i64,
    pub limit: i64,
    pub skip: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub name: String,
    pub count: i64,
    pub total_size: i64,
}
