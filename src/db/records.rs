use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{FromRow, Row};
use uuid::Uuid;

use super::{Database, MetadataStore};
use crate::models::{CollectionStats, RecordSummary, StorageTier, StoredPayload, StoredRecord};

/// Raw `records` row as stored in SQLite
#[derive(Debug, FromRow)]
struct RecordRow {
    id: String,
    owner_id: String,
    collection: String,
    tier: String,
    payload: Option<String>,
    blob_key: Option<String>,
    size_bytes: i64,
    data_preview: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RecordRow> for StoredRecord {
    type Error = anyhow::Error;

    fn try_from(row: RecordRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id).with_context(|| format!("Invalid record id in metadata store: {}", row.id))?;
        let tier: StorageTier = row.tier.parse()?;

        let stored = match (tier, row.payload, row.blob_key) {
            (StorageTier::Inline, Some(payload), None) => StoredPayload::Inline {
                payload: serde_json::from_str(&payload)
                    .with_context(|| format!("Corrupt inline payload for record {}", id))?,
            },
            (StorageTier::Blob, None, Some(key)) => StoredPayload::Blob { key },
            (tier, payload, key) => {
                return Err(anyhow::anyhow!(
                    "Record {} has inconsistent {} metadata (payload present: {}, blob key present: {})",
                    id,
                    tier,
                    payload.is_some(),
                    key.is_some()
                ));
            }
        };

        Ok(StoredRecord {
            id,
            owner_id: row.owner_id,
            collection: row.collection,
            stored,
            size_bytes: row.size_bytes,
            data_preview: row.data_preview,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Split a payload location into the `(payload, blob_key)` column pair
fn location_columns(stored: &StoredPayload) -> Result<(Option<String>, Option<String>)> {
    match stored {
        StoredPayload::Inline { payload } => Ok((Some(serde_json::to_string(payload)?), None)),
        StoredPayload::Blob { key } => Ok((None, Some(key.clone()))),
    }
}

/// Fixed-width RFC 3339 text, so `ORDER BY created_at` on the TEXT column is chronological
fn timestamp_column(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

#[async_trait]
impl MetadataStore for Database {
    async fn insert_record(&self, record: &StoredRecord) -> Result<()> {
        let (payload, blob_key) = location_columns(&record.stored)?;

        sqlx::query(
            r#"INSERT INTO records
               (id, owner_id, collection, tier, payload, blob_key, size_bytes, data_preview, created_at, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"#,
        )
        .bind(record.id.to_string())
        .bind(&record.owner_id)
        .bind(&record.collection)
        .bind(record.tier().to_string())
        .bind(payload)
        .bind(blob_key)
        .bind(record.size_bytes)
        .bind(&record.data_preview)
        .bind(timestamp_column(&record.created_at))
        .bind(timestamp_column(&record.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!("Database insert failed: {}", e))?;

        Ok(())
    }

    async fn find_record(&self, id: Uuid, owner_id: Option<&str>) -> Result<Option<StoredRecord>> {
        let row = sqlx::query_as::<_, RecordRow>(
            r#"SELECT id, owner_id, collection, tier, payload, blob_key, size_bytes,
                      data_preview, created_at, updated_at
               FROM records
               WHERE id = ?1 AND (?2 IS NULL OR owner_id = ?2)"#,
        )
        .bind(id.to_string())
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!("Database query failed: {}", e))?;

        row.map(StoredRecord::try_from).transpose()
    }

    async fn update_record(&self, record: &StoredRecord) -> Result<bool> {
        let (payload, blob_key) = location_columns(&record.stored)?;

        let result = sqlx::query(
            r#"UPDATE records
               SET tier = ?3, payload = ?4, blob_key = ?5, size_bytes = ?6,
                   data_preview = ?7, updated_at = ?8
               WHERE id = ?1 AND owner_id = ?2"#,
        )
        .bind(record.id.to_string())
        .bind(&record.owner_id)
        .bind(record.tier().to_string())
        .bind(payload)
        .bind(blob_key)
        .bind(record.size_bytes)
        .bind(&record.data_preview)
        .bind(timestamp_column(&record.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!("Database update failed: {}", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_record(&self, id: Uuid, owner_id: Option<&str>) -> Result<bool> {
        let result = sqlx::query("DELETE FROM records WHERE id = ?1 AND (?2 IS NULL OR owner_id = ?2)")
            .bind(id.to_string())
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(|e| anyhow::anyhow!("Database delete failed: {}", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_records(&self, owner_id: &str, collection: Option<&str>, limit: i64, skip: i64) -> Result<Vec<RecordSummary>> {
        let rows = sqlx::query(
            r#"SELECT id, collection, tier, size_bytes, data_preview, created_at, updated_at
               FROM records
               WHERE owner_id = ?1 AND (?2 IS NULL OR collection = ?2)
               ORDER BY created_at DESC, id DESC
               LIMIT ?3 OFFSET ?4"#,
        )
        .bind(owner_id)
        .bind(collection)
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!("Database query failed: {}", e))?;

        rows.into_iter()
            .map(|row| -> Result<RecordSummary> {
                let id: String = row.get("id");
                let tier: String = row.get("tier");
                Ok(RecordSummary {
                    id: Uuid::parse_str(&id).with_context(|| format!("Invalid record id in metadata store: {}", id))?,
                    collection: row.get("collection"),
                    tier: tier.parse()?,
                    size_bytes: row.get("size_bytes"),
                    data_preview: row.get("data_preview"),
                    created_at: row.get("created_at"),
                    updated_at: row.get("updated_at"),
                })
            })
            .collect()
    }

    async fn count_records(&self, owner_id: &str, collection: Option<&str>) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM records WHERE owner_id = ?1 AND (?2 IS NULL OR collection = ?2)",
        )
        .bind(owner_id)
        .bind(collection)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!("Database query failed: {}", e))?;

        Ok(count)
    }

    async fn collection_stats(&self, owner_id: &str) -> Result<Vec<CollectionStats>> {
        let rows = sqlx::query(
            r#"SELECT collection, COUNT(*) AS count, COALESCE(SUM(size_bytes), 0) AS total_size
               FROM records
               WHERE owner_id = ?1
               GROUP BY collection
               ORDER BY count DESC, collection ASC"#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!("Database query failed: {}", e))?;

        Ok(rows
            .into_iter()
            .map(|row| CollectionStats {
                name: row.get("collection"),
                count: row.get("count"),
                total_size: row.get("total_size"),
            })
            .collect())
    }
}
