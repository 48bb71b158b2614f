//! Blob storage abstraction for offloaded payloads
//!
//! This module provides a clean abstraction over different blob backends
//! (local filesystem, S3/R2) with a unified key-value interface. Keys are
//! opaque strings built by [`blob_key`].

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

pub mod factory;
pub mod local;

/// Core blob store trait that all backend implementations must implement
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `data` under `key`, replacing any existing object
    async fn put(&self, key: &str, data: &[u8]) -> Result<()>;

    /// Read the object stored under `key`
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Remove the object stored under `key`. Removing an absent object succeeds.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if an object exists under `key`
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Get a human-readable identifier for this backend type
    fn storage_type(&self) -> &'static str;

    /// Initialize the backend (create directories, validate access, etc.)
    async fn initialize(&self) -> Result<()>;
}

/// Blob backend selection
#[derive(Debug, Clone)]
pub enum BlobStoreConfig {
    /// No blob backend; every payload is kept inline
    Disabled,
    /// Local filesystem storage
    Local {
        root_path: String,
    },
    /// S3-compatible storage (AWS S3, Cloudflare R2)
    #[cfg(feature = "s3")]
    S3 {
        s3_config: crate::models::S3BlobConfig,
    },
}

/// Deterministic key for an offloaded payload: `{owner}/{collection}/{id}.json`
pub fn blob_key(owner_id: &str, collection: &str, id: Uuid) -> String {
    format!("{}/{}/{}.json", encode_segment(owner_id), encode_segment(collection), id)
}

/// Percent-encode one key segment so it can never act as a path separator
/// or a relative directory component.
fn encode_segment(segment: &str) -> String {
    if segment.is_empty() {
        return "_".to_string();
    }
    let encoded = urlencoding::encode(segment).into_owned();
    if encoded.chars().all(|c| c == '.') {
        encoded.replace('.', "%2E")
    } else {
        encoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_key_layout() {
        let id = Uuid::new_v4();
        assert_eq!(blob_key("user-1", "notes", id), format!("user-1/notes/{}.json", id));
    }

    #[test]
    fn test_blob_key_escapes_separators_and_dot_segments() {
        let id = Uuid::new_v4();
        let key = blob_key("../etc", "a/b", id);
        assert_eq!(key, format!("..%2Fetc/a%2Fb/{}.json", id));
        assert_eq!(key.split('/').count(), 3);

        let key = blob_key("..", ".", id);
        assert_eq!(key, format!("%2E%2E/%2E/{}.json", id));

        let key = blob_key("", "notes", id);
        assert!(key.starts_with("_/notes/"));
    }
}
