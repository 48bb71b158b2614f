//! Error types surfaced by the storage router and batch layer

use thiserror::Error;
use uuid::Uuid;

pub type RouterResult<T> = std::result::Result<T, RouterError>;

#[derive(Error, Debug)]
pub enum RouterError {
    /// The metadata store failed or was unreachable
    #[error("Metadata store error: {0}")]
    Metadata(#[source] anyhow::Error),

    /// The blob store failed while reading or writing `key`. Distinct from a
    /// missing record: the metadata exists but the content is unavailable.
    #[error("Blob store error for {key}: {source}")]
    Blob {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// A blob-tier record was found but no blob store is configured to read it
    #[error("Record {id} is stored in blob storage but no blob store is configured")]
    BlobStoreMissing { id: Uuid },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RouterError {
    pub(crate) fn blob(key: &str, source: anyhow::Error) -> Self {
        RouterError::Blob {
            key: key.to_string(),
            source,
        }
    }
}

/// Request-level validation failures for batch operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    #[error("No items provided")]
    EmptyBatch,

    #[error("Maximum {max} items allowed per batch, got {got}")]
    TooManyItems { max: usize, got: usize },
}
