//! Factory for creating blob stores based on configuration

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use super::local::LocalBlobStore;
use super::{BlobStore, BlobStoreConfig};
use crate::config::{BlobBackendKind, Config};

#[cfg(feature = "s3")]
use crate::services::s3_service::S3Service;

/// Create a blob store based on the provided configuration.
///
/// Returns `None` for [`BlobStoreConfig::Disabled`], which makes the router
/// keep every payload inline.
pub async fn create_blob_store(config: BlobStoreConfig) -> Result<Option<Arc<dyn BlobStore>>> {
    match config {
        BlobStoreConfig::Disabled => {
            info!("Blob storage disabled; payloads will be stored inline");
            Ok(None)
        }
        BlobStoreConfig::Local { root_path } => {
            let store = LocalBlobStore::new(root_path);
            store.initialize().await?;
            Ok(Some(Arc::new(store)))
        }
        #[cfg(feature = "s3")]
        BlobStoreConfig::S3 { s3_config } => {
            let store = S3Service::new(s3_config).await?;
            store.initialize().await?;
            Ok(Some(Arc::new(store)))
        }
    }
}

/// Create blob store configuration from the loaded environment config
pub fn blob_config_from_env(config: &Config) -> BlobStoreConfig {
    match config.blob_backend {
        BlobBackendKind::None => BlobStoreConfig::Disabled,
        BlobBackendKind::Local => BlobStoreConfig::Local {
            root_path: config.blob_path.clone(),
        },
        BlobBackendKind::S3 | BlobBackendKind::R2 => {
            #[cfg(feature = "s3")]
            {
                if let Some(s3_config) = &config.s3_config {
                    BlobStoreConfig::S3 {
                        s3_config: s3_config.clone(),
                    }
                } else {
                    tracing::warn!("{} blob backend requested without bucket settings, disabling blob storage", config.blob_backend);
                    BlobStoreConfig::Disabled
                }
            }
            #[cfg(not(feature = "s3"))]
            {
                // S3 requested but not compiled in
                tracing::warn!("{} blob backend requested but S3 feature not compiled in, disabling blob storage", config.blob_backend);
                BlobStoreConfig::Disabled
            }
        }
    }
}
