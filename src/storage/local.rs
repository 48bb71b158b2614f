//! Local filesystem blob store implementation

use anyhow::Result;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info};

use super::BlobStore;

/// Local filesystem blob store; each key maps to a file below `root_path`
pub struct LocalBlobStore {
    root_path: String,
}

impl LocalBlobStore {
    /// Create a new local blob store
    pub fn new(root_path: String) -> Self {
        Self { root_path }
    }

    /// Resolve a key to a file path, rejecting anything that would escape the root
    fn resolve_key(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() {
            return Err(anyhow::anyhow!("Blob key cannot be empty"));
        }
        if key.contains('\0') {
            return Err(anyhow::anyhow!("Blob key contains null bytes"));
        }

        let relative = Path::new(key);
        for component in relative.components() {
            match component {
                Component::Normal(_) => {}
                _ => {
                    error!("Rejected blob key outside store root: {}", key);
                    return Err(anyhow::anyhow!("Invalid blob key: {}", key));
                }
            }
        }

        Ok(Path::new(&self.root_path).join(relative))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.resolve_key(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        fs::write(&path, data).await?;

        info!("Stored blob locally: {} ({} bytes)", path.display(), data.len());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.resolve_key(key)?;
        match fs::read(&path).await {
            Ok(data) => {
                debug!("Read blob {} ({} bytes)", path.display(), data.len());
                Ok(data)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(anyhow::anyhow!("Blob not found: {}", key))
            }
            Err(e) => Err(anyhow::anyhow!("Failed to read blob {}: {}", key, e)),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.resolve_key(key)?;
        match fs::remove_file(&path).await {
            Ok(_) => {
                info!("Deleted blob: {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Blob already deleted: {}", path.display());
                Ok(())
            }
            Err(e) => {
                error!("Failed to delete blob {}: {}", path.display(), e);
                Err(anyhow::anyhow!("Failed to delete blob {}: {}", key, e))
            }
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.resolve_key(key)?;
        Ok(fs::try_exists(&path).await?)
    }

    fn storage_type(&self) -> &'static str {
        "local"
    }

    async fn initialize(&self) -> Result<()> {
        let base_path = Path::new(&self.root_path);
        if let Err(e) = fs::create_dir_all(base_path).await {
            error!("Failed to create blob directory {:?}: {}", base_path, e);
            return Err(anyhow::anyhow!("Failed to create blob directory: {}", e));
        }
        info!("Ensured blob directory exists: {:?}", base_path);
        Ok(())
    }
}
