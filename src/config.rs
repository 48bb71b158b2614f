use anyhow::Result;
use std::env;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::models::S3BlobConfig;

/// Which blob backend to offload large payloads to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobBackendKind {
    /// No blob backend; everything is stored inline
    None,
    Local,
    S3,
    R2,
}

impl FromStr for BlobBackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "disabled" | "" => Ok(BlobBackendKind::None),
            "local" => Ok(BlobBackendKind::Local),
            "s3" => Ok(BlobBackendKind::S3),
            "r2" => Ok(BlobBackendKind::R2),
            other => Err(anyhow::anyhow!("Unknown BLOB_BACKEND '{}': expected none, local, s3 or r2", other)),
        }
    }
}

impl fmt::Display for BlobBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlobBackendKind::None => write!(f, "none"),
            BlobBackendKind::Local => write!(f, "local"),
            BlobBackendKind::S3 => write!(f, "s3"),
            BlobBackendKind::R2 => write!(f, "r2"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub blob_backend: BlobBackendKind,
    pub blob_path: String,
    /// Bucket settings when `blob_backend` is `S3` or `R2`
    pub s3_config: Option<S3BlobConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://tierstore.db".to_string());

        let blob_backend: BlobBackendKind = env::var("BLOB_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .parse()?;

        let blob_path = env::var("BLOB_PATH").unwrap_or_else(|_| "./blobs".to_string());

        let s3_config = match blob_backend {
            BlobBackendKind::S3 => Some(S3BlobConfig {
                bucket_name: required_var("S3_BUCKET_NAME")?,
                region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                access_key_id: required_var("S3_ACCESS_KEY_ID")?,
                secret_access_key: required_var("S3_SECRET_ACCESS_KEY")?,
                endpoint_url: env::var("S3_ENDPOINT_URL").ok().filter(|s| !s.is_empty()),
                prefix: env::var("S3_PREFIX").ok().filter(|s| !s.is_empty()),
            }),
            BlobBackendKind::R2 => Some(S3BlobConfig::r2(
                &required_var("R2_ACCOUNT_ID")?,
                required_var("R2_ACCESS_KEY")?,
                required_var("R2_SECRET_KEY")?,
                required_var("R2_BUCKET_NAME")?,
            )),
            BlobBackendKind::None | BlobBackendKind::Local => None,
        };

        if blob_backend == BlobBackendKind::None {
            warn!("BLOB_BACKEND=none: all payloads will be stored inline regardless of size");
        }

        Ok(Config {
            database_url,
            blob_backend,
            blob_path,
            s3_config,
        })
    }
}

fn required_var(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(anyhow::anyhow!("{} must be set for the configured blob backend", name)),
    }
}
