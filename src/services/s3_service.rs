use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, info};

use aws_credential_types::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use aws_types::region::Region as AwsRegion;

use crate::models::S3BlobConfig;
use crate::storage::BlobStore;

/// Blob store backed by an S3-compatible bucket (AWS S3, Cloudflare R2, MinIO)
#[derive(Debug, Clone)]
pub struct S3Service {
    client: Client,
    config: S3BlobConfig,
}

impl S3Service {
    pub async fn new(config: S3BlobConfig) -> Result<Self> {
        // Validate required fields
        if config.bucket_name.is_empty() {
            return Err(anyhow!("Bucket name is required"));
        }
        if config.access_key_id.is_empty() {
            return Err(anyhow!("Access key ID is required"));
        }
        if config.secret_access_key.is_empty() {
            return Err(anyhow!("Secret access key is required"));
        }

        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None, // session token
            None, // expiry
            "tierstore-blob-store",
        );

        let region = if config.region.is_empty() {
            "us-east-1".to_string()
        } else {
            config.region.clone()
        };

        let mut s3_config_builder = aws_sdk_s3::config::Builder::new()
            .region(AwsRegion::new(region))
            .credentials_provider(credentials)
            .behavior_version_latest();

        // Set custom endpoint if provided (for S3-compatible services)
        if let Some(endpoint_url) = &config.endpoint_url {
            if !endpoint_url.is_empty() {
                s3_config_builder = s3_config_builder.endpoint_url(endpoint_url);
                info!("Using custom S3 endpoint: {}", endpoint_url);
            }
        }

        let client = Client::from_conf(s3_config_builder.build());

        Ok(Self { client, config })
    }

    pub fn get_config(&self) -> &S3BlobConfig {
        &self.config
    }

    /// Test connection and access to the bucket
    pub async fn test_connection(&self) -> Result<()> {
        info!("Testing S3 connection to bucket: {}", self.config.bucket_name);

        self.client
            .head_bucket()
            .bucket(&self.config.bucket_name)
            .send()
            .await
            .map_err(|e| anyhow!("Cannot access bucket {}: {}", self.config.bucket_name, e))?;

        Ok(())
    }

    /// Full object key, including the configured prefix
    fn object_key(&self, key: &str) -> String {
        match self.config.prefix.as_deref().map(|p| p.trim_end_matches('/')) {
            Some(prefix) if !prefix.is_empty() => format!("{}/{}", prefix, key),
            _ => key.to_string(),
        }
    }

    fn object_metadata(data: &[u8]) -> HashMap<String, String> {
        let mut metadata = HashMap::new();
        metadata.insert("uploaded-at".to_string(), chrono::Utc::now().to_rfc3339());
        metadata.insert("size-bytes".to_string(), data.len().to_string());
        metadata
    }
}

#[async_trait]
impl BlobStore for S3Service {
    async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let object_key = self.object_key(key);
        info!("Storing blob to S3: {}/{}", self.config.bucket_name, object_key);

        let mut put_request = self
            .client
            .put_object()
            .bucket(&self.config.bucket_name)
            .key(&object_key)
            .content_type("application/json")
            .body(ByteStream::from(data.to_vec()));

        for (k, v) in Self::object_metadata(data) {
            put_request = put_request.metadata(k, v);
        }

        put_request
            .send()
            .await
            .map_err(|e| anyhow!("Failed to store blob {}: {}", object_key, e))?;

        info!("Successfully stored blob: {} ({} bytes)", object_key, data.len());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let object_key = self.object_key(key);
        debug!("Retrieving blob from S3: {}/{}", self.config.bucket_name, object_key);

        let response = self
            .client
            .get_object()
            .bucket(&self.config.bucket_name)
            .key(&object_key)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to retrieve blob {}: {}", object_key, e))?;

        let body = response
            .body
            .collect()
            .await
            .map_err(|e| anyhow!("Failed to read blob body: {}", e))?;

        let bytes = body.into_bytes().to_vec();
        debug!("Retrieved blob: {} ({} bytes)", object_key, bytes.len());
        Ok(bytes)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let object_key = self.object_key(key);
        info!("Deleting blob from S3: {}/{}", self.config.bucket_name, object_key);

        // DeleteObject succeeds for absent keys
        self.client
            .delete_object()
            .bucket(&self.config.bucket_name)
            .key(&object_key)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to delete blob {}: {}", object_key, e))?;

        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let object_key = self.object_key(key);
        match self
            .client
            .head_object()
            .bucket(&self.config.bucket_name)
            .key(&object_key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let error_msg = e.to_string();
                if error_msg.contains("NotFound") || error_msg.contains("404") {
                    Ok(false)
                } else {
                    Err(anyhow!("Failed to check blob existence {}: {}", object_key, e))
                }
            }
        }
    }

    fn storage_type(&self) -> &'static str {
        "s3"
    }

    async fn initialize(&self) -> Result<()> {
        self.test_connection().await?;
        info!("S3 blob store initialized successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> S3BlobConfig {
        S3BlobConfig {
            bucket_name: "test-bucket".to_string(),
            region: "us-east-1".to_string(),
            access_key_id: "test-key".to_string(),
            secret_access_key: "test-secret".to_string(),
            endpoint_url: Some("http://localhost:9000".to_string()),
            prefix: None,
        }
    }

    #[tokio::test]
    async fn test_s3_config_validation() {
        let mut config = test_config();
        config.bucket_name = String::new();

        let result = S3Service::new(config).await;
        assert!(result.unwrap_err().to_string().contains("Bucket name is required"));

        let mut config = test_config();
        config.secret_access_key = String::new();
        assert!(S3Service::new(config).await.is_err());
    }

    #[tokio::test]
    async fn test_s3_client_creation_does_not_touch_network() {
        let service = S3Service::new(test_config()).await.unwrap();
        assert_eq!(service.get_config().bucket_name, "test-bucket");
        assert_eq!(service.storage_type(), "s3");
    }

    #[tokio::test]
    async fn test_object_key_applies_prefix() {
        let mut config = test_config();
        config.prefix = Some("tenant-data/".to_string());
        let service = S3Service::new(config).await.unwrap();
        assert_eq!(service.object_key("u/c/1.json"), "tenant-data/u/c/1.json");

        let service = S3Service::new(test_config()).await.unwrap();
        assert_eq!(service.object_key("u/c/1.json"), "u/c/1.json");
    }
}
