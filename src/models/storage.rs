use serde::{Deserialize, Serialize};

/// Connection settings for an S3-compatible blob bucket (AWS S3, Cloudflare R2, MinIO)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3BlobConfig {
    pub bucket_name: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub endpoint_url: Option<String>, // For S3-compatible services
    pub prefix: Option<String>,       // Optional key prefix inside the bucket
}

impl S3BlobConfig {
    /// Cloudflare R2 settings for the given account
    pub fn r2(account_id: &str, access_key: String, secret_key: String, bucket_name: String) -> Self {
        Self {
            bucket_name,
            region: "auto".to_string(),
            access_key_id: access_key,
            secret_access_key: secret_key,
            endpoint_url: Some(format!("https://{}.r2.cloudflarestorage.com", account_id)),
            prefix: None,
        }
    }
}
