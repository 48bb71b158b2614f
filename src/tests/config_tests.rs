use crate::config::{BlobBackendKind, Config};
use std::env;
use std::sync::Mutex;

// Environment variables are process-global; serialize the tests that touch them
static ENV_LOCK: Mutex<()> = Mutex::new(());

// Helper function to clear environment variables
fn clear_env_vars() {
    for name in [
        "DATABASE_URL",
        "BLOB_BACKEND",
        "BLOB_PATH",
        "S3_BUCKET_NAME",
        "S3_REGION",
        "S3_ACCESS_KEY_ID",
        "S3_SECRET_ACCESS_KEY",
        "S3_ENDPOINT_URL",
        "S3_PREFIX",
        "R2_ACCOUNT_ID",
        "R2_ACCESS_KEY",
        "R2_SECRET_KEY",
        "R2_BUCKET_NAME",
    ] {
        env::remove_var(name);
    }
}

#[test]
fn test_defaults_when_nothing_is_set() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env_vars();

    let config = Config::from_env().expect("Config should load successfully");

    assert_eq!(config.database_url, "sqlite://tierstore.db");
    assert_eq!(config.blob_backend, BlobBackendKind::Local);
    assert_eq!(config.blob_path, "./blobs");
    assert!(config.s3_config.is_none());
}

#[test]
fn test_none_backend_disables_blob_storage() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env_vars();
    env::set_var("BLOB_BACKEND", "none");

    let config = Config::from_env().expect("Config should load successfully");

    assert_eq!(config.blob_backend, BlobBackendKind::None);
    assert!(config.s3_config.is_none());
}

#[test]
fn test_s3_backend_reads_credentials() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env_vars();
    env::set_var("BLOB_BACKEND", "S3");
    env::set_var("S3_BUCKET_NAME", "records");
    env::set_var("S3_ACCESS_KEY_ID", "key");
    env::set_var("S3_SECRET_ACCESS_KEY", "secret");
    env::set_var("S3_ENDPOINT_URL", "http://localhost:9000");

    let config = Config::from_env().expect("Config should load successfully");

    let s3 = config.s3_config.expect("S3 config should be present");
    assert_eq!(config.blob_backend, BlobBackendKind::S3);
    assert_eq!(s3.bucket_name, "records");
    assert_eq!(s3.region, "us-east-1");
    assert_eq!(s3.endpoint_url.as_deref(), Some("http://localhost:9000"));
    assert!(s3.prefix.is_none());
}

#[test]
fn test_s3_backend_without_bucket_is_an_error() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env_vars();
    env::set_var("BLOB_BACKEND", "s3");
    env::set_var("S3_ACCESS_KEY_ID", "key");
    env::set_var("S3_SECRET_ACCESS_KEY", "secret");

    let err = Config::from_env().unwrap_err();
    assert!(err.to_string().contains("S3_BUCKET_NAME"));
}

#[test]
fn test_r2_backend_builds_account_endpoint() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env_vars();
    env::set_var("BLOB_BACKEND", "r2");
    env::set_var("R2_ACCOUNT_ID", "abc123");
    env::set_var("R2_ACCESS_KEY", "key");
    env::set_var("R2_SECRET_KEY", "secret");
    env::set_var("R2_BUCKET_NAME", "records-bucket");

    let config = Config::from_env().expect("Config should load successfully");

    let s3 = config.s3_config.expect("R2 config should be present");
    assert_eq!(s3.region, "auto");
    assert_eq!(s3.endpoint_url.as_deref(), Some("https://abc123.r2.cloudflarestorage.com"));
    assert_eq!(s3.bucket_name, "records-bucket");
}

#[test]
fn test_unknown_backend_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env_vars();
    env::set_var("BLOB_BACKEND", "mongodb");

    assert!(Config::from_env().is_err());
}
