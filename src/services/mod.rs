pub mod batch;
pub mod storage_router;

#[cfg(feature = "s3")]
pub mod s3_service;
