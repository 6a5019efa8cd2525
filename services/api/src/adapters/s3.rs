//! services/api/src/adapters/s3.rs
//!
//! Implements the `UploadUrlIssuer` port with S3 presigned `PutObject` URLs.
//! The signature lives entirely in the URL's query string, which is why the
//! store only ever persists the base form.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;

use recommendations_core::ports::{PortError, PortResult, UploadUrlIssuer};

/// An adapter that issues time-limited, write-capable S3 URLs.
#[derive(Clone)]
pub struct S3UrlIssuer {
    client: aws_sdk_s3::Client,
    bucket: String,
    expires_in: Duration,
}

impl S3UrlIssuer {
    /// Creates a new `S3UrlIssuer` for the given bucket.
    pub fn new(client: aws_sdk_s3::Client, bucket: String, expires_in: Duration) -> Self {
        Self {
            client,
            bucket,
            expires_in,
        }
    }
}

#[async_trait]
impl UploadUrlIssuer for S3UrlIssuer {
    async fn issue_upload_url(&self, blob_key: &str) -> PortResult<String> {
        let presigning = PresigningConfig::expires_in(self.expires_in)
            .map_err(|e| PortError::StoreUnavailable(e.to_string()))?;

        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(blob_key)
            .presigned(presigning)
            .await
            .map_err(|e| PortError::StoreUnavailable(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }
}
