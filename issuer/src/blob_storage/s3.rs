//! S3-compatible backend built on the AWS SDK
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion, Region};
use aws_sdk_s3::{
    config::Credentials,
    error::SdkError,
    operation::{create_bucket::CreateBucketError, head_bucket::HeadBucketError},
    presigning::PresigningConfig,
    types::{BucketLocationConstraint, CreateBucketConfiguration},
    Client as S3Client,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info};
use url::Url;

use super::{BlobPermissions, BlobStore, ObjectName, StorageError, StorageResult};
use crate::types::S3Config;

const DEFAULT_REGION: &str = "us-east-1";

/// S3 bucket that issues presigned `PutObject` URLs
///
/// A `SigV4` presigned URL is bound to one HTTP method, so the URL authorizes the
/// create/write half of [`BlobPermissions::UPLOAD`] through `PUT`.
pub struct S3BlobStore {
    s3_client: S3Client,
    bucket_name: String,
    region: String,
}

impl S3BlobStore {
    /// Creates a store for the configured bucket
    ///
    /// SDK retries are disabled: a failed call fails the request that made it.
    pub async fn new(config: &S3Config) -> Self {
        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None,
            None,
            "issuer-static-config",
        );

        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(30))
            .build();

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .retry_config(RetryConfig::disabled())
            .timeout_config(timeout_config);

        if let Some(endpoint_url) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }

        let sdk_config = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);

        // Custom endpoints (LocalStack, MinIO) generally need path-style addressing
        // https://github.com/awslabs/aws-sdk-rust/discussions/874
        if config.endpoint_url.is_some() {
            builder.set_force_path_style(Some(true));
        }

        Self::from_client(
            S3Client::from_conf(builder.build()),
            config.bucket.clone(),
            config.region.clone(),
        )
    }

    /// Wraps an already configured client
    #[must_use]
    pub const fn from_client(s3_client: S3Client, bucket_name: String, region: String) -> Self {
        Self {
            s3_client,
            bucket_name,
            region,
        }
    }

    async fn create_bucket(&self) -> StorageResult<()> {
        let mut request = self.s3_client.create_bucket().bucket(&self.bucket_name);

        if self.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => {
                info!(bucket = %self.bucket_name, "Created storage bucket");
                Ok(())
            }
            // Another caller won the race
            Err(SdkError::ServiceError(service_err))
                if matches!(
                    service_err.err(),
                    CreateBucketError::BucketAlreadyOwnedByYou(_)
                        | CreateBucketError::BucketAlreadyExists(_)
                ) =>
            {
                Ok(())
            }
            Err(e) => Err(StorageError::from(e)),
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    fn container(&self) -> &str {
        &self.bucket_name
    }

    async fn ensure_container(&self) -> StorageResult<()> {
        let result = self
            .s3_client
            .head_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await;

        match result {
            Ok(_) => {
                debug!(bucket = %self.bucket_name, "Storage bucket already exists");
                Ok(())
            }
            Err(SdkError::ServiceError(service_err))
                if matches!(service_err.err(), HeadBucketError::NotFound(_)) =>
            {
                self.create_bucket().await
            }
            Err(e) => Err(StorageError::from(e)),
        }
    }

    async fn sign_upload_url(
        &self,
        object: &ObjectName,
        _permissions: BlobPermissions,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> StorageResult<Url> {
        let presigning_config = PresigningConfig::builder()
            .start_time(SystemTime::from(issued_at))
            .expires_in(ttl)
            .build()
            .map_err(|e| {
                StorageError::Signing(format!("Failed to create presigning config: {e}"))
            })?;

        let presigned_request = self
            .s3_client
            .put_object()
            .bucket(&self.bucket_name)
            .key(object.as_str())
            .presigned(presigning_config)
            .await
            .map_err(|e| StorageError::Signing(format!("Failed to generate presigned URL: {e}")))?;

        Url::parse(presigned_request.uri())
            .map_err(|e| StorageError::Signing(format!("Presigned URL is malformed: {e}")))
    }
}
