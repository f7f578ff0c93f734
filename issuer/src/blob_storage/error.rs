//! Error types for blob storage operations

use aws_sdk_s3::{
    error::SdkError,
    operation::{create_bucket::CreateBucketError, head_bucket::HeadBucketError},
};
use thiserror::Error;

/// Result type for blob storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while talking to, or signing for, the storage service
#[derive(Error, Debug)]
pub enum StorageError {
    /// The storage service rejected our credentials
    #[error("Storage authentication failed: {0}")]
    Unauthorized(String),

    /// The storage service answered with an unexpected status
    #[error("Storage service error (status {status}): {message}")]
    Service {
        /// HTTP status returned by the storage service
        status: u16,
        /// Service error code or body excerpt
        message: String,
    },

    /// The storage service could not be reached
    #[error("Storage transport error: {0}")]
    Transport(String),

    /// A signature or signed URL could not be produced
    #[error("Signing error: {0}")]
    Signing(String),

    /// AWS SDK error
    #[error("AWS SDK error: {0}")]
    AwsError(String),
}

impl From<reqwest::Error> for StorageError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(error.to_string())
    }
}

impl From<SdkError<HeadBucketError>> for StorageError {
    fn from(error: SdkError<HeadBucketError>) -> Self {
        match error {
            SdkError::ServiceError(err) => {
                let status = err.raw().status().as_u16();
                if status == 401 || status == 403 {
                    Self::Unauthorized(format!("HeadBucket returned {status}"))
                } else {
                    Self::Service {
                        status,
                        message: format!("{:?}", err.err()),
                    }
                }
            }
            _ => Self::AwsError(error.to_string()),
        }
    }
}

impl From<SdkError<CreateBucketError>> for StorageError {
    fn from(error: SdkError<CreateBucketError>) -> Self {
        match error {
            SdkError::ServiceError(err) => Self::Service {
                status: err.raw().status().as_u16(),
                message: format!("{:?}", err.err()),
            },
            _ => Self::AwsError(error.to_string()),
        }
    }
}
