//! Blob storage backends that can mint signed upload URLs
mod azure;
mod error;
mod object_name;
mod s3;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use url::Url;

pub use azure::{AzureBlobStore, SasSigner, AZURE_SERVICE_VERSION};
pub use error::{StorageError, StorageResult};
pub use object_name::{ObjectName, ObjectNameError, MAX_OBJECT_NAME_BYTES};
pub use s3::S3BlobStore;

use crate::types::StorageConfig;

/// Operations a signed URL may authorize on a single blob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlobPermissions {
    /// Read the blob's content and properties
    pub read: bool,
    /// Create a new blob
    pub create: bool,
    /// Write content to the blob, overwriting it if present
    pub write: bool,
}

impl BlobPermissions {
    /// Create, write and read. Never delete or list.
    pub const UPLOAD: Self = Self {
        read: true,
        create: true,
        write: true,
    };

    /// Permission string in the order the blob service requires (`racwd...`)
    #[must_use]
    pub fn as_sas_str(&self) -> String {
        [(self.read, 'r'), (self.create, 'c'), (self.write, 'w')]
            .iter()
            .filter_map(|(granted, flag)| granted.then_some(*flag))
            .collect()
    }
}

/// A storage service holding one fixed container, able to issue signed upload URLs for it
///
/// Implementations are shared across requests behind an `Arc` and must be safe for
/// concurrent use.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Name of the container every URL is scoped to
    fn container(&self) -> &str;

    /// Creates the container unless it already exists
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the service cannot be reached, rejects the
    /// credentials, or fails for any other reason
    async fn ensure_container(&self) -> StorageResult<()>;

    /// Signs a URL for `object` in the container, valid from `issued_at` for `ttl`
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Signing`] if the URL cannot be produced
    async fn sign_upload_url(
        &self,
        object: &ObjectName,
        permissions: BlobPermissions,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> StorageResult<Url>;
}

/// Builds the storage backend selected by `config`
///
/// # Errors
///
/// Returns [`StorageError::Signing`] if the Azure account key cannot be used for signing,
/// or [`StorageError::Transport`] if the HTTP client cannot be built
pub async fn connect(config: &StorageConfig) -> StorageResult<Arc<dyn BlobStore>> {
    let store: Arc<dyn BlobStore> = match config {
        StorageConfig::Azure(azure) => Arc::new(AzureBlobStore::new(azure)?),
        StorageConfig::S3(s3) => Arc::new(S3BlobStore::new(s3).await),
    };

    tracing::info!(
        provider = %config.provider(),
        container = store.container(),
        "Configured blob storage"
    );

    Ok(store)
}
