use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use issuer::blob_storage::{
    BlobPermissions, BlobStore, ObjectName, SasSigner, StorageError, StorageResult,
};
use url::Url;

pub const TEST_ACCOUNT: &str = "uploaderacct";
pub const TEST_CONTAINER: &str = "uploads";
pub const TEST_ACCOUNT_KEY: &[u8] = b"local-development-signing-key-01";

/// How the fake store misbehaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeFailure {
    None,
    /// `ensure_container` is rejected as if the key were wrong
    Unauthorized,
    /// `ensure_container` cannot reach the service
    Unreachable,
    /// Signing fails after the container check succeeded
    Signing,
}

/// In-memory store that signs real SAS URLs without any network
pub struct FakeBlobStore {
    signer: SasSigner,
    failure: FakeFailure,
    pub ensure_calls: AtomicUsize,
    pub sign_calls: AtomicUsize,
    pub container_exists: AtomicBool,
}

impl FakeBlobStore {
    pub fn new() -> Self {
        Self::failing(FakeFailure::None)
    }

    pub fn failing(failure: FakeFailure) -> Self {
        Self {
            signer: SasSigner::new(TEST_ACCOUNT, TEST_ACCOUNT_KEY.to_vec()),
            failure,
            ensure_calls: AtomicUsize::new(0),
            sign_calls: AtomicUsize::new(0),
            container_exists: AtomicBool::new(false),
        }
    }

    pub fn ensure_calls(&self) -> usize {
        self.ensure_calls.load(Ordering::SeqCst)
    }

    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStore for FakeBlobStore {
    fn container(&self) -> &str {
        TEST_CONTAINER
    }

    async fn ensure_container(&self) -> StorageResult<()> {
        self.ensure_calls.fetch_add(1, Ordering::SeqCst);
        match self.failure {
            FakeFailure::Unauthorized => Err(StorageError::Unauthorized(
                "Create container returned 403 AuthenticationFailed".to_string(),
            )),
            FakeFailure::Unreachable => Err(StorageError::Transport(
                "connection refused".to_string(),
            )),
            FakeFailure::None | FakeFailure::Signing => {
                self.container_exists.store(true, Ordering::SeqCst);
                Ok(())
            }
        }
    }

    async fn sign_upload_url(
        &self,
        object: &ObjectName,
        permissions: BlobPermissions,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> StorageResult<Url> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        if self.failure == FakeFailure::Signing {
            return Err(StorageError::Signing("Invalid account key".to_string()));
        }

        let expires_at = issued_at + chrono::Duration::from_std(ttl).unwrap();
        let query = self
            .signer
            .blob_sas_query(TEST_CONTAINER, object, permissions, expires_at)?;

        let mut url = Url::parse(&format!("https://{TEST_ACCOUNT}.blob.core.windows.net")).unwrap();
        url.path_segments_mut()
            .unwrap()
            .pop_if_empty()
            .push(TEST_CONTAINER)
            .extend(object.segments());
        url.query_pairs_mut().extend_pairs(query);
        Ok(url)
    }
}
