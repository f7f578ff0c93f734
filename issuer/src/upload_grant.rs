//! Issuance of signed upload grants

use std::time::Duration;

use chrono::{DateTime, SubsecRound, Utc};
use thiserror::Error;
use url::Url;

use crate::blob_storage::{BlobPermissions, BlobStore, ObjectName, ObjectNameError, StorageError};

/// How long a grant stays valid after issuance
pub const UPLOAD_GRANT_TTL: Duration = Duration::from_secs(60 * 60);

/// A capability to write one object, handed to the client and never stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadGrant {
    /// Object URL with the signature in its query string
    pub url: Url,
    /// Accepted object name
    pub object_name: ObjectName,
    /// Second-precision instant after which the storage service rejects the URL
    pub expires_at: DateTime<Utc>,
    /// Operations the grant was issued for
    pub permissions: BlobPermissions,
}

/// Reasons a grant could not be issued
#[derive(Error, Debug)]
pub enum IssueError {
    /// The caller's file name is unusable
    #[error("Invalid file name: {0}")]
    Validation(#[from] ObjectNameError),

    /// The storage service or the signing step failed
    #[error("Storage dependency failed: {0}")]
    Dependency(#[from] StorageError),
}

/// Issues an upload grant for `file_name` in the store's container.
///
/// The name is validated before the storage service is contacted. `issued_at` is
/// truncated to whole seconds, so the expiry is exactly [`UPLOAD_GRANT_TTL`] later.
///
/// # Errors
///
/// Returns [`IssueError::Validation`] for a missing or unusable name and
/// [`IssueError::Dependency`] if the container cannot be ensured or the URL cannot be signed
pub async fn issue_upload_grant(
    store: &dyn BlobStore,
    file_name: Option<&str>,
    issued_at: DateTime<Utc>,
) -> Result<UploadGrant, IssueError> {
    let object_name = ObjectName::parse(file_name.unwrap_or_default())?;

    store.ensure_container().await?;

    let issued_at = issued_at.trunc_subsecs(0);
    let expires_at = issued_at
        + chrono::Duration::from_std(UPLOAD_GRANT_TTL)
            .map_err(|e| StorageError::Signing(e.to_string()))?;
    let permissions = BlobPermissions::UPLOAD;

    let url = store
        .sign_upload_url(&object_name, permissions, issued_at, UPLOAD_GRANT_TTL)
        .await?;

    Ok(UploadGrant {
        url,
        object_name,
        expires_at,
        permissions,
    })
}
