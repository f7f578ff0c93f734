//! Upload grant endpoint

use std::sync::Arc;

use axum::{Extension, Json};
use chrono::{SecondsFormat, Utc};
use common_types::{GenerateSasRequest, GenerateSasResponse};
use tracing::instrument;

use crate::{
    blob_storage::BlobStore,
    types::{AppError, JsonBody},
    upload_grant::issue_upload_grant,
};

/// Issues a signed URL that lets the caller `PUT` one object straight into storage
///
/// 1. Validates `fileName` (required, no empty / `.` / `..` segments, no control characters)
/// 2. Creates the container if it does not exist yet
/// 3. Signs a create/write/read URL for that object, valid for one hour
///
/// The signed URL itself is never logged.
///
/// # Errors
///
/// - 400 `fileName is required` when the name is missing or empty
/// - 400 `fileName is invalid` when the name breaks the naming rules
/// - 400 `Invalid JSON body` when the body is not a JSON object
/// - 500 `Error generating SAS URL` when storage or signing fails
#[instrument(skip(store, payload), fields(container = store.container()))]
pub async fn generate_sas(
    Extension(store): Extension<Arc<dyn BlobStore>>,
    JsonBody(payload): JsonBody<GenerateSasRequest>,
) -> Result<Json<GenerateSasResponse>, AppError> {
    let grant = issue_upload_grant(store.as_ref(), payload.file_name.as_deref(), Utc::now()).await?;

    tracing::info!(
        object_name = %grant.object_name,
        expires_at = %grant.expires_at,
        "Issued upload grant"
    );

    Ok(Json(GenerateSasResponse {
        sas_url: grant.url.into(),
        expires_at: Some(grant.expires_at.to_rfc3339_opts(SecondsFormat::Secs, true)),
        file_name: grant.object_name.into(),
    }))
}
