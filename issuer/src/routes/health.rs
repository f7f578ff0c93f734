//! Liveness check

use std::sync::Arc;

use aide::axum::IntoApiResponse;
use axum::{Extension, Json};
use schemars::JsonSchema;
use serde::Serialize;

use crate::blob_storage::BlobStore;

/// Body of `GET /health`
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    status: &'static str,
    /// Version of the issuer build
    semver: &'static str,
    /// Commit hash the issuer was built from, if known
    rev: Option<&'static str>,
    /// Container that upload grants are scoped to
    container: String,
}

/// Liveness check
///
/// Does not call the storage service; the container was verified at startup.
pub async fn handler(Extension(store): Extension<Arc<dyn BlobStore>>) -> impl IntoApiResponse {
    Json(HealthResponse {
        status: "ok",
        semver: env!("CARGO_PKG_VERSION"),
        rev: option_env!("GIT_REV"),
        container: store.container().to_string(),
    })
}
