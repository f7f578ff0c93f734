//! Wire types shared by the issuer service and the upload client

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Error message returned when the request carries no usable `fileName`
pub const FILE_NAME_REQUIRED: &str = "fileName is required";

/// Error message returned when `fileName` breaks the object naming rules
pub const FILE_NAME_INVALID: &str = "fileName is invalid";

/// Error message returned when the request body is not the expected JSON
pub const INVALID_JSON_BODY: &str = "Invalid JSON body";

/// Error message returned for any storage or signing failure
pub const SAS_GENERATION_FAILED: &str = "Error generating SAS URL";

/// Body of `POST /generate-sas`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateSasRequest {
    /// Name of the object to create inside the configured container
    #[serde(default)]
    pub file_name: Option<String>,
}

/// Successful response of `POST /generate-sas`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateSasResponse {
    /// Object URL with the signature in its query string
    pub sas_url: String,
    /// Object name the URL was issued for
    pub file_name: String,
    /// RFC 3339 UTC timestamp after which the storage service rejects the URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

/// Error envelope for every non-2xx response of the issuer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
}
