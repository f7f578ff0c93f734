//! Azure Blob Storage backend: service SAS signing and Shared Key container management

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::{
    header::{AUTHORIZATION, CONTENT_LENGTH},
    StatusCode,
};
use sha2::Sha256;
use tracing::{debug, info};
use url::Url;

use super::{BlobPermissions, BlobStore, ObjectName, StorageError, StorageResult};
use crate::types::AzureConfig;

/// Storage service REST version used for both SAS tokens and management requests
pub const AZURE_SERVICE_VERSION: &str = "2022-11-02";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const SAS_RESOURCE_BLOB: &str = "b";
const CONTAINER_ALREADY_EXISTS: &str = "ContainerAlreadyExists";

type HmacSha256 = Hmac<Sha256>;

/// Signs shared access signatures and Shared Key requests with an account key
#[derive(Clone)]
pub struct SasSigner {
    account_name: String,
    account_key: Vec<u8>,
}

impl SasSigner {
    /// Creates a signer for `account_name` using the decoded `account_key`
    #[must_use]
    pub fn new(account_name: impl Into<String>, account_key: Vec<u8>) -> Self {
        Self {
            account_name: account_name.into(),
            account_key,
        }
    }

    /// Storage account the signer belongs to
    #[must_use]
    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    /// Base64 HMAC-SHA256 of `string_to_sign` under the account key
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Signing`] if the key is rejected by the MAC
    pub fn sign(&self, string_to_sign: &str) -> StorageResult<String> {
        let mut mac = HmacSha256::new_from_slice(&self.account_key)
            .map_err(|e| StorageError::Signing(format!("Invalid account key: {e}")))?;
        mac.update(string_to_sign.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// String-to-sign of a blob service SAS without start time, IP range or response overrides
    #[must_use]
    pub fn blob_sas_string_to_sign(
        &self,
        container: &str,
        object: &ObjectName,
        permissions: BlobPermissions,
        expires_at: DateTime<Utc>,
    ) -> String {
        let canonicalized_resource = format!("/blob/{}/{container}/{object}", self.account_name);

        [
            permissions.as_sas_str().as_str(),
            "", // signed start
            format_sas_time(expires_at).as_str(),
            canonicalized_resource.as_str(),
            "", // signed identifier
            "", // signed IP
            "", // signed protocol
            AZURE_SERVICE_VERSION,
            SAS_RESOURCE_BLOB,
            "", // snapshot time
            "", // encryption scope
            "", // rscc
            "", // rscd
            "", // rsce
            "", // rscl
            "", // rsct
        ]
        .join("\n")
    }

    /// Query parameters of a blob SAS, in the order the service SDKs emit them
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Signing`] if signing fails
    pub fn blob_sas_query(
        &self,
        container: &str,
        object: &ObjectName,
        permissions: BlobPermissions,
        expires_at: DateTime<Utc>,
    ) -> StorageResult<Vec<(&'static str, String)>> {
        let signature = self.sign(&self.blob_sas_string_to_sign(
            container,
            object,
            permissions,
            expires_at,
        ))?;

        Ok(vec![
            ("sv", AZURE_SERVICE_VERSION.to_string()),
            ("se", format_sas_time(expires_at)),
            ("sr", SAS_RESOURCE_BLOB.to_string()),
            ("sp", permissions.as_sas_str()),
            ("sig", signature),
        ])
    }

    /// `Authorization` header value for a bodiless `PUT` carrying only `x-ms-date` and
    /// `x-ms-version`, with `url` holding at most the `restype` query parameter
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Signing`] if signing fails
    pub fn shared_key_put_authorization(&self, url: &Url, date: &str) -> StorageResult<String> {
        let mut canonicalized_resource = format!("/{}{}", self.account_name, url.path());
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.to_lowercase(), v.into_owned()))
            .collect();
        params.sort();
        for (name, value) in params {
            canonicalized_resource.push_str(&format!("\n{name}:{value}"));
        }

        let canonicalized_headers =
            format!("x-ms-date:{date}\nx-ms-version:{AZURE_SERVICE_VERSION}");

        // Verb, then eleven standard headers that are all empty for this request
        let string_to_sign = [
            "PUT",
            "", // Content-Encoding
            "", // Content-Language
            "", // Content-Length (empty when zero)
            "", // Content-MD5
            "", // Content-Type
            "", // Date
            "", // If-Modified-Since
            "", // If-Match
            "", // If-None-Match
            "", // If-Unmodified-Since
            "", // Range
            format!("{canonicalized_headers}\n{canonicalized_resource}").as_str(),
        ]
        .join("\n");

        Ok(format!(
            "SharedKey {}:{}",
            self.account_name,
            self.sign(&string_to_sign)?
        ))
    }
}

/// Azure Blob Storage container that issues SAS upload URLs
pub struct AzureBlobStore {
    signer: SasSigner,
    container: String,
    endpoint: Url,
    http: reqwest::Client,
}

impl AzureBlobStore {
    /// Creates the store from validated configuration
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Transport`] if the HTTP client cannot be built
    pub fn new(config: &AzureConfig) -> StorageResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            signer: SasSigner::new(config.account_name.clone(), config.account_key.clone()),
            container: config.container.clone(),
            endpoint: config.endpoint.clone(),
            http,
        })
    }

    fn resource_url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> StorageResult<Url> {
        let mut url = self.endpoint.clone();
        url.set_query(None);
        url.path_segments_mut()
            .map_err(|()| {
                StorageError::Signing(format!("Endpoint {} cannot hold a path", self.endpoint))
            })?
            .pop_if_empty()
            .push(&self.container)
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    fn container(&self) -> &str {
        &self.container
    }

    async fn ensure_container(&self) -> StorageResult<()> {
        let mut url = self.resource_url(std::iter::empty())?;
        url.query_pairs_mut().append_pair("restype", "container");

        let date = format_rfc1123(Utc::now());
        let authorization = self.signer.shared_key_put_authorization(&url, &date)?;

        let response = self
            .http
            .put(url)
            .header("x-ms-date", &date)
            .header("x-ms-version", AZURE_SERVICE_VERSION)
            .header(CONTENT_LENGTH, "0")
            .header(AUTHORIZATION, authorization)
            .send()
            .await?;

        let status = response.status();
        let error_code = response
            .headers()
            .get("x-ms-error-code")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        match status {
            StatusCode::CREATED => {
                info!(container = %self.container, "Created storage container");
                Ok(())
            }
            StatusCode::CONFLICT if error_code == CONTAINER_ALREADY_EXISTS => {
                debug!(container = %self.container, "Storage container already exists");
                Ok(())
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(StorageError::Unauthorized(
                format!("Create container returned {status} {error_code}"),
            )),
            _ => Err(StorageError::Service {
                status: status.as_u16(),
                message: error_code,
            }),
        }
    }

    async fn sign_upload_url(
        &self,
        object: &ObjectName,
        permissions: BlobPermissions,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> StorageResult<Url> {
        let expires_at = expiry(issued_at, ttl)?;
        let query =
            self.signer
                .blob_sas_query(&self.container, object, permissions, expires_at)?;

        let mut url = self.resource_url(object.segments())?;
        url.query_pairs_mut().extend_pairs(query);
        Ok(url)
    }
}

fn expiry(issued_at: DateTime<Utc>, ttl: Duration) -> StorageResult<DateTime<Utc>> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| issued_at.checked_add_signed(ttl))
        .ok_or_else(|| StorageError::Signing(format!("Expiry overflows for ttl {ttl:?}")))
}

fn format_sas_time(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn format_rfc1123(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn signer() -> SasSigner {
        SasSigner::new("uploaderacct", b"local-development-signing-key-01".to_vec())
    }

    fn store() -> AzureBlobStore {
        AzureBlobStore::new(&AzureConfig {
            account_name: "uploaderacct".to_string(),
            account_key: b"local-development-signing-key-01".to_vec(),
            container: "uploads".to_string(),
            endpoint: Url::parse("https://uploaderacct.blob.core.windows.net").unwrap(),
        })
        .unwrap()
    }

    #[test]
    fn blob_sas_string_to_sign_has_sixteen_fields() {
        let expires_at = Utc.with_ymd_and_hms(2026, 1, 1, 13, 0, 0).unwrap();
        let object = ObjectName::parse("report.pdf").unwrap();

        let string_to_sign =
            signer().blob_sas_string_to_sign("uploads", &object, BlobPermissions::UPLOAD, expires_at);

        assert_eq!(
            string_to_sign,
            "rcw\n\n2026-01-01T13:00:00Z\n/blob/uploaderacct/uploads/report.pdf\n\n\n\n2022-11-02\nb\n\n\n\n\n\n\n"
        );
        assert_eq!(string_to_sign.split('\n').count(), 16);
    }

    #[test]
    fn blob_sas_signature_matches_known_vector() {
        let expires_at = Utc.with_ymd_and_hms(2026, 1, 1, 13, 0, 0).unwrap();
        let object = ObjectName::parse("report.pdf").unwrap();

        let query = signer()
            .blob_sas_query("uploads", &object, BlobPermissions::UPLOAD, expires_at)
            .unwrap();

        assert_eq!(
            query,
            vec![
                ("sv", "2022-11-02".to_string()),
                ("se", "2026-01-01T13:00:00Z".to_string()),
                ("sr", "b".to_string()),
                ("sp", "rcw".to_string()),
                ("sig", "N3tMJVNrRJ+oqv7fmVMhF7NIrGFuhgZ7brb3cPTQ+G0=".to_string()),
            ]
        );
    }

    #[test]
    fn shared_key_authorization_matches_known_vector() {
        let url =
            Url::parse("https://uploaderacct.blob.core.windows.net/uploads?restype=container")
                .unwrap();

        let authorization = signer()
            .shared_key_put_authorization(&url, "Thu, 01 Jan 2026 12:00:00 GMT")
            .unwrap();

        assert_eq!(
            authorization,
            "SharedKey uploaderacct:l5mLtJcTA6rzkwU2roHynyfRfGtl61W0g6n/t+Kmjd4="
        );
    }

    #[tokio::test]
    async fn signed_url_is_scoped_to_container_and_object() {
        let issued_at = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let object = ObjectName::parse("report.pdf").unwrap();

        let url = store()
            .sign_upload_url(
                &object,
                BlobPermissions::UPLOAD,
                issued_at,
                Duration::from_secs(3600),
            )
            .await
            .unwrap();

        assert_eq!(
            url.as_str(),
            "https://uploaderacct.blob.core.windows.net/uploads/report.pdf\
             ?sv=2022-11-02&se=2026-01-01T13%3A00%3A00Z&sr=b&sp=rcw\
             &sig=N3tMJVNrRJ%2Boqv7fmVMhF7NIrGFuhgZ7brb3cPTQ%2BG0%3D"
        );
    }

    #[tokio::test]
    async fn nested_names_keep_their_slashes_and_encode_the_rest() {
        let issued_at = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let object = ObjectName::parse("2026/q1 report#1.pdf").unwrap();

        let url = store()
            .sign_upload_url(
                &object,
                BlobPermissions::UPLOAD,
                issued_at,
                Duration::from_secs(3600),
            )
            .await
            .unwrap();

        assert_eq!(url.path(), "/uploads/2026/q1%20report%231.pdf");
    }

    #[tokio::test]
    async fn path_style_endpoints_keep_the_account_segment() {
        let store = AzureBlobStore::new(&AzureConfig {
            account_name: "devstoreaccount1".to_string(),
            account_key: b"local-development-signing-key-01".to_vec(),
            container: "uploads".to_string(),
            endpoint: Url::parse("http://127.0.0.1:10000/devstoreaccount1").unwrap(),
        })
        .unwrap();

        let url = store
            .sign_upload_url(
                &ObjectName::parse("a.txt").unwrap(),
                BlobPermissions::UPLOAD,
                Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap(),
                Duration::from_secs(3600),
            )
            .await
            .unwrap();

        assert_eq!(url.path(), "/devstoreaccount1/uploads/a.txt");
    }

    #[test]
    fn rfc1123_dates_use_gmt() {
        let time = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(format_rfc1123(time), "Thu, 01 Jan 2026 12:00:00 GMT");
    }
}
