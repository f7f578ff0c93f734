//! The two network calls of an upload attempt

use async_trait::async_trait;
use common_types::{GenerateSasRequest, GenerateSasResponse};
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::error::{ClientError, ClientResult};
use crate::file::SelectedFile;

/// Header declaring which kind of blob a `PUT` creates
pub const BLOB_TYPE_HEADER: &str = "x-ms-blob-type";

/// Blob kind written by uploads
pub const BLOCK_BLOB: &str = "BlockBlob";

/// Network side of the uploader: asks the issuer for a grant, then writes to storage
#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// `POST /generate-sas` for `file_name`
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Status`] for non-success responses and
    /// [`ClientError::Network`] for transport or decoding failures
    async fn request_grant(&self, file_name: &str) -> ClientResult<GenerateSasResponse>;

    /// `PUT`s the file's raw bytes to the signed URL
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Status`] when storage rejects the write and
    /// [`ClientError::Network`] when it cannot be reached
    async fn put_blob(&self, sas_url: &str, file: &SelectedFile) -> ClientResult<()>;
}

/// [`UploadTransport`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    issuer_url: Url,
}

impl HttpTransport {
    /// Creates a transport talking to the issuer at `issuer_url`
    ///
    /// No timeout is set beyond the HTTP client's defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidIssuerUrl`] if `issuer_url` does not parse
    pub fn new(issuer_url: &str) -> ClientResult<Self> {
        let mut issuer_url = Url::parse(issuer_url)?;
        // Keep any path prefix when joining endpoint names
        if !issuer_url.path().ends_with('/') {
            let path = format!("{}/", issuer_url.path());
            issuer_url.set_path(&path);
        }

        Ok(Self {
            http: reqwest::Client::new(),
            issuer_url,
        })
    }

    /// Issuer base URL, always ending in `/`
    #[must_use]
    pub const fn issuer_url(&self) -> &Url {
        &self.issuer_url
    }
}

#[async_trait]
impl UploadTransport for HttpTransport {
    async fn request_grant(&self, file_name: &str) -> ClientResult<GenerateSasResponse> {
        let url = self.issuer_url.join("generate-sas")?;

        let response = self
            .http
            .post(url)
            .json(&GenerateSasRequest {
                file_name: Some(file_name.to_string()),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response.json().await?)
    }

    async fn put_blob(&self, sas_url: &str, file: &SelectedFile) -> ClientResult<()> {
        let response = self
            .http
            .put(sas_url)
            .header(BLOB_TYPE_HEADER, BLOCK_BLOB)
            .header(CONTENT_TYPE, file.content_type().as_ref())
            .body(file.bytes().to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        Ok(())
    }
}
