//! The file picked for upload

use std::path::Path;

use mime::Mime;

use crate::error::{ClientError, ClientResult};

/// A file chosen by the user: its name, declared content type and full content
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    name: String,
    content_type: Mime,
    bytes: Vec<u8>,
}

impl SelectedFile {
    /// Wraps in-memory content
    #[must_use]
    pub fn new(name: impl Into<String>, content_type: Mime, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type,
            bytes,
        }
    }

    /// Reads `path` completely; the file's own name becomes the requested object name
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidFile`] if the path has no UTF-8 file name and
    /// [`ClientError::Io`] if reading fails
    pub async fn from_path(path: &Path, content_type: Mime) -> ClientResult<Self> {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ClientError::InvalidFile(path.to_path_buf()))?
            .to_string();

        let bytes = tokio::fs::read(path).await.map_err(|source| ClientError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self::new(name, content_type, bytes))
    }

    /// Replaces the name requested from the issuer
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Name requested from the issuer
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Content type sent with the upload
    #[must_use]
    pub const fn content_type(&self) -> &Mime {
        &self.content_type
    }

    /// File content
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}
