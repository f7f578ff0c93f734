#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use common_types::GenerateSasResponse;
use upload_client::{ClientError, ClientResult, SelectedFile, UploadTransport};

/// Longer than any test waits
const STALL: Duration = Duration::from_secs(10);

pub const SAS_URL: &str =
    "https://uploaderacct.blob.core.windows.net/uploads/report.pdf?sv=2022-11-02&sp=rcw&sig=abc";

/// One call seen by [`RecordingTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Grant(String),
    Put { sas_url: String, bytes: Vec<u8> },
}

/// Transport that records calls and answers from canned outcomes
pub struct RecordingTransport {
    pub calls: Mutex<Vec<Call>>,
    grant_status: Option<u16>,
    put_status: Option<u16>,
    stall_next_grant: AtomicBool,
    stall_next_put: AtomicBool,
}

impl RecordingTransport {
    pub fn succeeding() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            grant_status: None,
            put_status: None,
            stall_next_grant: AtomicBool::new(false),
            stall_next_put: AtomicBool::new(false),
        }
    }

    /// The first grant request hangs until its future is dropped
    pub fn stalls_first_grant() -> Self {
        let transport = Self::succeeding();
        transport.stall_next_grant.store(true, Ordering::SeqCst);
        transport
    }

    /// The first `PUT` hangs until its future is dropped
    pub fn stalls_first_put() -> Self {
        let transport = Self::succeeding();
        transport.stall_next_put.store(true, Ordering::SeqCst);
        transport
    }

    pub fn grant_fails(status: u16) -> Self {
        Self {
            grant_status: Some(status),
            ..Self::succeeding()
        }
    }

    pub fn put_fails(status: u16) -> Self {
        Self {
            put_status: Some(status),
            ..Self::succeeding()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl UploadTransport for RecordingTransport {
    async fn request_grant(&self, file_name: &str) -> ClientResult<GenerateSasResponse> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Grant(file_name.to_string()));

        if self.stall_next_grant.swap(false, Ordering::SeqCst) {
            tokio::time::sleep(STALL).await;
        }

        if let Some(status) = self.grant_status {
            return Err(ClientError::Status {
                status,
                body: String::new(),
            });
        }

        Ok(GenerateSasResponse {
            sas_url: SAS_URL.to_string(),
            file_name: file_name.to_string(),
            expires_at: None,
        })
    }

    async fn put_blob(&self, sas_url: &str, file: &SelectedFile) -> ClientResult<()> {
        self.calls.lock().unwrap().push(Call::Put {
            sas_url: sas_url.to_string(),
            bytes: file.bytes().to_vec(),
        });

        if self.stall_next_put.swap(false, Ordering::SeqCst) {
            tokio::time::sleep(STALL).await;
        }

        match self.put_status {
            Some(status) => Err(ClientError::Status {
                status,
                body: String::new(),
            }),
            None => Ok(()),
        }
    }
}

pub fn report_pdf() -> SelectedFile {
    SelectedFile::new("report.pdf", mime::APPLICATION_PDF, b"%PDF-1.7 test".to_vec())
}
