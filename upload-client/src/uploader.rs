//! Upload attempt state machine
//!
//! ```text
//! Idle ──select──▶ FileSelected ──upload──▶ RequestingGrant ──grant──▶ Uploading ──▶ Succeeded
//!                                                 │                        │
//!                                                 └────────────────────────┴──────▶ Failed
//! ```
//!
//! From `Succeeded` or `Failed` another upload action goes back to `RequestingGrant`
//! with the same file. Nothing is retried automatically.

use tracing::{debug, info, warn};

use crate::file::SelectedFile;
use crate::transport::UploadTransport;

/// Alert shown when upload is requested before a file is picked
pub const NO_FILE_SELECTED: &str = "Please select a file.";

/// Alert shown when the issuer could not be asked for, or refused, a grant
pub const GRANT_REQUEST_FAILED: &str = "Error generating SAS URL.";

/// Alert shown when storage rejected or never received the upload
pub const UPLOAD_FAILED: &str = "Error uploading file to blob storage.";

/// Where an upload attempt stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    /// No file selected
    Idle,
    /// A file is selected, nothing sent yet
    FileSelected,
    /// Waiting for the issuer's grant
    RequestingGrant,
    /// Sending the file to storage
    Uploading,
    /// Storage accepted the file
    Succeeded,
    /// The attempt ended in an error
    Failed,
}

impl UploadState {
    /// Whether the machine may move from `self` to `next`
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        use UploadState::{Failed, FileSelected, Idle, RequestingGrant, Succeeded, Uploading};

        matches!(
            (self, next),
            (Idle | FileSelected | Succeeded | Failed, FileSelected | Idle)
                | (FileSelected | Succeeded | Failed, RequestingGrant)
                | (RequestingGrant, Uploading | Failed)
                | (Uploading, Succeeded | Failed)
        )
    }

    /// Whether an attempt has finished
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Whether an alert reports success or failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    /// The file was stored
    Success,
    /// Something went wrong
    Error,
}

/// The single message shown after an upload action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// Success or error styling
    pub kind: AlertKind,
    /// Text for the user
    pub message: String,
}

impl Alert {
    fn error(message: &str) -> Self {
        Self {
            kind: AlertKind::Error,
            message: message.to_string(),
        }
    }

    /// No file was selected
    #[must_use]
    pub fn no_file_selected() -> Self {
        Self::error(NO_FILE_SELECTED)
    }

    /// The grant request failed
    #[must_use]
    pub fn grant_request_failed() -> Self {
        Self::error(GRANT_REQUEST_FAILED)
    }

    /// The upload to storage failed
    #[must_use]
    pub fn upload_failed() -> Self {
        Self::error(UPLOAD_FAILED)
    }

    /// The file is stored as `object_name`
    #[must_use]
    pub fn uploaded(object_name: &str) -> Self {
        Self {
            kind: AlertKind::Success,
            message: format!("File uploaded successfully as: {object_name}"),
        }
    }
}

/// Drives the two-step upload: grant request, then a direct `PUT` to storage
///
/// [`Uploader::upload`] borrows the uploader mutably, so attempts never overlap. The
/// selected file stays in place while an attempt runs; if the attempt's future is
/// dropped before it finishes, the next action marks it `Failed` and carries on.
pub struct Uploader<T> {
    transport: T,
    file: Option<SelectedFile>,
    progress: Progress,
    alert: Option<Alert>,
}

/// Current state plus the states entered during the latest upload action
#[derive(Debug)]
struct Progress {
    state: UploadState,
    history: Vec<UploadState>,
}

impl Progress {
    fn enter(&mut self, next: UploadState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid upload transition {:?} -> {next:?}",
            self.state
        );
        debug!(from = ?self.state, to = ?next, "Upload state change");
        self.state = next;
        self.history.push(next);
    }

    /// Closes an attempt whose future was dropped mid-flight
    fn settle_interrupted(&mut self) {
        if matches!(
            self.state,
            UploadState::RequestingGrant | UploadState::Uploading
        ) {
            warn!(state = ?self.state, "Previous upload was cancelled before finishing");
            self.enter(UploadState::Failed);
        }
    }
}

impl<T: UploadTransport> Uploader<T> {
    /// Creates an idle uploader
    pub const fn new(transport: T) -> Self {
        Self {
            transport,
            file: None,
            progress: Progress {
                state: UploadState::Idle,
                history: Vec::new(),
            },
            alert: None,
        }
    }

    /// Current state
    pub const fn state(&self) -> UploadState {
        self.progress.state
    }

    /// Alert of the last upload action, if any
    pub const fn alert(&self) -> Option<&Alert> {
        self.alert.as_ref()
    }

    /// Selected file, if any
    pub const fn selected_file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    /// States entered since the last upload action began
    pub fn history(&self) -> &[UploadState] {
        &self.progress.history
    }

    /// The transport, for inspection
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Picks `file` for the next upload; the current alert stays visible
    pub fn select_file(&mut self, file: SelectedFile) {
        self.progress.settle_interrupted();
        debug!(file_name = file.name(), "File selected");
        self.file = Some(file);
        self.progress.enter(UploadState::FileSelected);
    }

    /// Drops the selected file
    pub fn clear_selection(&mut self) {
        self.progress.settle_interrupted();
        self.file = None;
        self.progress.enter(UploadState::Idle);
    }

    /// Runs one upload attempt and returns the alert that replaced the previous one
    ///
    /// Without a selected file nothing is sent. Otherwise exactly one grant request is made,
    /// followed by exactly one `PUT` only if the grant was issued.
    pub async fn upload(&mut self) -> &Alert {
        self.progress.settle_interrupted();
        self.progress.history.clear();

        let Some(file) = self.file.as_ref() else {
            info!("Upload requested without a file");
            return self.alert.insert(Alert::no_file_selected());
        };

        let alert = attempt(&self.transport, file, &mut self.progress).await;
        self.alert.insert(alert)
    }
}

async fn attempt<T: UploadTransport>(
    transport: &T,
    file: &SelectedFile,
    progress: &mut Progress,
) -> Alert {
    progress.enter(UploadState::RequestingGrant);

    let grant = match transport.request_grant(file.name()).await {
        Ok(grant) => grant,
        Err(e) => {
            warn!(file_name = file.name(), error = %e, "Grant request failed");
            progress.enter(UploadState::Failed);
            return Alert::grant_request_failed();
        }
    };

    progress.enter(UploadState::Uploading);

    match transport.put_blob(&grant.sas_url, file).await {
        Ok(()) => {
            info!(object_name = %grant.file_name, "Upload succeeded");
            progress.enter(UploadState::Succeeded);
            Alert::uploaded(&grant.file_name)
        }
        Err(e) => {
            warn!(object_name = %grant.file_name, error = %e, "Upload failed");
            progress.enter(UploadState::Failed);
            Alert::upload_failed()
        }
    }
}
