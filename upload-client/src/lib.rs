//! Client side of the two-step upload: request a grant, then `PUT` straight to storage

#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(missing_docs)]

/// Client errors
pub mod error;

/// The file picked for upload
pub mod file;

/// Issuer and storage calls
pub mod transport;

/// Upload attempt state machine
pub mod uploader;

pub use error::{ClientError, ClientResult};
pub use file::SelectedFile;
pub use transport::{HttpTransport, UploadTransport};
pub use uploader::{Alert, AlertKind, UploadState, Uploader};
