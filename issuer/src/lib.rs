//! Upload grant issuer: mints short-lived signed URLs for direct-to-storage uploads

#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(missing_docs)]

/// Storage backends and signed URL generation
pub mod blob_storage;

/// HTTP routes
pub mod routes;

/// Router assembly and server lifecycle
pub mod server;

/// Configuration, errors and extractors
pub mod types;

/// Grant issuance
pub mod upload_grant;
