//! Object storage for release images, built on Apache OpenDAL.
//!
//! Release images never pass through the API server. Clients get a
//! presigned PUT URL and upload straight to the store; the server only
//! ever handles keys. Works against any S3-compatible store (R2,
//! MinIO, AWS), Azure Blob, or the local filesystem for development.

mod config;
mod error;
mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use service::{PresignedUrl, StorageService, UploadRequest};
