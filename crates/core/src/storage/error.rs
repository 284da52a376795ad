//! Failure modes of the upload presigning path.

use thiserror::Error;

/// Errors raised while validating or presigning an upload.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Declared file size is over the configured limit.
    #[error("upload of {size} bytes exceeds the {max} byte limit")]
    FileTooLarge {
        /// Declared file size.
        size: u64,
        /// Configured maximum.
        max: u64,
    },

    /// MIME type outside the allow-list.
    #[error("MIME type '{mime_type}' is not accepted for release documents")]
    InvalidMimeType {
        /// The rejected MIME type.
        mime_type: String,
    },

    /// The configured provider cannot presign requests.
    #[error("storage provider does not support presigned uploads")]
    PresignNotSupported,

    /// Provider settings were incomplete or rejected by the backend.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// Any other failure from the storage backend.
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StorageError {
    /// Create a file too large error.
    #[must_use]
    pub fn file_too_large(size: u64, max: u64) -> Self {
        Self::FileTooLarge { size, max }
    }

    /// Create an invalid MIME type error.
    #[must_use]
    pub fn invalid_mime_type(mime_type: impl Into<String>) -> Self {
        Self::InvalidMimeType {
            mime_type: mime_type.into(),
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        if err.kind() == opendal::ErrorKind::Unsupported {
            Self::PresignNotSupported
        } else {
            Self::Operation(err.to_string())
        }
    }
}
