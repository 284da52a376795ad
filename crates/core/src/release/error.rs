//! Release error types.

use thiserror::Error;

use notara_shared::types::ReleaseId;

/// Errors that can occur during release operations.
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// A release must carry at least one image.
    #[error("A release must have at least one image")]
    NoImages,

    /// Invoice value must be positive.
    #[error("Invoice value must be positive")]
    NonPositiveValue,

    /// Release not found.
    #[error("Release not found: {0}")]
    NotFound(ReleaseId),

    /// The release is locked inside a closed period.
    #[error("Release {0} belongs to a closed period and cannot be changed")]
    LockedInClosedPeriod(ReleaseId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReleaseError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoImages => "NO_IMAGES",
            Self::NonPositiveValue => "NON_POSITIVE_INVOICE_VALUE",
            Self::NotFound(_) => "RELEASE_NOT_FOUND",
            Self::LockedInClosedPeriod(_) => "RELEASE_IN_CLOSED_PERIOD",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NoImages | Self::NonPositiveValue => 400,
            Self::NotFound(_) => 404,
            Self::LockedInClosedPeriod(_) => 422,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ReleaseError::NoImages.error_code(), "NO_IMAGES");
        assert_eq!(
            ReleaseError::NonPositiveValue.error_code(),
            "NON_POSITIVE_INVOICE_VALUE"
        );
        assert_eq!(
            ReleaseError::NotFound(ReleaseId::from_i32(1)).error_code(),
            "RELEASE_NOT_FOUND"
        );
        assert_eq!(
            ReleaseError::LockedInClosedPeriod(ReleaseId::from_i32(1)).error_code(),
            "RELEASE_IN_CLOSED_PERIOD"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(ReleaseError::NoImages.http_status_code(), 400);
        assert_eq!(
            ReleaseError::NotFound(ReleaseId::from_i32(1)).http_status_code(),
            404
        );
        assert_eq!(
            ReleaseError::LockedInClosedPeriod(ReleaseId::from_i32(1)).http_status_code(),
            422
        );
        assert_eq!(
            ReleaseError::Database("boom".into()).http_status_code(),
            500
        );
    }
}
