//! Coarse failure classification shared across the workspace.
//!
//! Domain modules keep rich error enums next to the code that raises
//! them; this type is the common denominator for callers that only need
//! an HTTP shape and an exit path, such as the binaries at startup.

use thiserror::Error;

/// Result alias for operations that classify failures as [`AppError`].
pub type AppResult<T> = Result<T, AppError>;

/// Workspace-level failure classes.
#[derive(Debug, Error)]
pub enum AppError {
    /// The caller presented no credential, or one that did not verify.
    #[error("authentication failed: {0}")]
    Unauthenticated(String),

    /// The principal is known but a permission gate rejected it.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A release, period, or enterprise that does not exist. Records
    /// owned by another tenant report the same way.
    #[error("{0} not found")]
    NotFound(String),

    /// Input rejected before it reached the domain layer.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A fiscal rule refused the operation, such as writing into a
    /// closed period or releasing an invoice without images.
    #[error("fiscal rule violated: {0}")]
    FiscalRule(String),

    /// Another writer committed first and this caller lost the race.
    #[error("concurrent update conflict: {0}")]
    Conflict(String),

    /// Startup configuration is missing or malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The database failed underneath an otherwise valid operation.
    #[error("database error: {0}")]
    Database(String),

    /// Object storage or another external dependency failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl AppError {
    /// Returns the HTTP status code this failure class maps to.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthenticated(_) => 401,
            Self::PermissionDenied(_) => 403,
            Self::NotFound(_) => 404,
            Self::InvalidInput(_) => 400,
            Self::FiscalRule(_) => 422,
            Self::Conflict(_) => 409,
            Self::Configuration(_) | Self::Database(_) | Self::Storage(_) => 500,
        }
    }

    /// Returns the stable machine-readable code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthenticated(_) => "UNAUTHENTICATED",
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::FiscalRule(_) => "FISCAL_RULE_VIOLATION",
            Self::Conflict(_) => "CONFLICT",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(AppError::Unauthenticated(String::new()), 401, "UNAUTHENTICATED")]
    #[case(AppError::PermissionDenied(String::new()), 403, "PERMISSION_DENIED")]
    #[case(AppError::NotFound(String::new()), 404, "NOT_FOUND")]
    #[case(AppError::InvalidInput(String::new()), 400, "INVALID_INPUT")]
    #[case(AppError::FiscalRule(String::new()), 422, "FISCAL_RULE_VIOLATION")]
    #[case(AppError::Conflict(String::new()), 409, "CONFLICT")]
    #[case(AppError::Configuration(String::new()), 500, "CONFIGURATION_ERROR")]
    #[case(AppError::Database(String::new()), 500, "DATABASE_ERROR")]
    #[case(AppError::Storage(String::new()), 500, "STORAGE_ERROR")]
    fn test_status_and_code_mapping(
        #[case] err: AppError,
        #[case] status: u16,
        #[case] code: &str,
    ) {
        assert_eq!(err.status_code(), status);
        assert_eq!(err.error_code(), code);
    }

    #[test]
    fn test_display_includes_detail() {
        assert_eq!(
            AppError::Unauthenticated("token expired".into()).to_string(),
            "authentication failed: token expired"
        );
        assert_eq!(
            AppError::FiscalRule("period 2025-03 is closed".into()).to_string(),
            "fiscal rule violated: period 2025-03 is closed"
        );
        assert_eq!(
            AppError::NotFound("release 17".into()).to_string(),
            "release 17 not found"
        );
    }
}
