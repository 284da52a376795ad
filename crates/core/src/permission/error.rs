//! Permission error types.

use thiserror::Error;

use super::types::Permission;

/// Errors that can occur during permission parsing and checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    /// A permission flag read from storage does not name a known permission.
    #[error("unknown permission flag: '{0}'")]
    UnknownPermission(String),

    /// The principal lacks one or more required permissions.
    #[error("missing required permissions: {}", format_permissions(missing))]
    MissingPermissions {
        /// The permissions the principal does not hold.
        missing: Vec<Permission>,
    },
}

impl PermissionError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownPermission(_) => "UNKNOWN_PERMISSION",
            Self::MissingPermissions { .. } => "MISSING_PERMISSIONS",
        }
    }

    /// Returns the HTTP status code for this error.
    ///
    /// An unknown flag means the stored group data is corrupt, which is a
    /// server-side configuration problem, not a client fault.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::UnknownPermission(_) => 500,
            Self::MissingPermissions { .. } => 403,
        }
    }
}

fn format_permissions(permissions: &[Permission]) -> String {
    permissions
        .iter()
        .map(Permission::as_slug)
        .collect::<Vec<_>>()
        .join(", ")
}
