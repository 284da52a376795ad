//! Period error types for validation and state errors.

use chrono::NaiveDate;
use thiserror::Error;

use notara_shared::types::{PeriodId, ReleaseId};

/// Errors that can occur during period operations.
#[derive(Debug, Error)]
pub enum PeriodError {
    // ========== Validation Errors ==========
    /// Start date must not be after end date.
    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange {
        /// Requested start date.
        start: NaiveDate,
        /// Requested end date.
        end: NaiveDate,
    },

    /// Closing requires at least one release.
    #[error("At least one release must be selected to close a period")]
    EmptySelection,

    /// Reopening requires a justification.
    #[error("A reason is required to reopen a period")]
    MissingReason,

    /// One or more selected releases fail the closing preconditions.
    ///
    /// The whole close request is rejected; nothing is partially applied.
    #[error(
        "Invalid selection: {} missing, {} out of range, {} already assigned",
        missing.len(),
        out_of_range.len(),
        already_assigned.len()
    )]
    InvalidSelection {
        /// Ids that do not reference a release in the caller's enterprise.
        missing: Vec<ReleaseId>,
        /// Ids whose entry date falls outside the period bounds.
        out_of_range: Vec<ReleaseId>,
        /// Ids already locked into a period.
        already_assigned: Vec<ReleaseId>,
    },

    // ========== State Errors ==========
    /// The period is already closed.
    #[error("Period is already closed")]
    AlreadyClosed,

    /// Only closed periods can be reopened.
    #[error("Period is not closed")]
    NotClosed,

    /// Only open periods can be edited.
    #[error("Period is closed and cannot be edited")]
    ClosedPeriodImmutable,

    // ========== Concurrency Errors ==========
    /// A concurrent close won the race for one or more releases.
    #[error("Releases were assigned by a concurrent close, refresh and retry")]
    AssignmentConflict {
        /// The releases that were taken.
        release_ids: Vec<ReleaseId>,
    },

    // ========== Lookup Errors ==========
    /// Period not found.
    #[error("Period not found: {0}")]
    NotFound(PeriodId),

    // ========== Database Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PeriodError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::EmptySelection => "EMPTY_SELECTION",
            Self::MissingReason => "MISSING_REOPEN_REASON",
            Self::InvalidSelection { .. } => "INVALID_SELECTION",
            Self::AlreadyClosed => "PERIOD_ALREADY_CLOSED",
            Self::NotClosed => "PERIOD_NOT_CLOSED",
            Self::ClosedPeriodImmutable => "PERIOD_CLOSED_IMMUTABLE",
            Self::AssignmentConflict { .. } => "ASSIGNMENT_CONFLICT",
            Self::NotFound(_) => "PERIOD_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::InvalidDateRange { .. }
            | Self::EmptySelection
            | Self::MissingReason
            | Self::InvalidSelection { .. } => 400,

            // 404 Not Found
            Self::NotFound(_) => 404,

            // 409 Conflict - concurrency errors
            Self::AssignmentConflict { .. } => 409,

            // 422 Unprocessable - state machine violations
            Self::AlreadyClosed | Self::NotClosed | Self::ClosedPeriodImmutable => 422,

            // 500 Internal Server Error
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::AssignmentConflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(PeriodError::EmptySelection.error_code(), "EMPTY_SELECTION");
        assert_eq!(PeriodError::AlreadyClosed.error_code(), "PERIOD_ALREADY_CLOSED");
        assert_eq!(
            PeriodError::InvalidSelection {
                missing: vec![],
                out_of_range: vec![],
                already_assigned: vec![ReleaseId::from_i32(1)],
            }
            .error_code(),
            "INVALID_SELECTION"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(PeriodError::EmptySelection.http_status_code(), 400);
        assert_eq!(PeriodError::MissingReason.http_status_code(), 400);
        assert_eq!(
            PeriodError::NotFound(PeriodId::from_i32(1)).http_status_code(),
            404
        );
        assert_eq!(
            PeriodError::AssignmentConflict { release_ids: vec![] }.http_status_code(),
            409
        );
        assert_eq!(PeriodError::AlreadyClosed.http_status_code(), 422);
        assert_eq!(PeriodError::NotClosed.http_status_code(), 422);
        assert_eq!(
            PeriodError::Database("boom".into()).http_status_code(),
            500
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(
            PeriodError::AssignmentConflict {
                release_ids: vec![ReleaseId::from_i32(1)],
            }
            .is_retryable()
        );
        assert!(!PeriodError::AlreadyClosed.is_retryable());
        assert!(!PeriodError::EmptySelection.is_retryable());
    }

    #[test]
    fn test_invalid_selection_display() {
        let err = PeriodError::InvalidSelection {
            missing: vec![ReleaseId::from_i32(1)],
            out_of_range: vec![ReleaseId::from_i32(2), ReleaseId::from_i32(3)],
            already_assigned: vec![],
        };
        assert_eq!(
            err.to_string(),
            "Invalid selection: 1 missing, 2 out of range, 0 already assigned"
        );
    }

    #[test]
    fn test_invalid_date_range_display() {
        let err = PeriodError::InvalidDateRange {
            start: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        assert_eq!(err.to_string(), "Invalid date range: 2024-02-01 is after 2024-01-01");
    }
}
