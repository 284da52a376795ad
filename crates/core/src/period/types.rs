//! Period domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use notara_shared::types::{EnterpriseId, PeriodId};

use super::error::PeriodError;

/// Status of an accounting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodStatus {
    /// Period is open; releases can still be edited and the period closed.
    Open,
    /// Period is closed; its releases are locked and its total is final.
    Closed,
}

impl PeriodStatus {
    /// Returns true if the period is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns true if the period is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// An accounting period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Period {
    /// Unique identifier.
    pub id: PeriodId,
    /// Owning enterprise.
    pub enterprise_id: EnterpriseId,
    /// First day covered by the period.
    pub start_date: NaiveDate,
    /// Last day covered by the period, inclusive.
    pub end_date: NaiveDate,
    /// Current status.
    pub status: PeriodStatus,
    /// Total invoice value, computed at close time.
    pub total_value: Option<Decimal>,
    /// Free-text closing notes.
    pub observations: Option<String>,
    /// Latest reopen justification.
    pub reopen_reason: Option<String>,
    /// When the period was last closed. Preserved across reopens for audit.
    pub closed_at: Option<DateTime<Utc>>,
}

impl Period {
    /// Returns true if the given date falls within this period, inclusive.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

/// Input for creating a period. Periods always start open.
#[derive(Debug, Clone)]
pub struct CreatePeriodInput {
    /// Owning enterprise.
    pub enterprise_id: EnterpriseId,
    /// First day covered.
    pub start_date: NaiveDate,
    /// Last day covered, inclusive.
    pub end_date: NaiveDate,
    /// Optional notes.
    pub observations: Option<String>,
}

impl CreatePeriodInput {
    /// Validates the input before persistence.
    ///
    /// # Errors
    ///
    /// Returns `PeriodError::InvalidDateRange` when the start date is after
    /// the end date.
    pub fn validate(&self) -> Result<(), PeriodError> {
        validate_date_range(self.start_date, self.end_date)
    }
}

/// Input for updating an open period. Absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdatePeriodInput {
    /// New start date.
    pub start_date: Option<NaiveDate>,
    /// New end date.
    pub end_date: Option<NaiveDate>,
    /// New notes.
    pub observations: Option<String>,
}

/// Validates that a date range is well-formed.
///
/// A single-day period (`start == end`) is valid.
///
/// # Errors
///
/// Returns `PeriodError::InvalidDateRange` when `start > end`.
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), PeriodError> {
    if start > end {
        return Err(PeriodError::InvalidDateRange { start, end });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn open_period(id: i32, start: NaiveDate, end: NaiveDate) -> Period {
        Period {
            id: PeriodId::from_i32(id),
            enterprise_id: EnterpriseId::from_i32(1),
            start_date: start,
            end_date: end,
            status: PeriodStatus::Open,
            total_value: None,
            observations: None,
            reopen_reason: None,
            closed_at: None,
        }
    }

    #[test]
    fn test_contains_date_inclusive_bounds() {
        let period = open_period(1, date(2024, 1, 1), date(2024, 1, 31));
        assert!(period.contains_date(date(2024, 1, 1)));
        assert!(period.contains_date(date(2024, 1, 15)));
        assert!(period.contains_date(date(2024, 1, 31)));
        assert!(!period.contains_date(date(2023, 12, 31)));
        assert!(!period.contains_date(date(2024, 2, 1)));
    }

    #[test]
    fn test_validate_date_range() {
        assert!(validate_date_range(date(2024, 1, 1), date(2024, 1, 31)).is_ok());
        assert!(validate_date_range(date(2024, 1, 1), date(2024, 1, 1)).is_ok());
        assert!(matches!(
            validate_date_range(date(2024, 2, 1), date(2024, 1, 1)),
            Err(PeriodError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_status_helpers() {
        assert!(PeriodStatus::Open.is_open());
        assert!(!PeriodStatus::Open.is_closed());
        assert!(PeriodStatus::Closed.is_closed());
        assert!(!PeriodStatus::Closed.is_open());
    }
}
