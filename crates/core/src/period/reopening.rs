//! Reopening a closed period.
//!
//! Reopening only flips the period back to open and records why. The
//! releases the period holds stay assigned, and the frozen total and close
//! timestamp survive as history; closing the period again recomputes the
//! total over everything it holds at that moment.

use notara_shared::types::PeriodId;

use super::error::PeriodError;
use super::types::Period;

/// The validated outcome of a reopen request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReopenPlan {
    /// Period being reopened.
    pub period_id: PeriodId,
    /// Trimmed justification, never empty.
    pub reason: String,
}

/// Stateless reopen planner.
pub struct ReopeningService;

impl ReopeningService {
    /// Validates a reopen request.
    ///
    /// The reason is mandatory and whitespace does not count; the stored
    /// reason is trimmed.
    ///
    /// # Errors
    ///
    /// [`PeriodError::NotClosed`] when the period is already open and
    /// [`PeriodError::MissingReason`] when the reason is blank.
    pub fn plan_reopen(period: &Period, reason: &str) -> Result<ReopenPlan, PeriodError> {
        if period.status.is_open() {
            return Err(PeriodError::NotClosed);
        }

        let reason = reason.trim();
        if reason.is_empty() {
            return Err(PeriodError::MissingReason);
        }

        Ok(ReopenPlan {
            period_id: period.id,
            reason: reason.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use crate::period::types::PeriodStatus;
    use notara_shared::types::EnterpriseId;

    fn closed_period() -> Period {
        Period {
            id: PeriodId::from_i32(1),
            enterprise_id: EnterpriseId::from_i32(1),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            status: PeriodStatus::Closed,
            total_value: Some(dec!(350.00)),
            observations: None,
            reopen_reason: None,
            closed_at: Some("2024-02-01T09:00:00Z".parse().unwrap()),
        }
    }

    #[test]
    fn test_reopen_requires_closed_period() {
        let mut period = closed_period();
        period.status = PeriodStatus::Open;

        let result = ReopeningService::plan_reopen(&period, "wrong invoice included");
        assert!(matches!(result, Err(PeriodError::NotClosed)));
    }

    #[test]
    fn test_reopen_rejects_blank_reason() {
        let period = closed_period();

        let result = ReopeningService::plan_reopen(&period, "");
        assert!(matches!(result, Err(PeriodError::MissingReason)));

        let result = ReopeningService::plan_reopen(&period, "   \t\n  ");
        assert!(matches!(result, Err(PeriodError::MissingReason)));
    }

    #[test]
    fn test_reopen_trims_reason() {
        let period = closed_period();

        let plan =
            ReopeningService::plan_reopen(&period, "  wrong invoice included  ").unwrap();

        assert_eq!(plan.period_id, period.id);
        assert_eq!(plan.reason, "wrong invoice included");
    }
}
