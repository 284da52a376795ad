//! Release selection for periods.
//!
//! The selector answers one question: which releases may still be pulled
//! into a period? The predicate here is the single source of truth; the
//! store's availability query and the closing engine's re-validation both
//! mirror it.

use chrono::{DateTime, Days, TimeZone, Utc};

use crate::release::types::ReleaseInfo;

use super::types::Period;

/// Returns true if the release is eligible for inclusion in the period.
///
/// Eligible means: same enterprise, not assigned to any period, and entered
/// within the period's date bounds (inclusive on both ends). Releases held
/// by *other* periods never show up, even when in range; assignment is
/// exclusive.
#[must_use]
pub fn is_available_for(release: &ReleaseInfo, period: &Period) -> bool {
    release.enterprise_id == period.enterprise_id
        && release.assignment.is_unassigned()
        && period.contains_date(release.entry_date.date_naive())
}

/// The UTC timestamp window matching the period's inclusive date bounds.
///
/// Returned half-open, `[start 00:00, day-after-end 00:00)`, so the store
/// can filter entry timestamps with `>= lo AND < hi` without truncating
/// sub-second precision.
///
/// Returns `None` only when the end date cannot be advanced by one day,
/// which does not happen for calendar dates this system stores.
#[must_use]
pub fn availability_window(period: &Period) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let lo = period.start_date.and_hms_opt(0, 0, 0)?;
    let hi = period
        .end_date
        .checked_add_days(Days::new(1))?
        .and_hms_opt(0, 0, 0)?;

    Some((Utc.from_utc_datetime(&lo), Utc.from_utc_datetime(&hi)))
}


#[cfg(test)]
mod props {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    use crate::period::types::PeriodStatus;
    use crate::release::types::Assignment;
    use notara_shared::types::{EnterpriseId, PeriodId, ReleaseId};

    fn date_strategy() -> impl Strategy<Value = NaiveDate> {
        (2020i32..=2030, 1u32..=12, 1u32..=28)
            .prop_map(|(year, month, day)| NaiveDate::from_ymd_opt(year, month, day).unwrap())
    }

    fn period_strategy() -> impl Strategy<Value = Period> {
        (date_strategy(), 0i64..=365).prop_map(|(start, span)| Period {
            id: PeriodId::from_i32(1),
            enterprise_id: EnterpriseId::from_i32(1),
            start_date: start,
            end_date: start + chrono::Duration::days(span),
            status: PeriodStatus::Open,
            total_value: None,
            observations: None,
            reopen_reason: None,
            closed_at: None,
        })
    }

    fn release_strategy() -> impl Strategy<Value = ReleaseInfo> {
        (date_strategy(), 0u32..86400).prop_map(|(day, second)| ReleaseInfo {
            id: ReleaseId::from_i32(1),
            enterprise_id: EnterpriseId::from_i32(1),
            entry_date: Utc.from_utc_datetime(
                &day.and_hms_opt(second / 3600, (second / 60) % 60, second % 60)
                    .unwrap(),
            ),
            value: Decimal::new(10000, 2),
            assignment: Assignment::Unassigned,
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The date predicate and the store's timestamp window agree on
        /// every possible entry timestamp.
        #[test]
        fn prop_predicate_matches_window(
            period in period_strategy(),
            release in release_strategy(),
        ) {
            let (lo, hi) = availability_window(&period).unwrap();
            let in_window = release.entry_date >= lo && release.entry_date < hi;
            prop_assert_eq!(is_available_for(&release, &period), in_window);
        }

        /// An assigned release is never available, whatever its dates.
        #[test]
        fn prop_assigned_never_available(
            period in period_strategy(),
            mut release in release_strategy(),
            owner in 1i32..100,
        ) {
            release.assignment = Assignment::AssignedTo(PeriodId::from_i32(owner));
            prop_assert!(!is_available_for(&release, &period));
        }
    }
}
