//! The period closing engine.
//!
//! Closing is planned here and executed by the store. The engine takes the
//! caller's selection plus the current database picture of those releases,
//! validates every id, and produces a [`ClosingPlan`]: which releases to
//! assign and the exact total to freeze on the period. The store applies
//! the plan in one transaction.

use std::collections::HashMap;

use rust_decimal::Decimal;

use notara_shared::types::{PeriodId, ReleaseId};

use crate::release::types::ReleaseInfo;

use super::error::PeriodError;
use super::selection::is_available_for;
use super::types::Period;

/// The validated outcome of a close request.
///
/// `release_ids` are the releases to assign to the period, deduplicated and
/// in selection order. `total_value` already includes releases that were
/// assigned to the period before this request, so a period closed again
/// after a reopen totals everything it holds, not just the new picks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosingPlan {
    /// Period being closed.
    pub period_id: PeriodId,
    /// Releases to assign, deduplicated, selection order preserved.
    pub release_ids: Vec<ReleaseId>,
    /// Sum of kept + newly selected release values.
    pub total_value: Decimal,
    /// Free-form note to store on the closed period.
    pub observations: Option<String>,
}

/// Stateless close planner.
pub struct ClosingService;

impl ClosingService {
    /// Validates a close request and computes the plan.
    ///
    /// `selected` is the store's view of the ids the caller picked, fetched
    /// within the caller's enterprise. `kept` are the releases the period
    /// already holds from a previous close; they contribute to the total
    /// but are not re-assigned.
    ///
    /// Every selected id must resolve to an unassigned release of the same
    /// enterprise whose entry date falls inside the period. Offenders are
    /// collected into [`PeriodError::InvalidSelection`] by failure kind so
    /// the caller learns about all of them at once. Ids missing from
    /// `selected` and ids owned by another enterprise both land in
    /// `missing`; the error never reveals that a release exists elsewhere.
    ///
    /// # Errors
    ///
    /// [`PeriodError::AlreadyClosed`] when the period is closed,
    /// [`PeriodError::EmptySelection`] when no ids were given, and
    /// [`PeriodError::InvalidSelection`] when any id fails validation.
    pub fn plan_close(
        period: &Period,
        selected_ids: &[ReleaseId],
        selected: &[ReleaseInfo],
        kept: &[ReleaseInfo],
        observations: Option<String>,
    ) -> Result<ClosingPlan, PeriodError> {
        if period.status.is_closed() {
            return Err(PeriodError::AlreadyClosed);
        }
        if selected_ids.is_empty() {
            return Err(PeriodError::EmptySelection);
        }

        let by_id: HashMap<ReleaseId, &ReleaseInfo> =
            selected.iter().map(|release| (release.id, release)).collect();

        let mut release_ids: Vec<ReleaseId> = Vec::with_capacity(selected_ids.len());
        let mut missing = Vec::new();
        let mut out_of_range = Vec::new();
        let mut already_assigned = Vec::new();

        for &id in selected_ids {
            // Repeats of an id count once.
            if release_ids.contains(&id) {
                continue;
            }

            let Some(release) = by_id.get(&id) else {
                missing.push(id);
                continue;
            };

            if release.enterprise_id != period.enterprise_id {
                missing.push(id);
            } else if !release.assignment.is_unassigned() {
                already_assigned.push(id);
            } else if !is_available_for(release, period) {
                out_of_range.push(id);
            } else {
                release_ids.push(id);
            }
        }

        if !missing.is_empty() || !out_of_range.is_empty() || !already_assigned.is_empty() {
            return Err(PeriodError::InvalidSelection {
                missing,
                out_of_range,
                already_assigned,
            });
        }

        let total_value = kept
            .iter()
            .map(|release| release.value)
            .chain(release_ids.iter().map(|id| by_id[id].value))
            .sum();

        Ok(ClosingPlan {
            period_id: period.id,
            release_ids,
            total_value,
            observations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use crate::period::types::PeriodStatus;
    use crate::release::types::Assignment;
    use notara_shared::types::EnterpriseId;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn january_period() -> Period {
        Period {
            id: PeriodId::from_i32(1),
            enterprise_id: EnterpriseId::from_i32(1),
            start_date: date(2024, 1, 1),
            end_date: date(2024, 1, 31),
            status: PeriodStatus::Open,
            total_value: None,
            observations: None,
            reopen_reason: None,
            closed_at: None,
        }
    }

    fn release(id: i32, day: &str, value: Decimal) -> ReleaseInfo {
        ReleaseInfo {
            id: ReleaseId::from_i32(id),
            enterprise_id: EnterpriseId::from_i32(1),
            entry_date: day.parse().unwrap(),
            value,
            assignment: Assignment::Unassigned,
        }
    }

    #[test]
    fn test_close_totals_selected_values() {
        let period = january_period();
        let a = release(1, "2024-01-05T10:00:00Z", dec!(100.00));
        let b = release(2, "2024-01-20T16:30:00Z", dec!(250.00));

        let plan = ClosingService::plan_close(
            &period,
            &[a.id, b.id],
            &[a.clone(), b.clone()],
            &[],
            None,
        )
        .unwrap();

        assert_eq!(plan.period_id, period.id);
        assert_eq!(plan.release_ids, vec![a.id, b.id]);
        assert_eq!(plan.total_value, dec!(350.00));
        assert_eq!(plan.observations, None);
    }

    #[test]
    fn test_close_rejects_empty_selection() {
        let period = january_period();
        let result = ClosingService::plan_close(&period, &[], &[], &[], None);
        assert!(matches!(result, Err(PeriodError::EmptySelection)));
    }

    #[test]
    fn test_close_rejects_closed_period() {
        let mut period = january_period();
        period.status = PeriodStatus::Closed;
        let a = release(1, "2024-01-05T10:00:00Z", dec!(100.00));

        let result = ClosingService::plan_close(&period, &[a.id], &[a], &[], None);
        assert!(matches!(result, Err(PeriodError::AlreadyClosed)));
    }

    #[test]
    fn test_close_reports_unknown_ids_as_missing() {
        let period = january_period();
        let a = release(1, "2024-01-05T10:00:00Z", dec!(100.00));
        let ghost = ReleaseId::from_i32(99);

        let result = ClosingService::plan_close(&period, &[a.id, ghost], &[a], &[], None);
        match result {
            Err(PeriodError::InvalidSelection {
                missing,
                out_of_range,
                already_assigned,
            }) => {
                assert_eq!(missing, vec![ghost]);
                assert!(out_of_range.is_empty());
                assert!(already_assigned.is_empty());
            }
            other => panic!("expected InvalidSelection, got {other:?}"),
        }
    }

    #[test]
    fn test_close_reports_foreign_release_as_missing() {
        // Another enterprise's release looks exactly like a nonexistent one.
        let period = january_period();
        let mut foreign = release(7, "2024-01-10T10:00:00Z", dec!(50.00));
        foreign.enterprise_id = EnterpriseId::from_i32(2);

        let result =
            ClosingService::plan_close(&period, &[foreign.id], &[foreign.clone()], &[], None);
        match result {
            Err(PeriodError::InvalidSelection { missing, .. }) => {
                assert_eq!(missing, vec![foreign.id]);
            }
            other => panic!("expected InvalidSelection, got {other:?}"),
        }
    }

    #[test]
    fn test_close_reports_out_of_range_release() {
        let period = january_period();
        let early = release(3, "2023-12-31T23:00:00Z", dec!(10.00));

        let result = ClosingService::plan_close(&period, &[early.id], &[early.clone()], &[], None);
        match result {
            Err(PeriodError::InvalidSelection { out_of_range, .. }) => {
                assert_eq!(out_of_range, vec![early.id]);
            }
            other => panic!("expected InvalidSelection, got {other:?}"),
        }
    }

    #[test]
    fn test_close_reports_assigned_release() {
        let period = january_period();
        let mut taken = release(4, "2024-01-15T09:00:00Z", dec!(75.00));
        taken.assignment = Assignment::AssignedTo(PeriodId::from_i32(8));

        let result = ClosingService::plan_close(&period, &[taken.id], &[taken.clone()], &[], None);
        match result {
            Err(PeriodError::InvalidSelection {
                already_assigned, ..
            }) => {
                assert_eq!(already_assigned, vec![taken.id]);
            }
            other => panic!("expected InvalidSelection, got {other:?}"),
        }
    }

    #[test]
    fn test_close_rejects_release_already_held_by_this_period() {
        // Re-selecting a release the period already holds is still an
        // error; kept releases join the total without being re-picked.
        let period = january_period();
        let mut held = release(5, "2024-01-12T12:00:00Z", dec!(30.00));
        held.assignment = Assignment::AssignedTo(period.id);

        let result = ClosingService::plan_close(&period, &[held.id], &[held.clone()], &[], None);
        match result {
            Err(PeriodError::InvalidSelection {
                already_assigned, ..
            }) => {
                assert_eq!(already_assigned, vec![held.id]);
            }
            other => panic!("expected InvalidSelection, got {other:?}"),
        }
    }

    #[test]
    fn test_close_groups_every_offender_in_one_error() {
        let period = january_period();
        let ok = release(1, "2024-01-05T10:00:00Z", dec!(100.00));
        let early = release(2, "2023-11-01T10:00:00Z", dec!(20.00));
        let mut taken = release(3, "2024-01-10T10:00:00Z", dec!(40.00));
        taken.assignment = Assignment::AssignedTo(PeriodId::from_i32(9));
        let ghost = ReleaseId::from_i32(50);

        let result = ClosingService::plan_close(
            &period,
            &[ok.id, early.id, taken.id, ghost],
            &[ok, early.clone(), taken.clone()],
            &[],
            None,
        );
        match result {
            Err(PeriodError::InvalidSelection {
                missing,
                out_of_range,
                already_assigned,
            }) => {
                assert_eq!(missing, vec![ghost]);
                assert_eq!(out_of_range, vec![early.id]);
                assert_eq!(already_assigned, vec![taken.id]);
            }
            other => panic!("expected InvalidSelection, got {other:?}"),
        }
    }

    #[test]
    fn test_close_deduplicates_selection() {
        let period = january_period();
        let a = release(1, "2024-01-05T10:00:00Z", dec!(100.00));
        let b = release(2, "2024-01-20T16:30:00Z", dec!(250.00));

        let plan = ClosingService::plan_close(
            &period,
            &[a.id, a.id, b.id, a.id],
            &[a.clone(), b.clone()],
            &[],
            None,
        )
        .unwrap();

        assert_eq!(plan.release_ids, vec![a.id, b.id]);
        assert_eq!(plan.total_value, dec!(350.00));
    }

    #[test]
    fn test_reclose_totals_kept_and_new_releases() {
        // After a reopen the period still holds its releases; closing it
        // again with one more must total everything.
        let period = january_period();
        let mut kept = release(1, "2024-01-03T08:00:00Z", dec!(100.00));
        kept.assignment = Assignment::AssignedTo(period.id);
        let extra = release(2, "2024-01-25T11:00:00Z", dec!(50.00));

        let plan = ClosingService::plan_close(
            &period,
            &[extra.id],
            &[extra.clone()],
            &[kept],
            None,
        )
        .unwrap();

        assert_eq!(plan.release_ids, vec![extra.id]);
        assert_eq!(plan.total_value, dec!(150.00));
    }

    #[test]
    fn test_close_carries_observations() {
        let period = january_period();
        let a = release(1, "2024-01-05T10:00:00Z", dec!(100.00));

        let plan = ClosingService::plan_close(
            &period,
            &[a.id],
            &[a],
            &[],
            Some("closed after audit".to_string()),
        )
        .unwrap();

        assert_eq!(plan.observations.as_deref(), Some("closed after audit"));
    }

    #[test]
    fn test_close_preserves_cent_precision() {
        let period = january_period();
        let a = release(1, "2024-01-05T10:00:00Z", dec!(0.10));
        let b = release(2, "2024-01-06T10:00:00Z", dec!(0.20));

        let plan =
            ClosingService::plan_close(&period, &[a.id, b.id], &[a, b], &[], None).unwrap();

        // Exact decimal arithmetic, no 0.30000000000000004.
        assert_eq!(plan.total_value, dec!(0.30));
    }
}

#[cfg(test)]
mod props {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use proptest::prelude::*;

    use crate::period::types::PeriodStatus;
    use crate::release::types::Assignment;
    use notara_shared::types::EnterpriseId;

    fn cents_strategy() -> impl Strategy<Value = Decimal> {
        // Positive invoice values up to R$10M, two decimal places.
        (1i64..=1_000_000_000).prop_map(|cents| Decimal::new(cents, 2))
    }

    fn in_range_releases() -> impl Strategy<Value = Vec<ReleaseInfo>> {
        proptest::collection::vec((1u32..=28, cents_strategy()), 1..40).prop_map(|entries| {
            entries
                .into_iter()
                .enumerate()
                .map(|(index, (day, value))| ReleaseInfo {
                    id: ReleaseId::from_i32(i32::try_from(index).unwrap() + 1),
                    enterprise_id: EnterpriseId::from_i32(1),
                    entry_date: Utc.from_utc_datetime(
                        &NaiveDate::from_ymd_opt(2024, 1, day)
                            .unwrap()
                            .and_hms_opt(12, 0, 0)
                            .unwrap(),
                    ),
                    value,
                    assignment: Assignment::Unassigned,
                })
                .collect()
        })
    }

    fn january_period() -> Period {
        Period {
            id: PeriodId::from_i32(1),
            enterprise_id: EnterpriseId::from_i32(1),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            status: PeriodStatus::Open,
            total_value: None,
            observations: None,
            reopen_reason: None,
            closed_at: None,
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The planned total is exactly the sum of the selected values.
        #[test]
        fn prop_total_is_exact_sum(releases in in_range_releases()) {
            let period = january_period();
            let ids: Vec<ReleaseId> = releases.iter().map(|r| r.id).collect();

            let plan = ClosingService::plan_close(&period, &ids, &releases, &[], None).unwrap();

            let expected: Decimal = releases.iter().map(|r| r.value).sum();
            prop_assert_eq!(plan.total_value, expected);
            prop_assert_eq!(plan.release_ids.len(), releases.len());
        }

        /// Selecting the same ids twice changes nothing.
        #[test]
        fn prop_duplicate_selection_is_idempotent(releases in in_range_releases()) {
            let period = january_period();
            let ids: Vec<ReleaseId> = releases.iter().map(|r| r.id).collect();
            let doubled: Vec<ReleaseId> =
                ids.iter().chain(ids.iter()).copied().collect();

            let once = ClosingService::plan_close(&period, &ids, &releases, &[], None).unwrap();
            let twice =
                ClosingService::plan_close(&period, &doubled, &releases, &[], None).unwrap();

            prop_assert_eq!(once, twice);
        }

        /// Kept releases shift the total by exactly their own sum.
        #[test]
        fn prop_kept_releases_add_to_total(
            releases in in_range_releases(),
            kept in in_range_releases(),
        ) {
            let period = january_period();
            let ids: Vec<ReleaseId> = releases.iter().map(|r| r.id).collect();
            let kept: Vec<ReleaseInfo> = kept
                .into_iter()
                .map(|mut r| {
                    r.assignment = Assignment::AssignedTo(period.id);
                    r
                })
                .collect();

            let without =
                ClosingService::plan_close(&period, &ids, &releases, &[], None).unwrap();
            let with =
                ClosingService::plan_close(&period, &ids, &releases, &kept, None).unwrap();

            let kept_sum: Decimal = kept.iter().map(|r| r.value).sum();
            prop_assert_eq!(with.total_value - without.total_value, kept_sum);
        }
    }
}
