//! Unit tests for the period mapping and race-outcome helpers.

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;

use notara_core::period::{PeriodError, PeriodStatus};
use notara_shared::types::{EnterpriseId, PeriodId, ReleaseId};

use super::{as_race_outcome, to_period};
use crate::entities::periods;

fn period_row(closed: bool) -> periods::Model {
    let now = Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap();
    periods::Model {
        id: 5,
        enterprise_id: 2,
        start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
        closed,
        total_value: closed.then(|| dec!(350.00)),
        observations: Some("Janeiro".to_string()),
        reopen_reason: None,
        closed_at: closed.then(|| now.into()),
        created_at: now.into(),
        updated_at: now.into(),
    }
}

#[test]
fn maps_open_row() {
    let period = to_period(&period_row(false));

    assert_eq!(period.id, PeriodId::from_i32(5));
    assert_eq!(period.enterprise_id, EnterpriseId::from_i32(2));
    assert_eq!(period.status, PeriodStatus::Open);
    assert_eq!(period.total_value, None);
    assert_eq!(period.closed_at, None);
}

#[test]
fn maps_closed_row_with_frozen_total() {
    let period = to_period(&period_row(true));

    assert_eq!(period.status, PeriodStatus::Closed);
    assert_eq!(period.total_value, Some(dec!(350.00)));
    assert!(period.closed_at.is_some());
}

#[test]
fn pure_assignment_loss_becomes_conflict() {
    let err = PeriodError::InvalidSelection {
        missing: vec![],
        out_of_range: vec![],
        already_assigned: vec![ReleaseId::from_i32(3), ReleaseId::from_i32(8)],
    };

    match as_race_outcome(err) {
        PeriodError::AssignmentConflict { release_ids } => {
            assert_eq!(
                release_ids,
                vec![ReleaseId::from_i32(3), ReleaseId::from_i32(8)]
            );
        }
        other => panic!("expected AssignmentConflict, got {other:?}"),
    }
}

#[test]
fn mixed_failure_stays_invalid_selection() {
    let err = PeriodError::InvalidSelection {
        missing: vec![ReleaseId::from_i32(1)],
        out_of_range: vec![],
        already_assigned: vec![ReleaseId::from_i32(3)],
    };

    assert!(matches!(
        as_race_outcome(err),
        PeriodError::InvalidSelection { .. }
    ));
}

#[test]
fn non_selection_errors_pass_through() {
    assert!(matches!(
        as_race_outcome(PeriodError::AlreadyClosed),
        PeriodError::AlreadyClosed
    ));
}
