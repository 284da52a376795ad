//! Period repository for database operations.
//!
//! The close path is the concurrency-sensitive one. It runs in two phases:
//! an optimistic plan against a plain read, then a re-plan inside a
//! transaction holding `SELECT ... FOR UPDATE` locks on the period row and
//! every release the close will count. A selection that was valid in phase
//! one but lost its releases to a concurrent close surfaces as an
//! [`PeriodError::AssignmentConflict`] so callers can retry.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use notara_core::period::selection::availability_window;
use notara_core::period::types::validate_date_range;
use notara_core::period::{
    ClosingPlan, ClosingService, CreatePeriodInput, Period, PeriodError, PeriodStatus,
    ReopeningService, UpdatePeriodInput,
};
use notara_core::release::ReleaseInfo;
use notara_shared::types::{EnterpriseId, PeriodId, ReleaseId};

use super::release::to_release_info;
use crate::entities::{periods, releases};

/// Period with the releases assigned to it.
#[derive(Debug, Clone)]
pub struct PeriodWithReleases {
    /// The period record.
    pub period: periods::Model,
    /// Releases locked into the period, oldest entry first.
    pub releases: Vec<releases::Model>,
}

/// Period repository for CRUD and the close/reopen workflow.
#[derive(Debug, Clone)]
pub struct PeriodRepository {
    db: DatabaseConnection,
}

impl PeriodRepository {
    /// Creates a new period repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an open period.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` when the dates are inverted and
    /// `Database` when the insert fails.
    pub async fn create(&self, input: CreatePeriodInput) -> Result<periods::Model, PeriodError> {
        input.validate()?;

        let now = Utc::now().into();
        let period = periods::ActiveModel {
            enterprise_id: Set(input.enterprise_id.into_inner()),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            closed: Set(false),
            total_value: Set(None),
            observations: Set(input.observations),
            reopen_reason: Set(None),
            closed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        period.insert(&self.db).await.map_err(db_err)
    }

    /// Lists the periods of an enterprise, most recent range first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, enterprise_id: EnterpriseId) -> Result<Vec<periods::Model>, PeriodError> {
        periods::Entity::find()
            .filter(periods::Column::EnterpriseId.eq(enterprise_id.into_inner()))
            .order_by_desc(periods::Column::StartDate)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Finds a period by ID within an enterprise.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        enterprise_id: EnterpriseId,
        id: PeriodId,
    ) -> Result<Option<periods::Model>, PeriodError> {
        periods::Entity::find_by_id(id.into_inner())
            .filter(periods::Column::EnterpriseId.eq(enterprise_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    /// Finds a period with the releases assigned to it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the period does not exist in the enterprise.
    pub async fn find_with_releases(
        &self,
        enterprise_id: EnterpriseId,
        id: PeriodId,
    ) -> Result<PeriodWithReleases, PeriodError> {
        let period = self
            .find_by_id(enterprise_id, id)
            .await?
            .ok_or(PeriodError::NotFound(id))?;
        let releases = assigned_releases(&self.db, id).await?;

        Ok(PeriodWithReleases { period, releases })
    }

    /// Updates an open period's dates or observations.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the period does not exist,
    /// `ClosedPeriodImmutable` when it is closed, and `InvalidDateRange`
    /// when the merged dates are inverted.
    pub async fn update(
        &self,
        enterprise_id: EnterpriseId,
        id: PeriodId,
        input: UpdatePeriodInput,
    ) -> Result<periods::Model, PeriodError> {
        let period = self
            .find_by_id(enterprise_id, id)
            .await?
            .ok_or(PeriodError::NotFound(id))?;

        if period.closed {
            return Err(PeriodError::ClosedPeriodImmutable);
        }

        let start = input.start_date.unwrap_or(period.start_date);
        let end = input.end_date.unwrap_or(period.end_date);
        validate_date_range(start, end)?;

        let mut active: periods::ActiveModel = period.into();
        active.start_date = Set(start);
        active.end_date = Set(end);
        if let Some(observations) = input.observations {
            active.observations = Set(Some(observations));
        }
        active.updated_at = Set(Utc::now().into());

        active.update(&self.db).await.map_err(db_err)
    }

    /// Deletes an open period, releasing its releases back to the pool.
    ///
    /// Clearing the assignments and dropping the row happen in the same
    /// transaction, so no release is ever left pointing at a missing period.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the period does not exist and
    /// `ClosedPeriodImmutable` when it is closed.
    pub async fn delete(&self, enterprise_id: EnterpriseId, id: PeriodId) -> Result<(), PeriodError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let period = lock_period(&txn, enterprise_id, id)
            .await?
            .ok_or(PeriodError::NotFound(id))?;
        if period.closed {
            return Err(PeriodError::ClosedPeriodImmutable);
        }

        releases::Entity::update_many()
            .col_expr(
                releases::Column::PeriodId,
                sea_orm::sea_query::Expr::value(Option::<i32>::None),
            )
            .col_expr(
                releases::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(releases::Column::PeriodId.eq(id.into_inner()))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        periods::Entity::delete_by_id(id.into_inner())
            .exec(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(())
    }

    /// Lists the releases a close of this period could select: unassigned,
    /// same enterprise, entry date inside the period range. Oldest first.
    ///
    /// The period's own status does not matter here, which is what lets a
    /// reopened period be re-closed with a fresh pick.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the period does not exist in the enterprise.
    pub async fn available_releases(
        &self,
        enterprise_id: EnterpriseId,
        id: PeriodId,
    ) -> Result<Vec<releases::Model>, PeriodError> {
        let period = self
            .find_by_id(enterprise_id, id)
            .await?
            .ok_or(PeriodError::NotFound(id))?;

        let (lo, hi) = availability_window(&to_period(&period))
            .ok_or_else(|| PeriodError::Internal("period dates out of calendar range".to_string()))?;

        releases::Entity::find()
            .filter(releases::Column::EnterpriseId.eq(enterprise_id.into_inner()))
            .filter(releases::Column::PeriodId.is_null())
            .filter(releases::Column::EntryDate.gte(lo))
            .filter(releases::Column::EntryDate.lt(hi))
            .order_by_asc(releases::Column::EntryDate)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Closes a period over the selected releases.
    ///
    /// Phase one validates against a plain read and rejects bad selections
    /// cheaply. Phase two re-reads everything under row locks, re-plans,
    /// assigns the releases and freezes the total. A release grabbed by a
    /// concurrent close between the phases turns into `AssignmentConflict`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `AlreadyClosed`, `EmptySelection`,
    /// `InvalidSelection` or `AssignmentConflict` per the rules above.
    pub async fn close(
        &self,
        enterprise_id: EnterpriseId,
        id: PeriodId,
        selected: &[ReleaseId],
        observations: Option<String>,
    ) -> Result<PeriodWithReleases, PeriodError> {
        // Phase 1: optimistic plan, no locks.
        let period = self
            .find_by_id(enterprise_id, id)
            .await?
            .ok_or(PeriodError::NotFound(id))?;
        let selected_infos = load_selected(&self.db, enterprise_id, selected, false).await?;
        let kept_infos = load_kept(&self.db, id, false).await?;
        ClosingService::plan_close(
            &to_period(&period),
            selected,
            &selected_infos,
            &kept_infos,
            observations.clone(),
        )?;

        // Phase 2: replan under locks and apply.
        let txn = self.db.begin().await.map_err(db_err)?;

        let period = lock_period(&txn, enterprise_id, id)
            .await?
            .ok_or(PeriodError::NotFound(id))?;
        let selected_infos = load_selected(&txn, enterprise_id, selected, true).await?;
        let kept_infos = load_kept(&txn, id, true).await?;

        let plan = match ClosingService::plan_close(
            &to_period(&period),
            selected,
            &selected_infos,
            &kept_infos,
            observations,
        ) {
            Ok(plan) => plan,
            Err(err) => return Err(as_race_outcome(err)),
        };

        let updated = apply_close(&txn, period, &plan).await?;
        let releases = assigned_releases(&txn, id).await?;

        txn.commit().await.map_err(db_err)?;

        Ok(PeriodWithReleases {
            period: updated,
            releases,
        })
    }

    /// Reopens a closed period with a justification.
    ///
    /// The frozen total and `closed_at` stay on the row as history; the
    /// assigned releases stay put too.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `NotClosed` when the period is already open, and
    /// `MissingReason` when the justification is blank.
    pub async fn reopen(
        &self,
        enterprise_id: EnterpriseId,
        id: PeriodId,
        reason: &str,
    ) -> Result<periods::Model, PeriodError> {
        let period = self
            .find_by_id(enterprise_id, id)
            .await?
            .ok_or(PeriodError::NotFound(id))?;

        let plan = ReopeningService::plan_reopen(&to_period(&period), reason)?;

        let mut active: periods::ActiveModel = period.into();
        active.closed = Set(false);
        active.reopen_reason = Set(Some(plan.reason));
        active.updated_at = Set(Utc::now().into());

        active.update(&self.db).await.map_err(db_err)
    }
}

/// Locks and loads a period row inside a transaction.
async fn lock_period<C: ConnectionTrait>(
    conn: &C,
    enterprise_id: EnterpriseId,
    id: PeriodId,
) -> Result<Option<periods::Model>, PeriodError> {
    periods::Entity::find_by_id(id.into_inner())
        .filter(periods::Column::EnterpriseId.eq(enterprise_id.into_inner()))
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(db_err)
}

/// Loads the store's view of a close selection.
///
/// Locked loads order by id so every close takes its row locks in the same
/// order; two closes fighting over the same releases then queue instead of
/// deadlocking.
async fn load_selected<C: ConnectionTrait>(
    conn: &C,
    enterprise_id: EnterpriseId,
    ids: &[ReleaseId],
    lock: bool,
) -> Result<Vec<ReleaseInfo>, PeriodError> {
    let mut query = releases::Entity::find()
        .filter(releases::Column::EnterpriseId.eq(enterprise_id.into_inner()))
        .filter(releases::Column::Id.is_in(ids.iter().map(|id| id.into_inner())))
        .order_by_asc(releases::Column::Id);
    if lock {
        query = query.lock_exclusive();
    }

    let rows = query.all(conn).await.map_err(db_err)?;
    Ok(rows.iter().map(to_release_info).collect())
}

/// Loads the releases a period already holds from an earlier close.
async fn load_kept<C: ConnectionTrait>(
    conn: &C,
    period_id: PeriodId,
    lock: bool,
) -> Result<Vec<ReleaseInfo>, PeriodError> {
    let mut query = releases::Entity::find()
        .filter(releases::Column::PeriodId.eq(period_id.into_inner()))
        .order_by_asc(releases::Column::Id);
    if lock {
        query = query.lock_exclusive();
    }

    let rows = query.all(conn).await.map_err(db_err)?;
    Ok(rows.iter().map(to_release_info).collect())
}

/// Writes a closing plan: assigns the releases, then freezes the period.
async fn apply_close<C: ConnectionTrait>(
    conn: &C,
    period: periods::Model,
    plan: &ClosingPlan,
) -> Result<periods::Model, PeriodError> {
    let now = Utc::now();

    let assigned = releases::Entity::update_many()
        .col_expr(
            releases::Column::PeriodId,
            sea_orm::sea_query::Expr::value(plan.period_id.into_inner()),
        )
        .col_expr(releases::Column::UpdatedAt, sea_orm::sea_query::Expr::value(now))
        .filter(
            releases::Column::Id.is_in(plan.release_ids.iter().map(|id| id.into_inner())),
        )
        .filter(releases::Column::PeriodId.is_null())
        .exec(conn)
        .await
        .map_err(db_err)?;

    // The locked replan already proved every id unassigned.
    if assigned.rows_affected != plan.release_ids.len() as u64 {
        return Err(PeriodError::Internal(format!(
            "assigned {} of {} selected releases",
            assigned.rows_affected,
            plan.release_ids.len()
        )));
    }

    let mut active: periods::ActiveModel = period.into();
    active.closed = Set(true);
    active.total_value = Set(Some(plan.total_value));
    if plan.observations.is_some() {
        active.observations = Set(plan.observations.clone());
    }
    active.closed_at = Set(Some(now.into()));
    active.updated_at = Set(now.into());

    active.update(conn).await.map_err(db_err)
}

/// Releases assigned to a period, oldest entry first.
async fn assigned_releases<C: ConnectionTrait>(
    conn: &C,
    period_id: PeriodId,
) -> Result<Vec<releases::Model>, PeriodError> {
    releases::Entity::find()
        .filter(releases::Column::PeriodId.eq(period_id.into_inner()))
        .order_by_asc(releases::Column::EntryDate)
        .all(conn)
        .await
        .map_err(db_err)
}

// ===== Period Mapping Helpers =====

/// Converts a period row into the engine representation.
#[must_use]
pub fn to_period(model: &periods::Model) -> Period {
    Period {
        id: PeriodId::from_i32(model.id),
        enterprise_id: EnterpriseId::from_i32(model.enterprise_id),
        start_date: model.start_date,
        end_date: model.end_date,
        status: if model.closed {
            PeriodStatus::Closed
        } else {
            PeriodStatus::Open
        },
        total_value: model.total_value,
        observations: model.observations.clone(),
        reopen_reason: model.reopen_reason.clone(),
        closed_at: model.closed_at.map(|ts| ts.with_timezone(&Utc)),
    }
}

/// Folds a locked replan failure into the race outcome callers retry on.
///
/// A selection that passed phase one and now fails only because releases
/// became assigned lost a race with another close. Anything else is a real
/// validation failure and keeps its own error.
fn as_race_outcome(err: PeriodError) -> PeriodError {
    match err {
        PeriodError::InvalidSelection {
            missing,
            out_of_range,
            already_assigned,
        } => {
            if missing.is_empty() && out_of_range.is_empty() && !already_assigned.is_empty() {
                PeriodError::AssignmentConflict {
                    release_ids: already_assigned,
                }
            } else {
                PeriodError::InvalidSelection {
                    missing,
                    out_of_range,
                    already_assigned,
                }
            }
        }
        other => other,
    }
}

fn db_err(err: DbErr) -> PeriodError {
    PeriodError::Database(err.to_string())
}

#[cfg(test)]
#[path = "period_tests.rs"]
mod tests;
