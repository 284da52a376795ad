//! Release repository for database operations.
//!
//! Releases carry their assignment in the `period_id` column. Every write
//! checks the owning period first: a release inside a closed period is
//! immutable until the period is reopened.

use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use notara_core::release::{
    Assignment, CreateReleaseInput, ReleaseError, ReleaseFilter, ReleaseInfo, UpdateReleaseInput,
};
use notara_shared::types::{EnterpriseId, PeriodId, ReleaseId};

use crate::entities::{periods, release_images, releases};

/// Release with its attached images.
#[derive(Debug, Clone)]
pub struct ReleaseWithImages {
    /// The release record.
    pub release: releases::Model,
    /// Image URLs attached to the release.
    pub images: Vec<release_images::Model>,
}

/// Release repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct ReleaseRepository {
    db: DatabaseConnection,
}

impl ReleaseRepository {
    /// Creates a new release repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a release together with its images.
    ///
    /// # Errors
    ///
    /// Returns `NoImages` or `NonPositiveValue` when validation fails, and
    /// `Database` when the insert fails.
    pub async fn create(&self, input: CreateReleaseInput) -> Result<ReleaseWithImages, ReleaseError> {
        input.validate()?;

        let txn = self.db.begin().await.map_err(db_err)?;
        let now = Utc::now().into();

        let release = releases::ActiveModel {
            enterprise_id: Set(input.enterprise_id.into_inner()),
            period_id: Set(None),
            created_by: Set(input.created_by.into_inner()),
            entry_date: Set(input.entry_date.into()),
            invoice_number: Set(input.invoice.number),
            invoice_value: Set(input.invoice.value),
            invoice_issue_date: Set(input.invoice.issue_date),
            xml_key: Set(input.xml_key),
            latitude: Set(input.location.latitude),
            longitude: Set(input.location.longitude),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let release = release.insert(&txn).await.map_err(db_err)?;

        let mut images = Vec::with_capacity(input.images.len());
        for url in input.images {
            let image = release_images::ActiveModel {
                release_id: Set(release.id),
                url: Set(url),
                created_at: Set(now),
                ..Default::default()
            };
            images.push(image.insert(&txn).await.map_err(db_err)?);
        }

        txn.commit().await.map_err(db_err)?;

        Ok(ReleaseWithImages { release, images })
    }

    /// Lists releases of an enterprise, newest entry first.
    ///
    /// # Errors
    ///
    /// Returns an error if a date bound cannot be represented or the
    /// database query fails.
    pub async fn list(
        &self,
        enterprise_id: EnterpriseId,
        filter: &ReleaseFilter,
    ) -> Result<Vec<releases::Model>, ReleaseError> {
        let mut query = releases::Entity::find()
            .filter(releases::Column::EnterpriseId.eq(enterprise_id.into_inner()));

        match filter.assigned {
            Some(true) => query = query.filter(releases::Column::PeriodId.is_not_null()),
            Some(false) => query = query.filter(releases::Column::PeriodId.is_null()),
            None => {}
        }

        if let Some(period_id) = filter.period_id {
            query = query.filter(releases::Column::PeriodId.eq(period_id.into_inner()));
        }

        if let Some(from) = filter.from {
            let lo = day_start(from).ok_or_else(date_out_of_range)?;
            query = query.filter(releases::Column::EntryDate.gte(lo));
        }

        if let Some(to) = filter.to {
            let hi = next_day_start(to).ok_or_else(date_out_of_range)?;
            query = query.filter(releases::Column::EntryDate.lt(hi));
        }

        query
            .order_by_desc(releases::Column::EntryDate)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Finds a release by ID with its images.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the release does not exist in the
    /// enterprise, and `Database` when the query fails.
    pub async fn find_with_images(
        &self,
        enterprise_id: EnterpriseId,
        id: ReleaseId,
    ) -> Result<ReleaseWithImages, ReleaseError> {
        let release = self.find_scoped(enterprise_id, id).await?;
        let images = self.images_of(release.id).await?;
        Ok(ReleaseWithImages { release, images })
    }

    /// Updates a release. Fields left as `None` are untouched; a provided
    /// image list replaces the whole set.
    ///
    /// The row is locked for the whole transaction. A close running at the
    /// same time either sees this write or blocks it until the period state
    /// is settled, so the closed-period check cannot go stale.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the release does not exist in the
    /// enterprise and `LockedInClosedPeriod` when its period is closed.
    pub async fn update(
        &self,
        enterprise_id: EnterpriseId,
        id: ReleaseId,
        input: UpdateReleaseInput,
    ) -> Result<ReleaseWithImages, ReleaseError> {
        input.validate()?;

        let txn = self.db.begin().await.map_err(db_err)?;

        let release = lock_release(&txn, enterprise_id, id)
            .await?
            .ok_or(ReleaseError::NotFound(id))?;
        ensure_not_locked(&txn, &release).await?;

        let release_id = release.id;
        let mut active: releases::ActiveModel = release.into();
        if let Some(number) = input.invoice_number {
            active.invoice_number = Set(number);
        }
        if let Some(value) = input.invoice_value {
            active.invoice_value = Set(value);
        }
        if let Some(issue_date) = input.invoice_issue_date {
            active.invoice_issue_date = Set(issue_date);
        }
        if let Some(entry_date) = input.entry_date {
            active.entry_date = Set(entry_date.into());
        }
        if let Some(xml_key) = input.xml_key {
            active.xml_key = Set(Some(xml_key));
        }
        if let Some(location) = input.location {
            active.latitude = Set(location.latitude);
            active.longitude = Set(location.longitude);
        }
        active.updated_at = Set(Utc::now().into());
        let release = active.update(&txn).await.map_err(db_err)?;

        if let Some(urls) = input.images {
            release_images::Entity::delete_many()
                .filter(release_images::Column::ReleaseId.eq(release_id))
                .exec(&txn)
                .await
                .map_err(db_err)?;

            let now = Utc::now().into();
            for url in urls {
                let image = release_images::ActiveModel {
                    release_id: Set(release_id),
                    url: Set(url),
                    created_at: Set(now),
                    ..Default::default()
                };
                image.insert(&txn).await.map_err(db_err)?;
            }
        }

        let images = release_images::Entity::find()
            .filter(release_images::Column::ReleaseId.eq(release_id))
            .order_by_asc(release_images::Column::Id)
            .all(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        Ok(ReleaseWithImages { release, images })
    }

    /// Deletes a release. Images go with it through the cascade.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the release does not exist in the
    /// enterprise and `LockedInClosedPeriod` when its period is closed.
    pub async fn delete(&self, enterprise_id: EnterpriseId, id: ReleaseId) -> Result<(), ReleaseError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let release = lock_release(&txn, enterprise_id, id)
            .await?
            .ok_or(ReleaseError::NotFound(id))?;
        ensure_not_locked(&txn, &release).await?;

        releases::Entity::delete_by_id(release.id)
            .exec(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn find_scoped(
        &self,
        enterprise_id: EnterpriseId,
        id: ReleaseId,
    ) -> Result<releases::Model, ReleaseError> {
        releases::Entity::find_by_id(id.into_inner())
            .filter(releases::Column::EnterpriseId.eq(enterprise_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(ReleaseError::NotFound(id))
    }

    async fn images_of(&self, release_id: i32) -> Result<Vec<release_images::Model>, ReleaseError> {
        release_images::Entity::find()
            .filter(release_images::Column::ReleaseId.eq(release_id))
            .order_by_asc(release_images::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)
    }
}

/// Locks and loads a release row inside a transaction.
async fn lock_release<C: ConnectionTrait>(
    conn: &C,
    enterprise_id: EnterpriseId,
    id: ReleaseId,
) -> Result<Option<releases::Model>, ReleaseError> {
    releases::Entity::find_by_id(id.into_inner())
        .filter(releases::Column::EnterpriseId.eq(enterprise_id.into_inner()))
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(db_err)
}

/// Rejects writes to a release whose owning period is closed.
async fn ensure_not_locked<C: ConnectionTrait>(
    conn: &C,
    release: &releases::Model,
) -> Result<(), ReleaseError> {
    let Some(period_id) = release.period_id else {
        return Ok(());
    };

    let period = periods::Entity::find_by_id(period_id)
        .one(conn)
        .await
        .map_err(db_err)?;

    if period.is_some_and(|p| p.closed) {
        return Err(ReleaseError::LockedInClosedPeriod(ReleaseId::from_i32(
            release.id,
        )));
    }
    Ok(())
}

// ===== Release Mapping Helpers =====

/// Projects a release row to the slice the period engines consume.
#[must_use]
pub fn to_release_info(model: &releases::Model) -> ReleaseInfo {
    ReleaseInfo {
        id: ReleaseId::from_i32(model.id),
        enterprise_id: EnterpriseId::from_i32(model.enterprise_id),
        entry_date: model.entry_date.with_timezone(&Utc),
        value: model.invoice_value,
        assignment: Assignment::from(model.period_id.map(PeriodId::from_i32)),
    }
}

/// First instant of a day, UTC.
#[must_use]
pub fn day_start(date: NaiveDate) -> Option<DateTime<Utc>> {
    let start = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&start))
}

/// First instant of the following day, UTC. Exclusive upper bound for a
/// date filter.
#[must_use]
pub fn next_day_start(date: NaiveDate) -> Option<DateTime<Utc>> {
    day_start(date.checked_add_days(Days::new(1))?)
}

fn db_err(err: DbErr) -> ReleaseError {
    ReleaseError::Database(err.to_string())
}

fn date_out_of_range() -> ReleaseError {
    ReleaseError::Internal("date filter out of calendar range".to_string())
}

#[cfg(test)]
#[path = "release_tests.rs"]
mod tests;
