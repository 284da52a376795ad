//! Release domain types for creation and validation.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use notara_shared::types::{EnterpriseId, PeriodId, ReleaseId, UserId};

use super::error::ReleaseError;

/// Whether a release is locked into a period.
///
/// The nullable `period_id` column exists only at the persistence boundary;
/// inside the engines a release is either unassigned or assigned, nothing
/// in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Option<PeriodId>", from = "Option<PeriodId>")]
pub enum Assignment {
    /// Not locked into any period.
    Unassigned,
    /// Locked into the given period.
    AssignedTo(PeriodId),
}

impl Assignment {
    /// Returns true if the release is not assigned to any period.
    #[must_use]
    pub const fn is_unassigned(&self) -> bool {
        matches!(self, Self::Unassigned)
    }

    /// Returns the owning period, if any.
    #[must_use]
    pub const fn period_id(&self) -> Option<PeriodId> {
        match self {
            Self::Unassigned => None,
            Self::AssignedTo(id) => Some(*id),
        }
    }
}

impl From<Option<PeriodId>> for Assignment {
    fn from(period_id: Option<PeriodId>) -> Self {
        period_id.map_or(Self::Unassigned, Self::AssignedTo)
    }
}

impl From<Assignment> for Option<PeriodId> {
    fn from(assignment: Assignment) -> Self {
        assignment.period_id()
    }
}

/// Invoice ("nota fiscal") data embedded in a release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Invoice number as printed on the document.
    pub number: String,
    /// Invoice value with 2 decimal places.
    pub value: Decimal,
    /// Date the invoice was issued.
    pub issue_date: NaiveDate,
}

/// Geolocation captured at entry time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in decimal degrees.
    pub latitude: Decimal,
    /// Longitude in decimal degrees.
    pub longitude: Decimal,
}

/// The slice of a release the period engines need.
///
/// Loaded from the store without images or XML payloads; carrying the full
/// record through validation would be wasted I/O.
#[derive(Debug, Clone)]
pub struct ReleaseInfo {
    /// The release ID.
    pub id: ReleaseId,
    /// Owning enterprise.
    pub enterprise_id: EnterpriseId,
    /// When the release was entered.
    pub entry_date: DateTime<Utc>,
    /// Invoice value.
    pub value: Decimal,
    /// Current assignment state.
    pub assignment: Assignment,
}

/// Input for creating a release.
#[derive(Debug, Clone)]
pub struct CreateReleaseInput {
    /// Owning enterprise.
    pub enterprise_id: EnterpriseId,
    /// User entering the release.
    pub created_by: UserId,
    /// Entry timestamp.
    pub entry_date: DateTime<Utc>,
    /// Invoice data.
    pub invoice: Invoice,
    /// Optional storage key of the invoice XML payload.
    pub xml_key: Option<String>,
    /// Where the entry was captured.
    pub location: GeoPoint,
    /// Image URLs, at least one.
    pub images: Vec<String>,
}

impl CreateReleaseInput {
    /// Validates the input before persistence.
    ///
    /// # Errors
    ///
    /// Returns `ReleaseError::NoImages` when no image is attached and
    /// `ReleaseError::NonPositiveValue` for a zero or negative invoice value.
    pub fn validate(&self) -> Result<(), ReleaseError> {
        if self.images.is_empty() {
            return Err(ReleaseError::NoImages);
        }
        if self.invoice.value <= Decimal::ZERO {
            return Err(ReleaseError::NonPositiveValue);
        }
        Ok(())
    }
}

/// Input for updating a release. Absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateReleaseInput {
    /// New invoice number.
    pub invoice_number: Option<String>,
    /// New invoice value.
    pub invoice_value: Option<Decimal>,
    /// New invoice issue date.
    pub invoice_issue_date: Option<NaiveDate>,
    /// New entry timestamp.
    pub entry_date: Option<DateTime<Utc>>,
    /// New XML storage key.
    pub xml_key: Option<String>,
    /// New location.
    pub location: Option<GeoPoint>,
    /// Replacement image set, at least one when present.
    pub images: Option<Vec<String>>,
}

impl UpdateReleaseInput {
    /// Validates the provided fields.
    ///
    /// # Errors
    ///
    /// Returns `ReleaseError::NoImages` when the replacement image set is
    /// empty and `ReleaseError::NonPositiveValue` for an invalid value.
    pub fn validate(&self) -> Result<(), ReleaseError> {
        if let Some(images) = &self.images
            && images.is_empty()
        {
            return Err(ReleaseError::NoImages);
        }
        if let Some(value) = self.invoice_value
            && value <= Decimal::ZERO
        {
            return Err(ReleaseError::NonPositiveValue);
        }
        Ok(())
    }
}

/// Filter parameters for listing releases.
#[derive(Debug, Clone, Default)]
pub struct ReleaseFilter {
    /// When set, keeps only assigned (`true`) or unassigned (`false`) releases.
    pub assigned: Option<bool>,
    /// Keeps releases entered on or after this date.
    pub from: Option<NaiveDate>,
    /// Keeps releases entered on or before this date.
    pub to: Option<NaiveDate>,
    /// Keeps releases assigned to the given period.
    pub period_id: Option<PeriodId>,
}
