//! Accounting period ("período") management.
//!
//! A period locks a selected set of invoice releases behind a closed date
//! range with a computed total. The engines here are pure: they validate and
//! plan; the database layer executes the plans transactionally.

pub mod closing;
pub mod error;
pub mod reopening;
pub mod selection;
pub mod types;

pub use closing::{ClosingPlan, ClosingService};
pub use error::PeriodError;
pub use reopening::{ReopenPlan, ReopeningService};
pub use types::{CreatePeriodInput, Period, PeriodStatus, UpdatePeriodInput};
