//! Invoice release ("lançamento") domain types and validation.

pub mod error;
pub mod types;

pub use error::ReleaseError;
pub use types::{
    Assignment, CreateReleaseInput, GeoPoint, Invoice, ReleaseFilter, ReleaseInfo,
    UpdateReleaseInput,
};
