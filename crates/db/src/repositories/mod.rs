//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod enterprise;
pub mod group;
pub mod period;
pub mod release;
pub mod user;

pub use enterprise::EnterpriseRepository;
pub use group::{GroupError, GroupRepository};
pub use period::{PeriodRepository, PeriodWithReleases};
pub use release::{ReleaseRepository, ReleaseWithImages};
pub use user::UserRepository;
