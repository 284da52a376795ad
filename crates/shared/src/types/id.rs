//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `ReleaseId` where a `PeriodId` is expected.
//! All entities use database-assigned integer keys, so there is no constructor for a fresh
//! random ID; values come from the database or from request paths.

use serde::{Deserialize, Serialize};

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i32);

        impl $name {
            /// Creates an ID from a raw database key.
            #[must_use]
            pub const fn from_i32(id: i32) -> Self {
                Self(id)
            }

            /// Returns the raw database key.
            #[must_use]
            pub const fn into_inner(self) -> i32 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }
    };
}

typed_id!(EnterpriseId, "Unique identifier for an enterprise (tenant).");
typed_id!(UserId, "Unique identifier for a user.");
typed_id!(GroupId, "Unique identifier for a permission group.");
typed_id!(PeriodId, "Unique identifier for a closing period.");
typed_id!(ReleaseId, "Unique identifier for a release.");
