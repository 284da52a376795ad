//! Permission flags and permission sets.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::PermissionError;

/// A single permission flag.
///
/// This is the closed set of capabilities the system knows about. Group
/// records persist these as kebab-case slugs; anything else fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Permission {
    /// Grants every other permission unconditionally.
    Admin,
    /// Create invoice releases.
    CreateRelease,
    /// View invoice releases.
    ViewRelease,
    /// Edit invoice releases.
    EditRelease,
    /// Delete invoice releases.
    DeleteRelease,
    /// Create accounting periods.
    CreatePeriod,
    /// View accounting periods.
    ViewPeriod,
    /// Edit accounting periods, including close and reopen.
    EditPeriod,
    /// Delete accounting periods.
    DeletePeriod,
}

impl Permission {
    /// Every permission, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::Admin,
        Self::CreateRelease,
        Self::ViewRelease,
        Self::EditRelease,
        Self::DeleteRelease,
        Self::CreatePeriod,
        Self::ViewPeriod,
        Self::EditPeriod,
        Self::DeletePeriod,
    ];

    /// Returns the kebab-case slug used in storage and API responses.
    #[must_use]
    pub const fn as_slug(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::CreateRelease => "create-release",
            Self::ViewRelease => "view-release",
            Self::EditRelease => "edit-release",
            Self::DeleteRelease => "delete-release",
            Self::CreatePeriod => "create-period",
            Self::ViewPeriod => "view-period",
            Self::EditPeriod => "edit-period",
            Self::DeletePeriod => "delete-period",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_slug())
    }
}

impl FromStr for Permission {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "create-release" => Ok(Self::CreateRelease),
            "view-release" => Ok(Self::ViewRelease),
            "edit-release" => Ok(Self::EditRelease),
            "delete-release" => Ok(Self::DeleteRelease),
            "create-period" => Ok(Self::CreatePeriod),
            "view-period" => Ok(Self::ViewPeriod),
            "edit-period" => Ok(Self::EditPeriod),
            "delete-period" => Ok(Self::DeletePeriod),
            other => Err(PermissionError::UnknownPermission(other.to_string())),
        }
    }
}

/// An immutable set of permission flags held by a principal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet {
    grants: BTreeSet<Permission>,
}

impl PermissionSet {
    /// Creates an empty set.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates the full set (every permission, including admin).
    #[must_use]
    pub fn full() -> Self {
        Self {
            grants: Permission::ALL.into_iter().collect(),
        }
    }

    /// Parses a set from stored slugs.
    ///
    /// # Errors
    ///
    /// Returns `PermissionError::UnknownPermission` on the first slug that
    /// does not name a known permission. Rejecting the whole set keeps a
    /// corrupt group record from silently granting a subset of its flags.
    pub fn from_slugs<'a, I>(slugs: I) -> Result<Self, PermissionError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let grants = slugs
            .into_iter()
            .map(Permission::from_str)
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self { grants })
    }

    /// Adds a permission to the set.
    pub fn insert(&mut self, permission: Permission) {
        self.grants.insert(permission);
    }

    /// Returns true if the set literally contains the flag (no admin
    /// short-circuit).
    #[must_use]
    pub fn contains(&self, permission: Permission) -> bool {
        self.grants.contains(&permission)
    }

    /// Returns true if the set contains the admin flag.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.grants.contains(&Permission::Admin)
    }

    /// Returns true if the set satisfies a check for `permission`.
    ///
    /// Admin satisfies every check.
    #[must_use]
    pub fn allows(&self, permission: Permission) -> bool {
        self.is_admin() || self.contains(permission)
    }

    /// Requires a single permission.
    ///
    /// # Errors
    ///
    /// Returns `PermissionError::MissingPermissions` naming the flag.
    pub fn require(&self, permission: Permission) -> Result<(), PermissionError> {
        if self.allows(permission) {
            Ok(())
        } else {
            Err(PermissionError::MissingPermissions {
                missing: vec![permission],
            })
        }
    }

    /// Requires every listed permission.
    ///
    /// # Errors
    ///
    /// Returns `PermissionError::MissingPermissions` listing each flag the
    /// set does not satisfy.
    pub fn require_all(&self, permissions: &[Permission]) -> Result<(), PermissionError> {
        let missing: Vec<Permission> = permissions
            .iter()
            .copied()
            .filter(|p| !self.allows(*p))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(PermissionError::MissingPermissions { missing })
        }
    }

    /// Requires at least one of the listed permissions.
    ///
    /// # Errors
    ///
    /// Returns `PermissionError::MissingPermissions` listing the full
    /// requested set when none is satisfied.
    pub fn require_any(&self, permissions: &[Permission]) -> Result<(), PermissionError> {
        if permissions.iter().any(|p| self.allows(*p)) {
            Ok(())
        } else {
            Err(PermissionError::MissingPermissions {
                missing: permissions.to_vec(),
            })
        }
    }

    /// Iterates over the contained flags in slug order.
    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.grants.iter().copied()
    }

    /// Returns the number of contained flags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.grants.len()
    }

    /// Returns true if no flags are contained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self {
            grants: iter.into_iter().collect(),
        }
    }
}
