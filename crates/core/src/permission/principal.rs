//! Principal snapshots for per-request authorization.

use serde::Serialize;

use notara_shared::types::{EnterpriseId, UserId};

use super::error::PermissionError;
use super::types::{Permission, PermissionSet};

/// The acting identity behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Actor {
    /// The enterprise owner account.
    Enterprise {
        /// The enterprise itself.
        enterprise_id: EnterpriseId,
    },
    /// A staff user within an enterprise.
    User {
        /// The user.
        user_id: UserId,
        /// The enterprise the user belongs to.
        enterprise_id: EnterpriseId,
    },
}

/// An immutable authorization snapshot, resolved server-side once per request.
///
/// The permission set is never taken from the client; the tenancy middleware
/// loads it from the user's group at request time, so revoking a flag takes
/// effect on the very next call.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    /// Who is acting.
    pub actor: Actor,
    /// What they may do.
    pub permissions: PermissionSet,
}

impl Principal {
    /// Creates a principal for the enterprise owner account.
    ///
    /// Enterprise accounts implicitly hold the full permission set.
    #[must_use]
    pub fn for_enterprise(enterprise_id: EnterpriseId) -> Self {
        Self {
            actor: Actor::Enterprise { enterprise_id },
            permissions: PermissionSet::full(),
        }
    }

    /// Creates a principal for a staff user with the given resolved set.
    #[must_use]
    pub fn for_user(
        user_id: UserId,
        enterprise_id: EnterpriseId,
        permissions: PermissionSet,
    ) -> Self {
        Self {
            actor: Actor::User {
                user_id,
                enterprise_id,
            },
            permissions,
        }
    }

    /// Returns the tenant this principal acts within.
    #[must_use]
    pub const fn enterprise_id(&self) -> EnterpriseId {
        match self.actor {
            Actor::Enterprise { enterprise_id } | Actor::User { enterprise_id, .. } => {
                enterprise_id
            }
        }
    }

    /// Returns the user ID when the actor is a staff user.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self.actor {
            Actor::User { user_id, .. } => Some(user_id),
            Actor::Enterprise { .. } => None,
        }
    }

    /// Returns true if this check would pass for the principal.
    #[must_use]
    pub fn allows(&self, permission: Permission) -> bool {
        self.permissions.allows(permission)
    }

    /// Requires a single permission.
    ///
    /// # Errors
    ///
    /// Returns `PermissionError::MissingPermissions` naming the flag.
    pub fn require(&self, permission: Permission) -> Result<(), PermissionError> {
        self.permissions.require(permission)
    }

    /// Requires every listed permission.
    ///
    /// # Errors
    ///
    /// Returns `PermissionError::MissingPermissions` listing the unmet flags.
    pub fn require_all(&self, permissions: &[Permission]) -> Result<(), PermissionError> {
        self.permissions.require_all(permissions)
    }

    /// Requires at least one of the listed permissions.
    ///
    /// # Errors
    ///
    /// Returns `PermissionError::MissingPermissions` when none is satisfied.
    pub fn require_any(&self, permissions: &[Permission]) -> Result<(), PermissionError> {
        self.permissions.require_any(permissions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enterprise_principal_holds_full_set() {
        let principal = Principal::for_enterprise(EnterpriseId::from_i32(1));
        for permission in Permission::ALL {
            assert!(principal.allows(permission));
        }
        assert_eq!(principal.user_id(), None);
        assert_eq!(principal.enterprise_id(), EnterpriseId::from_i32(1));
    }

    #[test]
    fn test_user_principal_limited_to_resolved_set() {
        let set = PermissionSet::from_slugs(["view-period"]).unwrap();
        let principal =
            Principal::for_user(UserId::from_i32(7), EnterpriseId::from_i32(1), set);

        assert!(principal.allows(Permission::ViewPeriod));
        assert!(!principal.allows(Permission::EditPeriod));
        assert_eq!(principal.user_id(), Some(UserId::from_i32(7)));
    }

    #[test]
    fn test_require_surfaces_missing_flags() {
        let principal = Principal::for_user(
            UserId::from_i32(7),
            EnterpriseId::from_i32(1),
            PermissionSet::empty(),
        );

        let err = principal
            .require_all(&[Permission::ViewPeriod, Permission::ViewRelease])
            .unwrap_err();
        assert_eq!(
            err,
            PermissionError::MissingPermissions {
                missing: vec![Permission::ViewPeriod, Permission::ViewRelease],
            }
        );
    }
}
