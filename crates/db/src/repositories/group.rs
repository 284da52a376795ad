//! Group repository and permission resolution.
//!
//! Groups store their grants as a JSON array of permission slugs. Resolution
//! parses that column into a [`PermissionSet`]; a corrupt column fails the
//! whole lookup rather than granting a partial set.

use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set};

use notara_core::permission::{PermissionError, PermissionSet};
use notara_shared::types::{EnterpriseId, GroupId};

use crate::entities::{groups, users};

/// Error types for group operations.
#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    /// Group not found.
    #[error("Group not found: {0}")]
    NotFound(GroupId),

    /// Stored permissions column is not a JSON array of strings.
    #[error("Group {0} has a malformed permissions column")]
    MalformedPermissions(GroupId),

    /// A stored slug does not name a known permission.
    #[error(transparent)]
    Permission(#[from] PermissionError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Group repository for permission storage and lookup.
#[derive(Debug, Clone)]
pub struct GroupRepository {
    db: DatabaseConnection,
}

impl GroupRepository {
    /// Creates a new group repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a group by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: GroupId) -> Result<Option<groups::Model>, GroupError> {
        let group = groups::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?;
        Ok(group)
    }

    /// Creates a new group with the given permission set.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        enterprise_id: EnterpriseId,
        name: &str,
        permissions: &PermissionSet,
    ) -> Result<groups::Model, GroupError> {
        let now = chrono::Utc::now().into();
        let slugs: Vec<&str> = permissions.iter().map(|p| p.as_slug()).collect();
        let group = groups::ActiveModel {
            enterprise_id: Set(enterprise_id.into_inner()),
            name: Set(name.to_string()),
            permissions: Set(serde_json::Value::from(slugs)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let group = group.insert(&self.db).await?;
        Ok(group)
    }

    /// Resolves the permission set a user holds through their group.
    ///
    /// Users without a group resolve to the empty set.
    ///
    /// # Errors
    ///
    /// Returns an error if the group row is missing or its permissions
    /// column cannot be parsed, or if the database query fails.
    pub async fn permission_set_for_user(
        &self,
        user: &users::Model,
    ) -> Result<PermissionSet, GroupError> {
        let Some(group_id) = user.group_id else {
            return Ok(PermissionSet::empty());
        };

        let group = groups::Entity::find_by_id(group_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| GroupError::NotFound(GroupId::from_i32(group_id)))?;

        permissions_of(&group)
    }
}

// ===== Permission Parsing Helpers =====

/// Parses the permissions column of a group row into a set.
///
/// # Errors
///
/// Returns `MalformedPermissions` when the column is not an array of
/// strings, and `Permission` when a slug is unknown.
pub fn permissions_of(group: &groups::Model) -> Result<PermissionSet, GroupError> {
    let group_id = GroupId::from_i32(group.id);
    let Some(entries) = group.permissions.as_array() else {
        return Err(GroupError::MalformedPermissions(group_id));
    };

    let slugs = entries
        .iter()
        .map(|entry| {
            entry
                .as_str()
                .ok_or(GroupError::MalformedPermissions(group_id))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PermissionSet::from_slugs(slugs)?)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use notara_core::permission::Permission;

    use super::*;

    fn group_with_permissions(permissions: serde_json::Value) -> groups::Model {
        let now = chrono::Utc::now().into();
        groups::Model {
            id: 1,
            enterprise_id: 1,
            name: "Contadores".to_string(),
            permissions,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn parses_known_slugs() {
        let group = group_with_permissions(json!(["view-period", "edit-period"]));
        let set = permissions_of(&group).unwrap();

        assert!(set.allows(Permission::ViewPeriod));
        assert!(set.allows(Permission::EditPeriod));
        assert!(!set.allows(Permission::DeletePeriod));
    }

    #[test]
    fn empty_array_is_empty_set() {
        let group = group_with_permissions(json!([]));
        let set = permissions_of(&group).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn admin_slug_grants_everything() {
        let group = group_with_permissions(json!(["admin"]));
        let set = permissions_of(&group).unwrap();

        assert!(set.is_admin());
        assert!(set.allows(Permission::DeleteRelease));
    }

    #[test]
    fn rejects_non_array_column() {
        let group = group_with_permissions(json!({"admin": true}));
        assert!(matches!(
            permissions_of(&group),
            Err(GroupError::MalformedPermissions(_))
        ));
    }

    #[test]
    fn rejects_non_string_entry() {
        let group = group_with_permissions(json!(["view-period", 7]));
        assert!(matches!(
            permissions_of(&group),
            Err(GroupError::MalformedPermissions(_))
        ));
    }

    #[test]
    fn rejects_unknown_slug() {
        let group = group_with_permissions(json!(["view-period", "launch-rocket"]));
        assert!(matches!(
            permissions_of(&group),
            Err(GroupError::Permission(PermissionError::UnknownPermission(
                _
            )))
        ));
    }

    proptest! {
        /// Any set serialized into the column parses back to itself.
        #[test]
        fn prop_column_round_trip(mask in 0u16..512) {
            let mut set = PermissionSet::empty();
            for (bit, permission) in Permission::ALL.into_iter().enumerate() {
                if mask & (1 << bit) != 0 {
                    set.insert(permission);
                }
            }

            let column = serde_json::to_value(&set).unwrap();
            let group = group_with_permissions(column);
            let parsed = permissions_of(&group).unwrap();

            prop_assert_eq!(parsed, set);
        }
    }
}
