//! Authentication types for JWT tokens.
//!
//! Tokens identify *who* is calling, never what they may do. Permissions are
//! resolved from the database on every request so that group changes take
//! effect immediately instead of waiting for a token to expire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{EnterpriseId, UserId};

/// The kind of account a token was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    /// A staff user belonging to an enterprise.
    User,
    /// The enterprise owner account itself.
    Enterprise,
}

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user or enterprise ID, depending on `typ`).
    pub sub: i32,
    /// Principal kind.
    pub typ: PrincipalKind,
    /// Enterprise ID (tenant context).
    pub ent: i32,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates claims for a staff user.
    #[must_use]
    pub fn for_user(user_id: UserId, enterprise_id: EnterpriseId, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.into_inner(),
            typ: PrincipalKind::User,
            ent: enterprise_id.into_inner(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Creates claims for an enterprise owner account.
    #[must_use]
    pub fn for_enterprise(enterprise_id: EnterpriseId, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: enterprise_id.into_inner(),
            typ: PrincipalKind::Enterprise,
            ent: enterprise_id.into_inner(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the enterprise (tenant) ID from claims.
    #[must_use]
    pub const fn enterprise_id(&self) -> EnterpriseId {
        EnterpriseId::from_i32(self.ent)
    }

    /// Returns the user ID, if this token belongs to a staff user.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self.typ {
            PrincipalKind::User => Some(UserId::from_i32(self.sub)),
            PrincipalKind::Enterprise => None,
        }
    }

    /// Returns true if the token belongs to the enterprise owner account.
    #[must_use]
    pub const fn is_enterprise(&self) -> bool {
        matches!(self.typ, PrincipalKind::Enterprise)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_user_claims() {
        let expires = Utc::now() + Duration::hours(8);
        let claims = Claims::for_user(UserId::from_i32(7), EnterpriseId::from_i32(3), expires);

        assert_eq!(claims.user_id(), Some(UserId::from_i32(7)));
        assert_eq!(claims.enterprise_id(), EnterpriseId::from_i32(3));
        assert!(!claims.is_enterprise());
    }

    #[test]
    fn test_enterprise_claims() {
        let expires = Utc::now() + Duration::hours(8);
        let claims = Claims::for_enterprise(EnterpriseId::from_i32(3), expires);

        assert_eq!(claims.user_id(), None);
        assert_eq!(claims.enterprise_id(), EnterpriseId::from_i32(3));
        assert!(claims.is_enterprise());
    }

    #[test]
    fn test_claims_serde_roundtrip() {
        let expires = Utc::now() + Duration::hours(1);
        let claims = Claims::for_user(UserId::from_i32(1), EnterpriseId::from_i32(2), expires);

        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains("\"typ\":\"user\""));

        let back: Claims = serde_json::from_str(&json).unwrap();
        assert_eq!(back.sub, claims.sub);
        assert_eq!(back.ent, claims.ent);
    }
}
