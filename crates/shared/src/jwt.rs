//! Token issuance and validation for user and enterprise principals.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use crate::auth::Claims;
use crate::types::{EnterpriseId, UserId};

/// Signing settings for issued tokens.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC secret shared by issuance and validation.
    pub secret: String,
    /// Access token lifetime in seconds.
    pub access_token_expires_secs: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            access_token_expires_secs: 28800,
        }
    }
}

/// Token handling failures.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Token encoding failed.
    #[error("failed to encode token: {0}")]
    EncodingError(String),

    /// Token decoding failed.
    #[error("failed to decode token: {0}")]
    DecodingError(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,
}

/// Issues and validates the bearer tokens the API accepts.
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("config", &"[hidden]")
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Builds the service, deriving both keys from the secret.
    #[must_use]
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Generates an access token for a staff user.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if token generation fails.
    pub fn generate_user_token(
        &self,
        user_id: UserId,
        enterprise_id: EnterpriseId,
    ) -> Result<String, JwtError> {
        self.issue(&Claims::for_user(user_id, enterprise_id, self.expiry()))
    }

    /// Generates an access token for an enterprise owner account.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if token generation fails.
    pub fn generate_enterprise_token(
        &self,
        enterprise_id: EnterpriseId,
    ) -> Result<String, JwtError> {
        self.issue(&Claims::for_enterprise(enterprise_id, self.expiry()))
    }

    /// Validates a token and returns its claims.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Expired` if the token has expired.
    /// Returns `JwtError::DecodingError` if the token is malformed.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let validation = Validation::default();

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::DecodingError(e.to_string()),
            })
    }

    fn issue(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }

    fn expiry(&self) -> DateTime<Utc> {
        Utc::now() + Duration::seconds(self.config.access_token_expires_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> JwtService {
        JwtService::new(JwtConfig {
            secret: "test-secret-key-for-testing".to_string(),
            access_token_expires_secs: 900,
        })
    }

    #[test]
    fn test_generate_user_token() {
        let service = create_test_service();

        let token = service
            .generate_user_token(UserId::from_i32(1), EnterpriseId::from_i32(2))
            .unwrap();
        assert!(!token.is_empty());
    }

    #[test]
    fn test_validate_token() {
        let service = create_test_service();

        let token = service
            .generate_user_token(UserId::from_i32(5), EnterpriseId::from_i32(9))
            .unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.user_id(), Some(UserId::from_i32(5)));
        assert_eq!(claims.enterprise_id(), EnterpriseId::from_i32(9));
    }

    #[test]
    fn test_validate_enterprise_token() {
        let service = create_test_service();

        let token = service
            .generate_enterprise_token(EnterpriseId::from_i32(4))
            .unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert!(claims.is_enterprise());
        assert_eq!(claims.enterprise_id(), EnterpriseId::from_i32(4));
    }

    #[test]
    fn test_validate_garbage_token() {
        let service = create_test_service();
        assert!(service.validate_token("not.a.token").is_err());
    }

    #[test]
    fn test_validate_token_wrong_secret() {
        let service = create_test_service();
        let other = JwtService::new(JwtConfig {
            secret: "a-different-secret-entirely".to_string(),
            access_token_expires_secs: 900,
        });

        let token = service
            .generate_user_token(UserId::from_i32(1), EnterpriseId::from_i32(1))
            .unwrap();
        assert!(other.validate_token(&token).is_err());
    }
}
