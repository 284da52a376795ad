//! Authentication middleware for protected routes.
//!
//! Beyond token validation this middleware resolves the request's
//! [`Principal`]: enterprise tokens get the full permission set, user
//! tokens get the set stored on the user's group, loaded fresh on every
//! request. Handlers never see raw claims, only the resolved principal,
//! so a revoked flag is gone on the very next call.

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use crate::AppState;
use notara_core::permission::Principal;
use notara_db::{GroupRepository, UserRepository};
use notara_shared::auth::Claims;
use notara_shared::types::UserId;

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Authentication middleware that validates JWT tokens and resolves the
/// acting principal.
///
/// This middleware:
/// 1. Extracts the Bearer token from the Authorization header
/// 2. Validates the token using the JWT service
/// 3. Resolves the principal (enterprise owner or staff user + group set)
/// 4. Stores the principal in request extensions for handlers to access
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "missing_token",
                "message": "Authorization header with Bearer token is required"
            })),
        )
            .into_response();
    };

    let claims = match state.jwt_service.validate_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            let (error, message) = match e {
                notara_shared::jwt::JwtError::Expired => ("token_expired", "Token has expired"),
                _ => ("invalid_token", "Invalid or malformed token"),
            };
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": error, "message": message })),
            )
                .into_response();
        }
    };

    match resolve_principal(&state, &claims).await {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(response) => response,
    }
}

/// Resolves the claims into a principal, loading the user row and group
/// permissions for staff tokens.
async fn resolve_principal(state: &AppState, claims: &Claims) -> Result<Principal, Response> {
    let Some(user_id) = claims.user_id() else {
        return Ok(Principal::for_enterprise(claims.enterprise_id()));
    };

    let user = load_user(state, user_id).await?;

    // A token minted for one enterprise must not work after the user moved.
    if user.enterprise_id != claims.enterprise_id().into_inner() {
        return Err(unknown_principal());
    }

    if !user.active {
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "account_disabled",
                "message": "This account has been deactivated"
            })),
        )
            .into_response());
    }

    let group_repo = GroupRepository::new((*state.db).clone());
    match group_repo.permission_set_for_user(&user).await {
        Ok(permissions) => Ok(Principal::for_user(
            user_id,
            claims.enterprise_id(),
            permissions,
        )),
        Err(e) => {
            error!(user_id = %user_id, error = %e, "Failed to resolve permissions");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "permission_resolution_failed",
                    "message": "An error occurred"
                })),
            )
                .into_response())
        }
    }
}

async fn load_user(
    state: &AppState,
    user_id: UserId,
) -> Result<notara_db::entities::users::Model, Response> {
    let user_repo = UserRepository::new((*state.db).clone());
    match user_repo.find_by_id(user_id).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(unknown_principal()),
        Err(e) => {
            error!(user_id = %user_id, error = %e, "Failed to load user");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred"
                })),
            )
                .into_response())
        }
    }
}

fn unknown_principal() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "unknown_principal",
            "message": "Token does not match a known account"
        })),
    )
        .into_response()
}

/// Extractor for the authenticated principal.
///
/// Use this in handlers to get the resolved principal:
///
/// ```ignore
/// async fn handler(auth: AuthPrincipal) -> impl IntoResponse {
///     let enterprise_id = auth.enterprise_id();
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthPrincipal(pub Principal);

impl AuthPrincipal {
    /// Returns the tenant the principal acts within.
    #[must_use]
    pub const fn enterprise_id(&self) -> notara_shared::types::EnterpriseId {
        self.0.enterprise_id()
    }

    /// Returns the inner principal.
    #[must_use]
    pub const fn principal(&self) -> &Principal {
        &self.0
    }
}

impl<S> FromRequestParts<S> for AuthPrincipal
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(AuthPrincipal)
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({
                        "error": "unauthorized",
                        "message": "Authentication required"
                    })),
                )
            })
    }
}
