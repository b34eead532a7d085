//! JWT authentication and the tenant-scoped principal.
//!
//! Session issuance lives with the external identity provider; this module
//! only validates bearer tokens and exposes the authenticated principal
//! (`business_id`, role, super-admin flag) to handlers. Handlers pass
//! `business_id` explicitly into services so the core logic never reads
//! ambient request state.

use axum::{extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{errors::ServiceError, AppState};

/// Role names carried in tokens.
pub mod roles {
    pub const OWNER: &str = "owner";
    pub const MANAGER: &str = "manager";
    pub const STAFF: &str = "staff";
    pub const DRIVER: &str = "driver";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Tenant scope; absent only for super-admin tokens
    pub business_id: Option<Uuid>,
    pub role: String,
    #[serde(default)]
    pub is_super_admin: bool,
    pub exp: i64,
    pub iat: i64,
}

/// The authenticated principal attached to each request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub business_id: Option<Uuid>,
    pub role: String,
    pub is_super_admin: bool,
}

impl AuthUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }

    pub fn can_manage(&self) -> bool {
        self.is_super_admin || self.has_role(roles::OWNER) || self.has_role(roles::MANAGER)
    }

    /// Resolves the caller's tenant, failing with 401 when the token carries
    /// no business scope. Super admins must name a business explicitly via
    /// the relevant admin endpoints instead.
    pub fn require_business(&self) -> Result<Uuid, ServiceError> {
        self.business_id.ok_or_else(|| {
            ServiceError::Unauthorized("Token does not carry a business scope".to_string())
        })
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            business_id: claims.business_id,
            role: claims.role,
            is_super_admin: claims.is_super_admin,
        }
    }
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, ServiceError> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| ServiceError::Unauthorized(format!("Invalid token: {}", e)))
}

#[cfg(any(test, feature = "test-tokens"))]
pub fn issue_token(claims: &Claims, secret: &str) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("token encoding cannot fail with HS256")
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                ServiceError::Unauthorized("Missing Authorization header".to_string())
            })?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            ServiceError::Unauthorized("Authorization header must be a Bearer token".to_string())
        })?;

        let claims = decode_token(token, &state.config.jwt_secret)?;
        Ok(AuthUser::from(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";

    fn claims(business_id: Option<Uuid>, super_admin: bool) -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            sub: "user-1".into(),
            business_id,
            role: roles::OWNER.into(),
            is_super_admin: super_admin,
            exp: now + 3600,
            iat: now,
        }
    }

    #[test]
    fn token_round_trip() {
        let business_id = Uuid::new_v4();
        let token = issue_token(&claims(Some(business_id), false), SECRET);
        let decoded = decode_token(&token, SECRET).unwrap();
        assert_eq!(decoded.business_id, Some(business_id));
        assert_eq!(decoded.role, roles::OWNER);
        assert!(!decoded.is_super_admin);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(&claims(None, true), SECRET);
        assert!(decode_token(&token, "another_secret_that_is_also_32_chars!").is_err());
    }

    #[test]
    fn require_business_fails_without_scope() {
        let user = AuthUser::from(claims(None, true));
        assert!(user.require_business().is_err());
    }
}
