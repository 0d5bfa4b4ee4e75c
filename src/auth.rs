use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::AppConfig, error::ApiError, models::Role};

/// Tokens are valid for 24 hours from issue.
pub const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Claims
///
/// Payload of every bearer token. It is self-contained: verifying a request
/// never touches the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Id of the user the token was issued to.
    pub uid: i64,
    /// Numeric role at issue time (see `Role`).
    pub role: i16,
    /// Issued At, epoch seconds.
    pub iat: i64,
    /// Expiration, epoch seconds. Enforced by `decode_token`.
    pub exp: i64,
}

/// A freshly signed token and its expiry.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
}

/// issue_token
///
/// Signs an HS256 token for `uid`/`role` valid for `TOKEN_TTL_SECS`.
pub fn issue_token(uid: i64, role: Role, secret: &str) -> Result<IssuedToken, ApiError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        uid,
        role: role.into(),
        iat: now,
        exp: now + TOKEN_TTL_SECS,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(IssuedToken {
        token,
        expires_at: claims.exp,
    })
}

/// decode_token
///
/// Verifies signature and expiry. Any failure (bad signature, malformed,
/// expired) is an `ApiError::Unauthorized`.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(error = %e, "rejected bearer token");
        ApiError::Unauthorized
    })
}

/// AuthUser
///
/// The resolved identity of an authenticated request. Taking it as a handler
/// argument makes the route require a valid bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub role: i16,
}

impl AuthUser {
    /// Numeric privilege comparison: passes for `required` and anything above it.
    pub fn has_role(&self, required: Role) -> bool {
        self.role >= i16::from(required)
    }
}

/// AuthUser Extractor Implementation
///
/// 1. No `Authorization: Bearer <token>` header → `Unauthenticated` (401, empty body).
/// 2. Token present but invalid or expired → `Unauthorized` (401, error body).
/// 3. Otherwise the claims become the `AuthUser`.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    // Allows the extractor to pull the token secret from the app state.
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::Unauthenticated)?;

        let claims = decode_token(token, &config.token_secret)?;

        Ok(AuthUser {
            id: claims.uid,
            role: claims.role,
        })
    }
}

/// AdminUser
///
/// An `AuthUser` whose role is at least `Role::Admin`. Authentication runs
/// first, so an anonymous caller still gets a 401 rather than a 403.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub AuthUser);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.has_role(Role::Admin) {
            tracing::warn!(user_id = user.id, role = user.role, "admin route refused");
            return Err(ApiError::Forbidden);
        }
        Ok(AdminUser(user))
    }
}
