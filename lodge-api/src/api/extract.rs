//! Caller extractors.
//!
//! Handlers state their authorization requirement through the extractor they
//! take: [`Caller`] for any valid token, [`AdminContext`] or [`MemberContext`]
//! for a specific role. Verification is pure signature + expiry checking
//! against the shared secret; no database access per request.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;
use lodge_common::auth::{self, AuthError, Claims, Role};

/// Any authenticated caller, role not yet narrowed.
#[derive(Debug, Clone)]
pub struct Caller(pub Claims);

/// A caller holding an admin token.
#[derive(Debug, Clone)]
pub struct AdminContext {
    /// Admin login email, from the token subject
    pub email: String,
}

/// A caller holding a member token.
#[derive(Debug, Clone)]
pub struct MemberContext {
    /// The authenticated member's guid, from the token subject
    pub member_id: Uuid,
}

fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::MissingToken)?;
    header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MalformedToken)
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = auth::verify_token(token, state.shared_secret)?;
        Ok(Caller(claims))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Caller(claims) = Caller::from_request_parts(parts, state).await?;
        if claims.role != Role::Admin {
            return Err(AuthError::Forbidden {
                required: Role::Admin,
            }
            .into());
        }
        Ok(AdminContext { email: claims.sub })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MemberContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Caller(claims) = Caller::from_request_parts(parts, state).await?;
        if claims.role != Role::Member {
            return Err(AuthError::Forbidden {
                required: Role::Member,
            }
            .into());
        }
        let member_id = claims.sub.parse().map_err(|_| {
            // A member token always carries the guid it was minted with, so
            // this only fires on a signed-but-corrupt subject.
            ApiError::Unauthorized("Token subject is not a member id".to_string())
        })?;
        Ok(MemberContext { member_id })
    }
}
