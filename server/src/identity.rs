//! Caller identity extractor.
//!
//! Authentication happens upstream; the gateway injects the verified
//! identity as headers. This extractor turns them into explicit values
//! threaded into every engine call, so nothing below the handlers reaches
//! into ambient request state.

use crate::error::ApiError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use parkline_core::state::{Role, UserId};

/// Verified caller identity, read from gateway-injected headers.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    /// The authenticated user.
    pub user_id: UserId,
    /// The authenticated role.
    pub role: Role,
}

impl Identity {
    /// Require the admin role.
    ///
    /// # Errors
    ///
    /// Returns a 403 error for non-admin callers.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::forbidden("administrator role required"))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| uuid::Uuid::parse_str(s).ok())
            .map(UserId)
            .ok_or_else(|| ApiError::unauthorized("missing or invalid x-user-id header"))?;

        let role = match parts.headers.get("x-user-role").and_then(|v| v.to_str().ok()) {
            Some("ADMIN") => Role::Admin,
            Some("USER") | None => Role::User,
            Some(_) => return Err(ApiError::unauthorized("invalid x-user-role header")),
        };

        Ok(Self { user_id, role })
    }
}
