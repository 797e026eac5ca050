//! Caller identity.
//!
//! Authentication happens upstream; the authenticated user's id arrives in
//! the [`USER_ID_HEADER`] header and the role is looked up in the `users`
//! table on every request.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::debug;
use warden_core::UserRole;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the authenticated user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// An authenticated forum user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i64,
    pub role: UserRole,
}

impl Caller {
    /// Fails with [`ApiError::Forbidden`] unless the caller is a moderator
    /// or admin.
    pub fn require_moderator(&self) -> Result<(), ApiError> {
        if self.role.can_moderate() {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok())
            .ok_or(ApiError::Unauthenticated)?;

        let user = state.db.get_user(user_id)?.ok_or_else(|| {
            debug!(user_id, "Unknown caller");
            ApiError::Unauthenticated
        })?;

        Ok(Caller {
            user_id: user.id,
            role: user.role,
        })
    }
}

/// A caller with moderator or admin role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Moderator(pub Caller);

impl FromRequestParts<AppState> for Moderator {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let caller = Caller::from_request_parts(parts, state).await?;
        caller.require_moderator()?;
        Ok(Moderator(caller))
    }
}
