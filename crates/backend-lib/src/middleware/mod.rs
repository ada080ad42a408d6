// crates/backend-lib/src/middleware/mod.rs

//! Middleware for the `EventHub` API server.

pub mod rate_limit;

pub use rate_limit::{rate_limit, RateLimiter};

use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use std::sync::Arc;

use crate::error::AppError;
use crate::model::User;
use crate::store::Store;
use crate::AppState;

/// The authenticated user behind a bearer access token.
///
/// Extraction fails with 401 when the header is missing, the token is
/// unknown or expired, or the user no longer exists.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<Arc<AppState<S>>> for CurrentUser
where
    S: Store + Clone + Send + Sync + 'static,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AppError::InvalidToken)?;
        let token = header.strip_prefix("Bearer ").ok_or(AppError::InvalidToken)?;

        let session = state
            .sessions
            .authenticate(token)
            .await
            .ok_or(AppError::InvalidToken)?;
        let user = state
            .store
            .user_by_id(session.user_id)
            .await
            .ok_or(AppError::InvalidToken)?;

        Ok(CurrentUser(user))
    }
}
