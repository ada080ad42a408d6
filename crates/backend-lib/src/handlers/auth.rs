// ============================
// crates/backend-lib/src/handlers/auth.rs
// ============================
//! Registration, login and token refresh.
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use eventhub_common::{
    LoginRequest, LoginResponse, RefreshRequest, RegisterRequest, RegisterResponse, TokenPair,
    UserSummary,
};
use metrics::counter;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{hash_password_secure, verify_password};
use crate::error::AppError;
use crate::model::User;
use crate::store::Store;
use crate::validation;
use crate::AppState;

/// `POST /api/register`
pub async fn register<S>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError>
where
    S: Store + Clone + Send + Sync + 'static,
{
    let email_taken = state.store.email_taken(&req.email).await;
    let username_taken = state.store.username_taken(&req.username).await;
    validation::validate_registration(&req, email_taken, username_taken)?;

    // the plaintext is zeroized as soon as the hash exists
    let mut plain = req.password;
    let password_hash =
        hash_password_secure(&mut plain).map_err(|e| AppError::Internal(e.to_string()))?;

    let user = state
        .store
        .create_user(User {
            id: Uuid::new_v4(),
            username: req.username,
            email: req.email,
            password_hash,
            first_name: req.first_name,
            last_name: req.last_name,
            date_joined: Utc::now(),
        })
        .await?;

    counter!(crate::metrics::USER_REGISTERED).increment(1);
    tracing::info!(username = %user.username, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: UserSummary {
                username: user.username,
                email: user.email,
                first_name: user.first_name,
                last_name: user.last_name,
            },
            message: "User registered successfully".to_string(),
        }),
    ))
}

/// `POST /api/login`
pub async fn login<S>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError>
where
    S: Store + Clone + Send + Sync + 'static,
{
    let user = state
        .store
        .user_by_username(&req.username)
        .await
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&user.password_hash, &req.password) {
        return Err(AppError::InvalidCredentials);
    }

    let pair = state.sessions.issue_pair(user.id).await;
    counter!(crate::metrics::USER_LOGIN).increment(1);
    tracing::debug!(username = %user.username, "login succeeded");

    Ok(Json(LoginResponse {
        access: pair.access,
        refresh: pair.refresh,
        message: "Login successful.".to_string(),
    }))
}

/// `POST /api/token/refresh`
pub async fn refresh<S>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, AppError>
where
    S: Store + Clone + Send + Sync + 'static,
{
    let pair = state
        .sessions
        .refresh(&req.refresh)
        .await
        .ok_or(AppError::InvalidToken)?;
    Ok(Json(pair))
}
