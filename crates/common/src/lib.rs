// ================
// crates/common/src/lib.rs
// ================
//! Common types and structures
//! shared between the `EventHub` API server and its clients.
//! This module defines the request and response bodies of the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registration request body for `POST /api/register`
/// # Fields
/// * `password2` - confirmation copy of `password`; must match exactly
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub password2: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Public view of a user, safe to return to clients
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserSummary {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Response body for a successful registration
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegisterResponse {
    pub user: UserSummary,
    pub message: String,
}

/// Login request body for `POST /api/login`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Opaque access/refresh token pair issued on login and refresh
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Response body for a successful login
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub message: String,
}

/// Request body for `POST /api/token/refresh`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Event create/update payload.
///
/// Every field is optional at the wire level; the validator decides which
/// fields a given operation requires. Dates arrive as RFC 3339 strings and
/// capacity as a signed integer so that out-of-range values reach the
/// validator instead of failing deserialization.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct EventPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i64>,
}

/// Full event record as returned by the API.
///
/// `created_by` and `attendees` are usernames, not internal ids.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EventResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub capacity: Option<u32>,
    pub created_by: String,
    pub attendees: Vec<String>,
    pub published_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

/// Simple status body for roster operations
/// (`{"status": "Registered"}` / `{"status": "Unregistered"}`)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StatusResponse {
    pub status: String,
}
