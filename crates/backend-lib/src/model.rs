// ============================
// crates/backend-lib/src/model.rs
// ============================
//! Domain records held by the store.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

/// A registered user. The password is only ever held in hashed form.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub date_joined: DateTime<Utc>,
}

/// An event with its attendee roster.
///
/// `created_by` is immutable after creation and carries exclusive
/// mutation rights; the roster is open to any authenticated user via
/// register/unregister.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Upper bound on roster size; `None` means unlimited
    pub capacity: Option<u32>,
    pub created_by: Uuid,
    pub attendees: HashSet<Uuid>,
    pub published_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

impl Event {
    /// Whether the roster has reached the configured capacity
    pub fn is_full(&self) -> bool {
        match self.capacity {
            Some(cap) => self.attendees.len() as u64 >= u64::from(cap),
            None => false,
        }
    }
}
