// ============================
// crates/backend-lib/src/store.rs
// ============================
//! Storage abstraction with an in-memory implementation.
//!
//! The store is the transaction boundary: every mutation runs under one
//! write lock, so uniqueness checks and the roster capacity check are
//! atomic with the write they guard. A relational backend can replace
//! [`MemoryStore`] behind the same trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppError;
use crate::model::{Event, User};
use crate::roster;
use crate::validation::{
    codes, EventDraft, FieldError, ValidationErrors, ERROR_EMAIL_EXISTS, ERROR_USERNAME_EXISTS,
};

/// Trait for storage backends
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a new user, enforcing username/email uniqueness
    async fn create_user(&self, user: User) -> Result<User, AppError>;

    async fn user_by_id(&self, id: Uuid) -> Option<User>;

    async fn user_by_username(&self, username: &str) -> Option<User>;

    async fn email_taken(&self, email: &str) -> bool;

    async fn username_taken(&self, username: &str) -> bool;

    /// Insert a new event record
    async fn insert_event(&self, event: Event) -> Result<Event, AppError>;

    /// Fetch a single event by id
    async fn event(&self, id: Uuid) -> Result<Event, AppError>;

    /// All events that have not started yet, ordered by start date
    async fn events_from(&self, now: DateTime<Utc>) -> Vec<Event>;

    /// Apply a validated draft to an event. `replace` clears fields the
    /// draft leaves unset (PUT semantics); otherwise only provided
    /// fields change (PATCH semantics).
    async fn update_event(
        &self,
        id: Uuid,
        draft: EventDraft,
        replace: bool,
        now: DateTime<Utc>,
    ) -> Result<Event, AppError>;

    /// Delete an event and its roster
    async fn delete_event(&self, id: Uuid) -> Result<(), AppError>;

    /// Add `user_id` to the roster. Guard checks and the insert run in
    /// one atomic unit against the event row.
    async fn register_attendee(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Event, AppError>;

    /// Remove `user_id` from the roster under the same guard rules
    async fn unregister_attendee(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Event, AppError>;

    /// Resolve a set of user ids to usernames, sorted for stable output
    async fn usernames(&self, ids: &HashSet<Uuid>) -> Vec<String>;
}

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    events: HashMap<Uuid, Event>,
}

/// In-memory implementation of the [`Store`] trait
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: User) -> Result<User, AppError> {
        let mut inner = self.inner.write().await;

        // re-check uniqueness under the write lock
        let mut errors = ValidationErrors::new();
        if inner.users.values().any(|u| u.email == user.email) {
            errors.push(FieldError::new(
                "email",
                codes::EMAIL_EXISTS,
                ERROR_EMAIL_EXISTS,
            ));
        }
        if inner.users.values().any(|u| u.username == user.username) {
            errors.push(FieldError::new(
                "username",
                codes::USERNAME_EXISTS,
                ERROR_USERNAME_EXISTS,
            ));
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user_by_id(&self, id: Uuid) -> Option<User> {
        let inner = self.inner.read().await;
        inner.users.get(&id).cloned()
    }

    async fn user_by_username(&self, username: &str) -> Option<User> {
        let inner = self.inner.read().await;
        inner.users.values().find(|u| u.username == username).cloned()
    }

    async fn email_taken(&self, email: &str) -> bool {
        let inner = self.inner.read().await;
        inner.users.values().any(|u| u.email == email)
    }

    async fn username_taken(&self, username: &str) -> bool {
        let inner = self.inner.read().await;
        inner.users.values().any(|u| u.username == username)
    }

    async fn insert_event(&self, event: Event) -> Result<Event, AppError> {
        let mut inner = self.inner.write().await;
        inner.events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn event(&self, id: Uuid) -> Result<Event, AppError> {
        let inner = self.inner.read().await;
        inner
            .events
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("event {id}")))
    }

    async fn events_from(&self, now: DateTime<Utc>) -> Vec<Event> {
        let inner = self.inner.read().await;
        let mut events: Vec<Event> = inner
            .events
            .values()
            .filter(|e| e.start_date >= now)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.start_date);
        events
    }

    async fn update_event(
        &self,
        id: Uuid,
        draft: EventDraft,
        replace: bool,
        now: DateTime<Utc>,
    ) -> Result<Event, AppError> {
        let mut inner = self.inner.write().await;
        let event = inner
            .events
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("event {id}")))?;

        if let Some(name) = draft.name {
            event.name = name;
        }
        if let Some(description) = draft.description {
            event.description = description;
        }
        if let Some(start_date) = draft.start_date {
            event.start_date = start_date;
        }
        if let Some(end_date) = draft.end_date {
            event.end_date = end_date;
        }
        if replace || draft.capacity.is_some() {
            event.capacity = draft.capacity;
        }
        event.updated_date = now;

        Ok(event.clone())
    }

    async fn delete_event(&self, id: Uuid) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        inner
            .events
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("event {id}")))
    }

    async fn register_attendee(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Event, AppError> {
        let mut inner = self.inner.write().await;
        let event = inner
            .events
            .get_mut(&event_id)
            .ok_or_else(|| AppError::NotFound(format!("event {event_id}")))?;

        roster::check_register(event, now)?;
        event.attendees.insert(user_id);
        Ok(event.clone())
    }

    async fn unregister_attendee(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Event, AppError> {
        let mut inner = self.inner.write().await;
        let event = inner
            .events
            .get_mut(&event_id)
            .ok_or_else(|| AppError::NotFound(format!("event {event_id}")))?;

        roster::check_unregister(event, now)?;
        event.attendees.remove(&user_id);
        Ok(event.clone())
    }

    async fn usernames(&self, ids: &HashSet<Uuid>) -> Vec<String> {
        let inner = self.inner.read().await;
        let mut names: Vec<String> = ids
            .iter()
            .filter_map(|id| inner.users.get(id).map(|u| u.username.clone()))
            .collect();
        names.sort();
        names
    }
}
