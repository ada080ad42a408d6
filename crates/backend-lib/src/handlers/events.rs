// ============================
// crates/backend-lib/src/handlers/events.rs
// ============================
//! Event CRUD and roster (register/unregister) handlers.
//!
//! Every time-dependent rule receives the instant captured at handler
//! entry, so one request evaluates against one clock reading.
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use eventhub_common::{EventPayload, EventResponse, StatusResponse};
use metrics::counter;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::model::Event;
use crate::policy;
use crate::store::Store;
use crate::validation;
use crate::AppState;

const ERROR_NOT_OWNER: &str = "You do not have permission to modify this event";

async fn to_response<S: Store>(store: &S, event: &Event) -> EventResponse {
    let created_by = store
        .user_by_id(event.created_by)
        .await
        .map(|u| u.username)
        .unwrap_or_default();
    let attendees = store.usernames(&event.attendees).await;

    EventResponse {
        id: event.id,
        name: event.name.clone(),
        description: event.description.clone(),
        start_date: event.start_date,
        end_date: event.end_date,
        capacity: event.capacity,
        created_by,
        attendees,
        published_date: event.published_date,
        updated_date: event.updated_date,
    }
}

/// `GET /api/events/` — upcoming events only
pub async fn list_events<S>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<Vec<EventResponse>>, AppError>
where
    S: Store + Clone + Send + Sync + 'static,
{
    let now = Utc::now();
    let events = state.store.events_from(now).await;

    let mut body = Vec::with_capacity(events.len());
    for event in &events {
        body.push(to_response(&state.store, event).await);
    }
    Ok(Json(body))
}

/// `POST /api/events/`
pub async fn create_event<S>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<EventPayload>,
) -> Result<impl IntoResponse, AppError>
where
    S: Store + Clone + Send + Sync + 'static,
{
    let now = Utc::now();
    let draft = validation::validate_event(&payload, now, true)?;

    let (Some(name), Some(description), Some(start_date), Some(end_date)) = (
        draft.name,
        draft.description,
        draft.start_date,
        draft.end_date,
    ) else {
        return Err(AppError::Internal(
            "validated draft missing required fields".to_string(),
        ));
    };

    let event = state
        .store
        .insert_event(Event {
            id: Uuid::new_v4(),
            name,
            description,
            start_date,
            end_date,
            capacity: draft.capacity,
            created_by: user.id,
            attendees: HashSet::new(),
            published_date: now,
            updated_date: now,
        })
        .await?;

    counter!(crate::metrics::EVENT_CREATED).increment(1);
    tracing::info!(event = %event.id, creator = %user.username, "event created");

    let body = to_response(&state.store, &event).await;
    Ok((StatusCode::CREATED, Json(body)))
}

/// `GET /api/events/{id}/`
pub async fn event_detail<S>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<EventResponse>, AppError>
where
    S: Store + Clone + Send + Sync + 'static,
{
    let event = state.store.event(id).await?;
    Ok(Json(to_response(&state.store, &event).await))
}

async fn apply_update<S>(
    state: &AppState<S>,
    user_id: Uuid,
    id: Uuid,
    payload: &EventPayload,
    replace: bool,
) -> Result<EventResponse, AppError>
where
    S: Store + Clone + Send + Sync + 'static,
{
    let now = Utc::now();
    let event = state.store.event(id).await?;
    if !policy::can_modify(user_id, &event) {
        return Err(AppError::Forbidden(ERROR_NOT_OWNER.to_string()));
    }

    let draft = validation::validate_event(payload, now, replace)?;
    let updated = state.store.update_event(id, draft, replace, now).await?;

    counter!(crate::metrics::EVENT_UPDATED).increment(1);
    Ok(to_response(&state.store, &updated).await)
}

/// `PUT /api/events/{id}/` — full update, owner only
pub async fn update_event<S>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<EventPayload>,
) -> Result<Json<EventResponse>, AppError>
where
    S: Store + Clone + Send + Sync + 'static,
{
    let body = apply_update(&state, user.id, id, &payload, true).await?;
    Ok(Json(body))
}

/// `PATCH /api/events/{id}/` — partial update, owner only
pub async fn patch_event<S>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<EventPayload>,
) -> Result<Json<EventResponse>, AppError>
where
    S: Store + Clone + Send + Sync + 'static,
{
    let body = apply_update(&state, user.id, id, &payload, false).await?;
    Ok(Json(body))
}

/// `DELETE /api/events/{id}/` — owner only
pub async fn delete_event<S>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError>
where
    S: Store + Clone + Send + Sync + 'static,
{
    let event = state.store.event(id).await?;
    if !policy::can_modify(user.id, &event) {
        return Err(AppError::Forbidden(ERROR_NOT_OWNER.to_string()));
    }

    state.store.delete_event(id).await?;
    counter!(crate::metrics::EVENT_DELETED).increment(1);
    tracing::info!(event = %id, "event deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/events/{id}/register/`
pub async fn register_for_event<S>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusResponse>, AppError>
where
    S: Store + Clone + Send + Sync + 'static,
{
    let now = Utc::now();
    state.store.register_attendee(id, user.id, now).await?;

    counter!(crate::metrics::RSVP_REGISTERED).increment(1);
    Ok(Json(StatusResponse {
        status: "Registered".to_string(),
    }))
}

/// `POST /api/events/{id}/unregister/`
pub async fn unregister_from_event<S>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusResponse>, AppError>
where
    S: Store + Clone + Send + Sync + 'static,
{
    let now = Utc::now();
    state.store.unregister_attendee(id, user.id, now).await?;

    counter!(crate::metrics::RSVP_UNREGISTERED).increment(1);
    Ok(Json(StatusResponse {
        status: "Unregistered".to_string(),
    }))
}
