// ============================
// crates/backend-lib/src/roster.rs
// ============================
//! Roster guards for event registration.
//!
//! These are the pure decision rules; the store applies them together
//! with the roster mutation inside a single write-lock critical section
//! so the capacity check and the insert form one atomic unit.

use crate::error::AppError;
use crate::model::Event;
use chrono::{DateTime, Utc};

/// Guard for adding an identity to the roster.
///
/// Fails once the event has started, or when the roster is at capacity.
/// Re-adding an existing member passes the guards and is a no-op at the
/// roster itself (idempotent success).
pub fn check_register(event: &Event, now: DateTime<Utc>) -> Result<(), AppError> {
    if event.start_date < now {
        return Err(AppError::EventInPast);
    }
    if event.is_full() {
        return Err(AppError::CapacityReached);
    }
    Ok(())
}

/// Guard for removing an identity from the roster.
///
/// Fails once the event has started; removing a non-member is a no-op.
pub fn check_unregister(event: &Event, now: DateTime<Utc>) -> Result<(), AppError> {
    if event.start_date < now {
        return Err(AppError::EventInPast);
    }
    Ok(())
}
