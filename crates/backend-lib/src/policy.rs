// ============================
// crates/backend-lib/src/policy.rs
// ============================
//! Ownership-based access policy for event mutation.

use crate::model::Event;
use uuid::Uuid;

/// Whether `user_id` may modify `event`. Only the creator holds mutation
/// rights; reads are open to any authenticated user.
pub fn can_modify(user_id: Uuid, event: &Event) -> bool {
    user_id == event.created_by
}
