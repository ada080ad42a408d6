// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for Prometheus metric keys
pub const USER_REGISTERED: &str = "user.registered";
pub const USER_LOGIN: &str = "user.login";
pub const EVENT_CREATED: &str = "event.created";
pub const EVENT_UPDATED: &str = "event.updated";
pub const EVENT_DELETED: &str = "event.deleted";
pub const RSVP_REGISTERED: &str = "event.rsvp.registered";
pub const RSVP_UNREGISTERED: &str = "event.rsvp.unregistered";
pub const AUTH_RATE_LIMITED: &str = "auth.rate_limited";
