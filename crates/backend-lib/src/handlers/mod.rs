// crates/backend-lib/src/handlers/mod.rs

//! HTTP handlers for the `EventHub` API.

pub mod auth;
pub mod events;
