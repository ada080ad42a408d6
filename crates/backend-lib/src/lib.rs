// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core backend-lib functionality for the `EventHub` API server.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod model;
pub mod policy;
pub mod roster;
pub mod router;
pub mod store;
pub mod validation;

use std::sync::Arc;
use std::time::Duration;

use crate::auth::SessionManager;
use crate::config::Settings;
use crate::middleware::rate_limit::RateLimiter;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState<S> {
    /// Storage backend
    pub store: S,
    /// Session manager issuing and validating token pairs
    pub sessions: Arc<SessionManager>,
    /// Settings manager
    pub settings: Arc<Settings>,
    /// Rate limiter for the auth endpoints
    pub rate_limiter: Arc<RateLimiter>,
}

impl<S> AppState<S> {
    /// Create a new application state
    pub fn new(store: S, settings: Settings) -> Self {
        let sessions = Arc::new(SessionManager::new(
            Duration::from_secs(settings.session.access_ttl_secs),
            Duration::from_secs(settings.session.refresh_ttl_secs),
        ));
        let rate_limiter = Arc::new(RateLimiter::new(
            Duration::from_secs(settings.rate_limit.window_secs),
            settings.rate_limit.max_requests,
        ));

        Self {
            store,
            sessions,
            settings: Arc::new(settings),
            rate_limiter,
        }
    }
}
