// crates/backend-lib/src/middleware/rate_limit.rs

//! Per-client fixed-window rate limiting for the auth endpoints.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use metrics::counter;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::AppError;
use crate::store::Store;
use crate::AppState;

/// Rate limit entry for a client
#[derive(Debug)]
struct RateLimitEntry {
    requests: u32,
    window_start: Instant,
}

/// Fixed-window request counter keyed by client
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    entries: DashMap<String, RateLimitEntry>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            entries: DashMap::new(),
        }
    }

    /// Count one request for `client_key`, rejecting once the window
    /// budget is spent
    pub fn check(&self, client_key: &str) -> Result<(), AppError> {
        let mut entry = self
            .entries
            .entry(client_key.to_string())
            .or_insert_with(|| RateLimitEntry {
                requests: 0,
                window_start: Instant::now(),
            });

        if entry.window_start.elapsed() > self.window {
            entry.requests = 0;
            entry.window_start = Instant::now();
        }

        if entry.requests >= self.max_requests {
            counter!(crate::metrics::AUTH_RATE_LIMITED).increment(1);
            return Err(AppError::RateLimitExceeded);
        }

        entry.requests += 1;
        Ok(())
    }
}

/// Rate limiter middleware
pub async fn rate_limit<S>(
    State(state): State<Arc<AppState<S>>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError>
where
    S: Store + Clone + Send + Sync + 'static,
{
    let client_ip = request
        .headers()
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("unknown");

    state.rate_limiter.check(client_ip)?;

    Ok(next.run(request).await)
}
