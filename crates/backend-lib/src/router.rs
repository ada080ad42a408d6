// ============================
// crates/backend-lib/src/router.rs
// ============================
//! HTTP router wiring.
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{auth, events};
use crate::middleware::rate_limit;
use crate::store::Store;
use crate::AppState;

/// Create the API router.
///
/// Paths mirror the public API exactly, trailing slashes included. The
/// auth endpoints sit behind the per-client rate limiter; event routes
/// authenticate via the bearer-token extractor.
pub fn create_router<S>(state: Arc<AppState<S>>) -> Router
where
    S: Store + Clone + Send + Sync + 'static,
{
    let auth_routes = Router::new()
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/token/refresh", post(auth::refresh))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit::<S>));

    let event_routes = Router::new()
        .route(
            "/api/events/",
            get(events::list_events).post(events::create_event),
        )
        .route(
            "/api/events/{id}/",
            get(events::event_detail)
                .put(events::update_event)
                .patch(events::patch_event)
                .delete(events::delete_event),
        )
        .route(
            "/api/events/{id}/register/",
            post(events::register_for_event),
        )
        .route(
            "/api/events/{id}/unregister/",
            post(events::unregister_from_event),
        );

    auth_routes
        .merge(event_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
