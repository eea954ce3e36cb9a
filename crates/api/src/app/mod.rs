//! HTTP application wiring (Axum router + shared state).
//!
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Router, routing::get};

use fundcrm_access::{AccessScopeResolver, RelationshipLookup};

use crate::middleware::{self, Authenticator};

pub mod errors;
pub mod routes;

pub type SharedLookup = Arc<dyn RelationshipLookup>;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<AccessScopeResolver<SharedLookup>>,
}

impl AppState {
    pub fn new(lookup: SharedLookup) -> Self {
        Self {
            resolver: Arc::new(AccessScopeResolver::new(lookup)),
        }
    }
}

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(authenticator: Arc<dyn Authenticator>, lookup: SharedLookup) -> Router {
    let auth_state = middleware::AuthState { authenticator };
    let state = AppState::new(lookup);

    // Protected routes: require an authenticated request context.
    let protected = routes::router(state).layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
}
