use axum::{Router, routing::get};

use crate::app::AppState;

pub mod rbac;
pub mod scope;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/scope", get(scope::my_scope))
        .route("/scope/:kind/:id", get(scope::check_target))
        .nest("/rbac", rbac::router())
        .with_state(state)
}
