//! Route-level permission gate.
//!
//! Runs after authentication and before any handler. A failed check
//! short-circuits with 403 and the error envelope; the handler never runs.

use std::sync::Arc;

use axum::{extract::State, middleware::Next, response::Response};
use tracing::warn;

use fundcrm_access::RequestContext;
use fundcrm_auth::{Permission, PermissionCheck, check_permissions, missing_permissions};
use fundcrm_core::CoreError;

use crate::app::errors::core_error_to_response;

/// Permissions a route requires.
#[derive(Debug, Clone)]
pub struct PermissionGate {
    required: Arc<[Permission]>,
    require_all: bool,
}

impl PermissionGate {
    /// Every listed permission must be held.
    pub fn all(required: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            required: required.into_iter().collect(),
            require_all: true,
        }
    }

    /// At least one listed permission must be held.
    pub fn any(required: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            required: required.into_iter().collect(),
            require_all: false,
        }
    }

    /// Evaluate the gate for `ctx`.
    pub fn evaluate(&self, ctx: &RequestContext) -> Result<(), CoreError> {
        let check = check_permissions(ctx.role(), &ctx.principal, &self.required, self.require_all);
        let passed = match &check {
            PermissionCheck::All(granted) => *granted,
            PermissionCheck::Each(map) => map.is_empty() || map.values().any(|held| *held),
        };
        if passed {
            return Ok(());
        }

        let missing = missing_permissions(ctx.role(), &ctx.principal, &self.required);
        let listed = missing.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
        warn!(
            user_id = %ctx.principal.user_id,
            role = ctx.role(),
            portal = %ctx.portal,
            missing = %listed,
            "permission denied"
        );
        Err(CoreError::authorization(format!("missing permission: {listed}")))
    }
}

/// Middleware form of [`PermissionGate::evaluate`].
pub async fn permission_gate(
    State(gate): State<PermissionGate>,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let Some(ctx) = req.extensions().get::<RequestContext>() else {
        return core_error_to_response(CoreError::authorization("request is not authenticated"));
    };

    match gate.evaluate(ctx) {
        Ok(()) => next.run(req).await,
        Err(e) => core_error_to_response(e),
    }
}
