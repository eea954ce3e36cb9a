//! RBAC audit endpoints.
//!
//! Visibility into roles, the permission table, and what the caller can do,
//! to help answer "why was this request denied?".

use axum::{
    Extension, Json, Router,
    extract::Query,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;

use fundcrm_access::RequestContext;
use fundcrm_auth::{Action, Permission, Resource, check_permissions, parse_permissions, registry};

use crate::app::AppState;
use crate::app::errors::ApiResult;
use crate::authz::{PermissionGate, permission_gate};

const ROLE_READ: Permission = Permission::new(Resource::Role, Action::Read);

#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    /// Comma-separated `resource:action` list.
    pub permissions: String,
    #[serde(default)]
    pub require_all: bool,
}

pub fn router() -> Router<AppState> {
    let audit = Router::new()
        .route("/roles", get(list_roles))
        .route("/permissions", get(list_permissions))
        .route_layer(from_fn_with_state(PermissionGate::all([ROLE_READ]), permission_gate));

    Router::new().route("/check", get(check)).merge(audit)
}

/// GET /rbac/roles - every role with its sorted permission list
pub async fn list_roles() -> impl IntoResponse {
    Json(serde_json::json!({ "roles": registry().role_definitions() }))
}

/// GET /rbac/permissions - the full permission table
pub async fn list_permissions() -> impl IntoResponse {
    Json(serde_json::json!({ "permissions": registry().permission_definitions() }))
}

/// GET /rbac/check?permissions=a,b[&require_all=true] - evaluate for the caller
pub async fn check(
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<CheckQuery>,
) -> ApiResult<impl IntoResponse> {
    let required = parse_permissions(query.permissions.split(','))?;
    let result = check_permissions(ctx.role(), &ctx.principal, &required, query.require_all);

    Ok(Json(serde_json::json!({
        "role": ctx.role(),
        "require_all": query.require_all,
        "result": result,
    })))
}
