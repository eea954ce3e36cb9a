use std::collections::BTreeSet;

use axum::{Extension, Json, http::StatusCode, response::IntoResponse};

use fundcrm_access::RequestContext;
use fundcrm_auth::effective_permissions;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// GET /whoami - the authenticated caller and its effective permissions
pub async fn whoami(Extension(ctx): Extension<RequestContext>) -> impl IntoResponse {
    let permissions: BTreeSet<String> = effective_permissions(ctx.role(), &ctx.principal)
        .iter()
        .map(ToString::to_string)
        .collect();

    Json(serde_json::json!({
        "user_id": ctx.principal.user_id.to_string(),
        "role": ctx.role(),
        "portal": ctx.portal,
        "permissions": permissions,
    }))
}
