//! Scope introspection: what the caller can see, and whether a given target
//! is inside it.

use std::collections::BTreeMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use fundcrm_access::{AccessFilter, EntityKind, RequestContext, parse_requested};

use crate::app::AppState;
use crate::app::errors::ApiResult;

/// GET /scope - resolved scope for every entity kind
pub async fn my_scope(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> ApiResult<impl IntoResponse> {
    let mut scopes: BTreeMap<EntityKind, AccessFilter> = BTreeMap::new();
    for kind in EntityKind::ALL {
        scopes.insert(kind, state.resolver.accessible_ids(&ctx, kind).await?);
    }

    Ok(Json(serde_json::json!({
        "portal": ctx.portal,
        "scopes": scopes,
    })))
}

/// GET /scope/:kind/:id - 200 with the enforced constraint, 403 when out of scope
pub async fn check_target(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let kind: EntityKind = kind.parse()?;
    let requested = parse_requested(Some(id.as_str()))?;
    let scoped = state.resolver.build_filter(&ctx, kind, requested).await?;

    Ok(Json(serde_json::json!({
        "kind": kind,
        "scope": scoped,
    })))
}
