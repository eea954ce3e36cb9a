//! Row-level scope resolution per portal type.

use serde::Serialize;
use tracing::{debug, instrument};

use fundcrm_core::{CoreResult, EntityId};

use crate::context::{EntityKind, RequestContext, ScopeIds};
use crate::lookup::{RelationshipLookup, relationship_defined};
use crate::scoped::{ScopedId, enforce_scope};

/// Result of scope resolution for one entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "ids", rename_all = "snake_case")]
pub enum AccessFilter {
    /// No filtering at all.
    Unrestricted,
    Single(EntityId),
    /// Concrete set; may be empty, in which case nothing is visible.
    Set(Vec<EntityId>),
}

impl AccessFilter {
    /// `None` for unrestricted, otherwise the visible ids.
    pub fn to_ids(&self) -> Option<Vec<EntityId>> {
        match self {
            AccessFilter::Unrestricted => None,
            AccessFilter::Single(id) => Some(vec![*id]),
            AccessFilter::Set(ids) => Some(ids.clone()),
        }
    }

    pub fn allows(&self, id: EntityId) -> bool {
        match self {
            AccessFilter::Unrestricted => true,
            AccessFilter::Single(own) => *own == id,
            AccessFilter::Set(ids) => ids.contains(&id),
        }
    }
}

/// Resolves which tenant-graph ids a request may see.
///
/// Stateless apart from the lookup collaborator; safe to share across requests.
#[derive(Debug, Clone)]
pub struct AccessScopeResolver<L> {
    lookup: L,
}

impl<L: RelationshipLookup> AccessScopeResolver<L> {
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    pub async fn accessible_funder_ids(&self, ctx: &RequestContext) -> CoreResult<AccessFilter> {
        self.accessible_ids(ctx, EntityKind::Funder).await
    }

    pub async fn accessible_merchant_ids(&self, ctx: &RequestContext) -> CoreResult<AccessFilter> {
        self.accessible_ids(ctx, EntityKind::Merchant).await
    }

    pub async fn accessible_iso_ids(&self, ctx: &RequestContext) -> CoreResult<AccessFilter> {
        self.accessible_ids(ctx, EntityKind::Iso).await
    }

    pub async fn accessible_syndicator_ids(&self, ctx: &RequestContext) -> CoreResult<AccessFilter> {
        self.accessible_ids(ctx, EntityKind::Syndicator).await
    }

    pub async fn accessible_lender_ids(&self, ctx: &RequestContext) -> CoreResult<AccessFilter> {
        self.accessible_ids(ctx, EntityKind::Lender).await
    }

    /// Resolve the visible ids of `target` for this request.
    ///
    /// - admin / bookkeeper: unrestricted
    /// - home portal: the scope established at authentication, as-is
    /// - defined cross-kind pair: one-hop lookup keyed by the caller's own scope
    /// - anything else: empty set
    #[instrument(skip(self, ctx), fields(portal = %ctx.portal, user_id = %ctx.principal.user_id), err)]
    pub async fn accessible_ids(&self, ctx: &RequestContext, target: EntityKind) -> CoreResult<AccessFilter> {
        if ctx.portal.is_unrestricted() {
            return Ok(AccessFilter::Unrestricted);
        }

        let Some(home) = ctx.portal.home_kind() else {
            return Ok(AccessFilter::Set(Vec::new()));
        };

        if home == target {
            return Ok(match ctx.filter.scope(home) {
                Some(ScopeIds::One(id)) => AccessFilter::Single(id),
                Some(ScopeIds::Many(ids)) => AccessFilter::Set(ids.to_vec()),
                None => AccessFilter::Set(Vec::new()),
            });
        }

        if !relationship_defined(home, target) {
            debug!(%home, %target, "no relationship defined; empty scope");
            return Ok(AccessFilter::Set(Vec::new()));
        }

        let related = match ctx.filter.scope(home) {
            Some(ScopeIds::One(id)) => self.lookup.related_to_one(home, target, id).await?,
            Some(ScopeIds::Many(ids)) if !ids.is_empty() => {
                self.lookup.related_to_many(home, target, ids).await?
            }
            _ => Vec::new(),
        };

        Ok(AccessFilter::Set(dedup(related)))
    }

    /// Resolve the scope of `target` and enforce it against `requested`.
    pub async fn build_filter(
        &self,
        ctx: &RequestContext,
        target: EntityKind,
        requested: Option<EntityId>,
    ) -> CoreResult<ScopedId> {
        let scope = self.accessible_ids(ctx, target).await?;
        enforce_scope(target, &scope, requested).inspect_err(|_| {
            tracing::warn!(
                portal = %ctx.portal,
                user_id = %ctx.principal.user_id,
                %target,
                requested = ?requested,
                "scope violation"
            );
        })
    }

    pub async fn build_funder_filter(&self, ctx: &RequestContext, requested: Option<EntityId>) -> CoreResult<ScopedId> {
        self.build_filter(ctx, EntityKind::Funder, requested).await
    }

    pub async fn build_merchant_filter(&self, ctx: &RequestContext, requested: Option<EntityId>) -> CoreResult<ScopedId> {
        self.build_filter(ctx, EntityKind::Merchant, requested).await
    }

    pub async fn build_iso_filter(&self, ctx: &RequestContext, requested: Option<EntityId>) -> CoreResult<ScopedId> {
        self.build_filter(ctx, EntityKind::Iso, requested).await
    }

    pub async fn build_syndicator_filter(&self, ctx: &RequestContext, requested: Option<EntityId>) -> CoreResult<ScopedId> {
        self.build_filter(ctx, EntityKind::Syndicator, requested).await
    }

    pub async fn build_lender_filter(&self, ctx: &RequestContext, requested: Option<EntityId>) -> CoreResult<ScopedId> {
        self.build_filter(ctx, EntityKind::Lender, requested).await
    }
}

fn dedup(ids: Vec<EntityId>) -> Vec<EntityId> {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}
