use std::sync::Arc;

use fundcrm_core::{CoreResult, EntityId};

use crate::EntityKind;

/// One-hop association lookup between tenant-graph entities.
///
/// Backed by whatever association table the persistence layer keeps (e.g.
/// funder ↔ merchant links created by fundings). Implementations return the
/// union of ids of kind `to` related to any of the keys of kind `from`.
#[async_trait::async_trait]
pub trait RelationshipLookup: Send + Sync {
    async fn related_to_many(
        &self,
        from: EntityKind,
        to: EntityKind,
        keys: &[EntityId],
    ) -> CoreResult<Vec<EntityId>>;

    async fn related_to_one(&self, from: EntityKind, to: EntityKind, key: EntityId) -> CoreResult<Vec<EntityId>> {
        self.related_to_many(from, to, &[key]).await
    }
}

#[async_trait::async_trait]
impl<L> RelationshipLookup for Arc<L>
where
    L: RelationshipLookup + ?Sized,
{
    async fn related_to_many(
        &self,
        from: EntityKind,
        to: EntityKind,
        keys: &[EntityId],
    ) -> CoreResult<Vec<EntityId>> {
        (**self).related_to_many(from, to, keys).await
    }

    async fn related_to_one(&self, from: EntityKind, to: EntityKind, key: EntityId) -> CoreResult<Vec<EntityId>> {
        (**self).related_to_one(from, to, key).await
    }
}

/// Whether a cross-kind lookup is defined for a portal's home kind.
///
/// Undefined pairs resolve to an empty scope. Notably a syndicator has no
/// defined path to merchants or ISOs.
pub fn relationship_defined(from: EntityKind, to: EntityKind) -> bool {
    use EntityKind::*;
    matches!(
        (from, to),
        (Funder, Merchant)
            | (Funder, Iso)
            | (Funder, Syndicator)
            | (Funder, Lender)
            | (Merchant, Funder)
            | (Merchant, Iso)
            | (Iso, Funder)
            | (Iso, Merchant)
            | (Syndicator, Funder)
    )
}
