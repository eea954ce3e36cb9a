use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use fundcrm_access::{EntityKind, RelationshipLookup};
use fundcrm_core::{CoreError, CoreResult, EntityId};

/// One undirected link in the tenant graph, e.g. a funder that funded a merchant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Association {
    pub from_kind: EntityKind,
    pub from_id: EntityId,
    pub to_kind: EntityKind,
    pub to_id: EntityId,
}

impl Association {
    fn reversed(self) -> Self {
        Self {
            from_kind: self.to_kind,
            from_id: self.to_id,
            to_kind: self.from_kind,
            to_id: self.from_id,
        }
    }

    fn connects(&self, from: EntityKind, to: EntityKind, key: &EntityId) -> bool {
        self.from_kind == from && self.to_kind == to && self.from_id == *key
    }
}

/// In-memory association table backing [`RelationshipLookup`].
///
/// Links are stored in both directions so a merchant → funder lookup sees the
/// same rows as funder → merchant. Results keep insertion order and are not
/// deduplicated; that is the resolver's job.
#[derive(Debug, Default)]
pub struct InMemoryAssociations {
    links: RwLock<Vec<Association>>,
}

impl InMemoryAssociations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_links(links: impl IntoIterator<Item = Association>) -> CoreResult<Self> {
        let table = Self::new();
        for link in links {
            table.insert(link)?;
        }
        Ok(table)
    }

    pub fn link(&self, from_kind: EntityKind, from_id: EntityId, to_kind: EntityKind, to_id: EntityId) -> CoreResult<()> {
        self.insert(Association {
            from_kind,
            from_id,
            to_kind,
            to_id,
        })
    }

    pub fn insert(&self, link: Association) -> CoreResult<()> {
        let mut links = self
            .links
            .write()
            .map_err(|_| CoreError::storage("association table lock poisoned"))?;
        for row in [link, link.reversed()] {
            if !links.contains(&row) {
                links.push(row);
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.links.read().map(|l| l.len() / 2).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl RelationshipLookup for InMemoryAssociations {
    async fn related_to_many(&self, from: EntityKind, to: EntityKind, keys: &[EntityId]) -> CoreResult<Vec<EntityId>> {
        let links = self
            .links
            .read()
            .map_err(|_| CoreError::storage("association table lock poisoned"))?;
        Ok(keys
            .iter()
            .flat_map(|key| links.iter().filter(move |l| l.connects(from, to, key)).map(|l| l.to_id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundcrm_access::{AccessFilter, AccessScopeResolver, PortalType, RequestContext, ScopeFilter};
    use fundcrm_auth::Principal;
    use fundcrm_core::UserId;

    #[tokio::test]
    async fn links_are_visible_from_both_ends() {
        let (f1, f2, m1) = (EntityId::new(), EntityId::new(), EntityId::new());
        let table = InMemoryAssociations::new();
        table.link(EntityKind::Funder, f1, EntityKind::Merchant, m1).unwrap();
        table.link(EntityKind::Merchant, m1, EntityKind::Funder, f2).unwrap();
        table.link(EntityKind::Funder, f1, EntityKind::Merchant, m1).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(
            table.related_to_one(EntityKind::Merchant, EntityKind::Funder, m1).await.unwrap(),
            vec![f1, f2]
        );
        assert_eq!(
            table.related_to_one(EntityKind::Funder, EntityKind::Merchant, f2).await.unwrap(),
            vec![m1]
        );
        assert!(
            table
                .related_to_one(EntityKind::Funder, EntityKind::Iso, f1)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn resolver_over_association_table() {
        let (f1, m1, m2, m3) = (EntityId::new(), EntityId::new(), EntityId::new(), EntityId::new());
        let table = InMemoryAssociations::from_links([
            Association {
                from_kind: EntityKind::Funder,
                from_id: f1,
                to_kind: EntityKind::Merchant,
                to_id: m1,
            },
            Association {
                from_kind: EntityKind::Merchant,
                from_id: m2,
                to_kind: EntityKind::Funder,
                to_id: f1,
            },
        ])
        .unwrap();
        table.link(EntityKind::Iso, EntityId::new(), EntityKind::Merchant, m3).unwrap();

        let resolver = AccessScopeResolver::new(table);
        let ctx = RequestContext::new(
            PortalType::Funder,
            Principal::new(UserId::new(), "funder_manager"),
        )
        .with_filter(ScopeFilter::default().with_one(EntityKind::Funder, f1));

        let scope = resolver.accessible_ids(&ctx, EntityKind::Merchant).await.unwrap();
        assert_eq!(scope, AccessFilter::Set(vec![m1, m2]));
    }
}
