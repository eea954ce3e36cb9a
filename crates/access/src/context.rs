//! Per-request authorization context.
//!
//! Built by the authentication layer and discarded at request end. This crate
//! only reads it; nothing here re-derives trust.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use fundcrm_auth::Principal;
use fundcrm_core::{CoreError, EntityId};

/// Tenant-graph entity kinds that scopes are computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Funder,
    Merchant,
    Iso,
    Syndicator,
    Lender,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Funder,
        EntityKind::Merchant,
        EntityKind::Iso,
        EntityKind::Syndicator,
        EntityKind::Lender,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Funder => "funder",
            EntityKind::Merchant => "merchant",
            EntityKind::Iso => "iso",
            EntityKind::Syndicator => "syndicator",
            EntityKind::Lender => "lender",
        }
    }
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| CoreError::validation(format!("unknown entity kind '{s}'")))
    }
}

/// Category of authenticated principal; drives scope resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortalType {
    Admin,
    Bookkeeper,
    Funder,
    Iso,
    Merchant,
    Syndicator,
}

impl PortalType {
    /// Portals that see every tenant.
    pub fn is_unrestricted(&self) -> bool {
        matches!(self, PortalType::Admin | PortalType::Bookkeeper)
    }

    /// The entity kind this portal's own scope is expressed in.
    pub fn home_kind(&self) -> Option<EntityKind> {
        match self {
            PortalType::Admin | PortalType::Bookkeeper => None,
            PortalType::Funder => Some(EntityKind::Funder),
            PortalType::Iso => Some(EntityKind::Iso),
            PortalType::Merchant => Some(EntityKind::Merchant),
            PortalType::Syndicator => Some(EntityKind::Syndicator),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PortalType::Admin => "admin",
            PortalType::Bookkeeper => "bookkeeper",
            PortalType::Funder => "funder",
            PortalType::Iso => "iso",
            PortalType::Merchant => "merchant",
            PortalType::Syndicator => "syndicator",
        }
    }
}

impl core::fmt::Display for PortalType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scope ids established at authentication time.
///
/// Each kind may carry a single selected id, a list, or both. When both are
/// present the single id wins: it is the narrower, currently selected scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funder: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funder_list: Option<Vec<EntityId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_list: Option<Vec<EntityId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iso: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iso_list: Option<Vec<EntityId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syndicator: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syndicator_list: Option<Vec<EntityId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lender: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lender_list: Option<Vec<EntityId>>,
}

/// Borrowed view of one kind's scope ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeIds<'a> {
    One(EntityId),
    Many(&'a [EntityId]),
}

impl ScopeFilter {
    pub fn scope(&self, kind: EntityKind) -> Option<ScopeIds<'_>> {
        let (one, many) = match kind {
            EntityKind::Funder => (self.funder, self.funder_list.as_deref()),
            EntityKind::Merchant => (self.merchant, self.merchant_list.as_deref()),
            EntityKind::Iso => (self.iso, self.iso_list.as_deref()),
            EntityKind::Syndicator => (self.syndicator, self.syndicator_list.as_deref()),
            EntityKind::Lender => (self.lender, self.lender_list.as_deref()),
        };
        one.map(ScopeIds::One).or_else(|| many.map(ScopeIds::Many))
    }

    pub fn with_one(mut self, kind: EntityKind, id: EntityId) -> Self {
        match kind {
            EntityKind::Funder => self.funder = Some(id),
            EntityKind::Merchant => self.merchant = Some(id),
            EntityKind::Iso => self.iso = Some(id),
            EntityKind::Syndicator => self.syndicator = Some(id),
            EntityKind::Lender => self.lender = Some(id),
        }
        self
    }

    pub fn with_list(mut self, kind: EntityKind, ids: Vec<EntityId>) -> Self {
        match kind {
            EntityKind::Funder => self.funder_list = Some(ids),
            EntityKind::Merchant => self.merchant_list = Some(ids),
            EntityKind::Iso => self.iso_list = Some(ids),
            EntityKind::Syndicator => self.syndicator_list = Some(ids),
            EntityKind::Lender => self.lender_list = Some(ids),
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub portal: PortalType,
    pub principal: Principal,
    #[serde(default)]
    pub filter: ScopeFilter,
}

impl RequestContext {
    pub fn new(portal: PortalType, principal: Principal) -> Self {
        Self {
            portal,
            principal,
            filter: ScopeFilter::default(),
        }
    }

    pub fn with_filter(mut self, filter: ScopeFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn role(&self) -> &str {
        &self.principal.role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_id_wins_over_list() {
        let a = EntityId::new();
        let b = EntityId::new();
        let filter = ScopeFilter::default()
            .with_list(EntityKind::Funder, vec![a, b])
            .with_one(EntityKind::Funder, b);
        assert_eq!(filter.scope(EntityKind::Funder), Some(ScopeIds::One(b)));

        let list_only = ScopeFilter::default().with_list(EntityKind::Iso, vec![a]);
        assert_eq!(list_only.scope(EntityKind::Iso), Some(ScopeIds::Many(&[a])));
        assert_eq!(list_only.scope(EntityKind::Merchant), None);
    }

    #[test]
    fn filter_deserializes_from_list_keys() {
        let id = EntityId::new();
        let raw = serde_json::json!({ "merchant_list": [id.to_string()] });
        let filter: ScopeFilter = serde_json::from_value(raw).unwrap();
        assert_eq!(filter.scope(EntityKind::Merchant), Some(ScopeIds::Many(&[id])));
    }

    #[test]
    fn portal_home_kinds() {
        assert!(PortalType::Admin.is_unrestricted());
        assert!(PortalType::Bookkeeper.is_unrestricted());
        assert_eq!(PortalType::Syndicator.home_kind(), Some(EntityKind::Syndicator));
        assert_eq!(PortalType::Bookkeeper.home_kind(), None);
    }
}
