//! Process-wide permission table and curated role grants.
//!
//! Built exactly once on first access and never mutated afterwards. The
//! Resource × Action table is generated; the per-role sets are listed by hand.
//! Only `admin` is derived from the table.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::{Action, Permission, Resource, Role};

static REGISTRY: Lazy<PermissionRegistry> = Lazy::new(PermissionRegistry::build);

/// Shared, immutable registry instance.
pub fn registry() -> &'static PermissionRegistry {
    &REGISTRY
}

#[derive(Debug)]
pub struct PermissionRegistry {
    table: BTreeMap<Resource, Vec<Permission>>,
    roles: HashMap<Role, HashSet<Permission>>,
}

/// Role definition with its granted permissions (for audit/display).
#[derive(Debug, Clone, Serialize)]
pub struct RoleDefinition {
    pub name: String,
    pub description: String,
    pub permissions: Vec<String>,
}

/// Permission definition (for audit/display).
#[derive(Debug, Clone, Serialize)]
pub struct PermissionDefinition {
    pub name: String,
    pub resource: Resource,
    pub action: Action,
    pub granted_to: Vec<Role>,
}

impl PermissionRegistry {
    fn build() -> Self {
        let table: BTreeMap<Resource, Vec<Permission>> = Resource::ALL
            .into_iter()
            .map(|resource| {
                let perms = Action::ALL
                    .into_iter()
                    .map(|action| Permission::new(resource, action))
                    .collect();
                (resource, perms)
            })
            .collect();

        let roles = Role::ALL
            .into_iter()
            .map(|role| {
                let granted: HashSet<Permission> = match role {
                    Role::Admin => table.values().flatten().copied().collect(),
                    other => curated_grants(other).into_iter().collect(),
                };
                (role, granted)
            })
            .collect();

        tracing::debug!(resources = table.len(), roles = Role::ALL.len(), "permission registry built");
        Self { table, roles }
    }

    /// Every `resource:action` permission for one resource.
    pub fn resource_permissions(&self, resource: Resource) -> &[Permission] {
        self.table.get(&resource).map(Vec::as_slice).unwrap_or_default()
    }

    /// The full generated Resource × Action table.
    pub fn all_permissions(&self) -> impl Iterator<Item = Permission> + '_ {
        self.table.values().flatten().copied()
    }

    pub fn permissions_for(&self, role: Role) -> &HashSet<Permission> {
        // Every role is inserted by `build`.
        &self.roles[&role]
    }

    /// Lookup by raw role name; unknown names hold nothing.
    pub fn permissions_for_name(&self, role: &str) -> Option<&HashSet<Permission>> {
        role.parse::<Role>().ok().map(|r| self.permissions_for(r))
    }

    pub fn role_grants(&self, role: Role, permission: Permission) -> bool {
        self.permissions_for(role).contains(&permission)
    }

    pub fn role_definitions(&self) -> Vec<RoleDefinition> {
        Role::ALL
            .into_iter()
            .map(|role| {
                let sorted: BTreeSet<Permission> = self.permissions_for(role).iter().copied().collect();
                RoleDefinition {
                    name: role.as_str().to_string(),
                    description: role.description().to_string(),
                    permissions: sorted.iter().map(ToString::to_string).collect(),
                }
            })
            .collect()
    }

    pub fn permission_definitions(&self) -> Vec<PermissionDefinition> {
        self.all_permissions()
            .map(|p| PermissionDefinition {
                name: p.to_string(),
                resource: p.resource(),
                action: p.action(),
                granted_to: Role::ALL
                    .into_iter()
                    .filter(|r| self.role_grants(*r, p))
                    .collect(),
            })
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Curated role grants
// ─────────────────────────────────────────────────────────────────────────────

macro_rules! grants {
    ($($resource:ident => [$($action:ident),* $(,)?]),* $(,)?) => {
        vec![$($(Permission::new(Resource::$resource, Action::$action),)*)*]
    };
}

/// Hand-curated grants for every non-admin role.
///
/// The match is exhaustive over [`Role`], so a new role fails to compile until
/// its grants are written here.
fn curated_grants(role: Role) -> Vec<Permission> {
    match role {
        Role::Admin => Vec::new(),
        Role::Bookkeeper => grants![
            Account => [Read, Update, Export],
            Application => [Read, Export],
            Commission => [Read, Update, Export],
            Disbursement => [Create, Read, Update, Export],
            Funder => [Read],
            Funding => [Read, Export],
            FundingFee => [Read, Export],
            Iso => [Read],
            Lender => [Read],
            Merchant => [Read],
            Participation => [Read, Export],
            Payback => [Read, Update, Export, Import],
            Payout => [Create, Read, Update, Export],
            Report => [Read, Export],
            Syndication => [Read, Export],
            Syndicator => [Read],
            Transaction => [Create, Read, Update, Export, Import],
            User => [Own],
        ],
        Role::FunderManager => grants![
            Account => [Read, Update],
            Application => [Create, Read, Update, Delete, Approve, Reject, Export, Import, Assign],
            ApplicationDocument => [Create, Read, Update, Delete],
            ApplicationNote => [Create, Read, Update, Delete],
            ApplicationOffer => [Create, Read, Update, Delete, Approve, Reject],
            Commission => [Create, Read, Update, Delete, Approve],
            Contact => [Create, Read, Update, Delete],
            Disbursement => [Create, Read, Update],
            Document => [Create, Read, Update, Delete],
            Funder => [Read, Update, Own],
            Funding => [Create, Read, Update, Delete, Approve, Export, Assign],
            FundingFee => [Create, Read, Update, Delete],
            FundingNote => [Create, Read, Update, Delete],
            Iso => [Create, Read, Update, Assign],
            Lender => [Create, Read, Update],
            Merchant => [Create, Read, Update, Delete, Export, Import, Assign],
            Participation => [Create, Read, Update, Delete],
            Payback => [Create, Read, Update, Export, Import],
            Payout => [Create, Read, Update, Approve],
            Report => [Read, Export],
            Role => [Read],
            Setting => [Read, Update],
            Syndication => [Create, Read, Update, Delete, Export],
            SyndicationOffer => [Create, Read, Update, Delete],
            Syndicator => [Create, Read, Update, Assign],
            Transaction => [Create, Read, Update, Export],
            User => [Create, Read, Update, Delete, Own, Assign],
        ],
        Role::FunderUser => grants![
            Application => [Create, Read, Update, Export],
            ApplicationDocument => [Create, Read, Update],
            ApplicationNote => [Create, Read, Update],
            ApplicationOffer => [Create, Read, Update],
            Commission => [Read],
            Contact => [Create, Read, Update],
            Document => [Create, Read],
            Funder => [Read, Own],
            Funding => [Read, Update],
            FundingFee => [Read],
            FundingNote => [Create, Read, Update],
            Iso => [Read],
            Lender => [Read],
            Merchant => [Create, Read, Update],
            Participation => [Read],
            Payback => [Read],
            Payout => [Read],
            Report => [Read],
            Syndication => [Read],
            SyndicationOffer => [Read],
            Syndicator => [Read],
            Transaction => [Read],
            User => [Own],
        ],
        Role::IsoManager => grants![
            Application => [Create, Read, Update, Export, Assign],
            ApplicationDocument => [Create, Read, Update, Delete],
            ApplicationNote => [Create, Read, Update],
            ApplicationOffer => [Read, Approve, Reject],
            Commission => [Read, Export],
            Contact => [Create, Read, Update],
            Document => [Create, Read],
            Funder => [Read],
            Funding => [Read],
            Iso => [Read, Update, Own],
            Merchant => [Create, Read, Update],
            Report => [Read],
            User => [Create, Read, Update, Own, Assign],
        ],
        Role::IsoSales => grants![
            Application => [Create, Read, Update],
            ApplicationDocument => [Create, Read],
            ApplicationNote => [Create, Read],
            ApplicationOffer => [Read],
            Commission => [Read],
            Contact => [Create, Read, Update],
            Funder => [Read],
            Funding => [Read],
            Iso => [Read, Own],
            Merchant => [Create, Read],
            User => [Own],
        ],
        Role::Syndicator => grants![
            Document => [Read],
            Funder => [Read],
            Funding => [Read],
            Participation => [Read],
            Payout => [Read, Export],
            Report => [Read, Export],
            Syndication => [Read, Export],
            SyndicationOffer => [Read, Approve, Reject],
            Syndicator => [Read, Update, Own],
            Transaction => [Read, Export],
            User => [Own],
        ],
        Role::Merchant => grants![
            Application => [Create, Read],
            ApplicationDocument => [Create, Read],
            ApplicationOffer => [Read, Approve, Reject],
            Contact => [Read, Update],
            Document => [Read],
            Funding => [Read],
            Merchant => [Read, Update, Own],
            Payback => [Read],
            Transaction => [Read],
            User => [Own],
        ],
        Role::PendingUser => grants![
            User => [Own],
        ],
    }
}
