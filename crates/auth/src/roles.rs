use core::str::FromStr;

use serde::{Deserialize, Serialize};

use fundcrm_core::CoreError;

/// Principal class used for RBAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Bookkeeper,
    FunderManager,
    FunderUser,
    IsoManager,
    IsoSales,
    Syndicator,
    Merchant,
    PendingUser,
}

impl Role {
    pub const ALL: [Role; 9] = [
        Role::Admin,
        Role::Bookkeeper,
        Role::FunderManager,
        Role::FunderUser,
        Role::IsoManager,
        Role::IsoSales,
        Role::Syndicator,
        Role::Merchant,
        Role::PendingUser,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Bookkeeper => "bookkeeper",
            Role::FunderManager => "funder_manager",
            Role::FunderUser => "funder_user",
            Role::IsoManager => "iso_manager",
            Role::IsoSales => "iso_sales",
            Role::Syndicator => "syndicator",
            Role::Merchant => "merchant",
            Role::PendingUser => "pending_user",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Role::Admin => "Platform administrator with every permission",
            Role::Bookkeeper => "Back-office accounting with read access across all tenants",
            Role::FunderManager => "Manages a funder's pipeline, portfolio and team",
            Role::FunderUser => "Works a funder's applications and fundings",
            Role::IsoManager => "Manages an ISO's submissions and sales team",
            Role::IsoSales => "Submits and follows up on ISO applications",
            Role::Syndicator => "Participates in fundings through syndication offers",
            Role::Merchant => "Business owner viewing its own applications and fundings",
            Role::PendingUser => "Registered account awaiting approval",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| CoreError::validation(format!("unknown role '{s}'")))
    }
}
