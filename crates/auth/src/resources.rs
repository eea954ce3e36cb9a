//! Business resources and the actions that can be performed on them.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use fundcrm_core::CoreError;

/// Named business entity guarded by permissions.
///
/// The set is fixed at compile time. Adding a variant never grants it to any
/// role other than `admin`; every other grant is listed in `registry.rs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Account,
    Application,
    ApplicationDocument,
    ApplicationNote,
    ApplicationOffer,
    Commission,
    Contact,
    Disbursement,
    Document,
    Funder,
    Funding,
    FundingFee,
    FundingNote,
    Iso,
    Lender,
    Merchant,
    Participation,
    Payback,
    Payout,
    Report,
    Role,
    Setting,
    Syndication,
    SyndicationOffer,
    Syndicator,
    Transaction,
    User,
}

impl Resource {
    pub const ALL: [Resource; 27] = [
        Resource::Account,
        Resource::Application,
        Resource::ApplicationDocument,
        Resource::ApplicationNote,
        Resource::ApplicationOffer,
        Resource::Commission,
        Resource::Contact,
        Resource::Disbursement,
        Resource::Document,
        Resource::Funder,
        Resource::Funding,
        Resource::FundingFee,
        Resource::FundingNote,
        Resource::Iso,
        Resource::Lender,
        Resource::Merchant,
        Resource::Participation,
        Resource::Payback,
        Resource::Payout,
        Resource::Report,
        Resource::Role,
        Resource::Setting,
        Resource::Syndication,
        Resource::SyndicationOffer,
        Resource::Syndicator,
        Resource::Transaction,
        Resource::User,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Account => "account",
            Resource::Application => "application",
            Resource::ApplicationDocument => "application_document",
            Resource::ApplicationNote => "application_note",
            Resource::ApplicationOffer => "application_offer",
            Resource::Commission => "commission",
            Resource::Contact => "contact",
            Resource::Disbursement => "disbursement",
            Resource::Document => "document",
            Resource::Funder => "funder",
            Resource::Funding => "funding",
            Resource::FundingFee => "funding_fee",
            Resource::FundingNote => "funding_note",
            Resource::Iso => "iso",
            Resource::Lender => "lender",
            Resource::Merchant => "merchant",
            Resource::Participation => "participation",
            Resource::Payback => "payback",
            Resource::Payout => "payout",
            Resource::Report => "report",
            Resource::Role => "role",
            Resource::Setting => "setting",
            Resource::Syndication => "syndication",
            Resource::SyndicationOffer => "syndication_offer",
            Resource::Syndicator => "syndicator",
            Resource::Transaction => "transaction",
            Resource::User => "user",
        }
    }
}

impl core::fmt::Display for Resource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| CoreError::validation(format!("unknown resource '{s}'")))
    }
}

/// Operation performed on a [`Resource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    /// `self`: act on the caller's own record only.
    #[serde(rename = "self")]
    Own,
    Approve,
    Reject,
    Export,
    Import,
    Assign,
}

impl Action {
    pub const ALL: [Action; 10] = [
        Action::Create,
        Action::Read,
        Action::Update,
        Action::Delete,
        Action::Own,
        Action::Approve,
        Action::Reject,
        Action::Export,
        Action::Import,
        Action::Assign,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Own => "self",
            Action::Approve => "approve",
            Action::Reject => "reject",
            Action::Export => "export",
            Action::Import => "import",
            Action::Assign => "assign",
        }
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| CoreError::validation(format!("unknown action '{s}'")))
    }
}
