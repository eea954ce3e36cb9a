//! `fundcrm-access`: row-level security for the tenant graph.
//!
//! Resolves, per request, which funders, merchants, ISOs, syndicators and
//! lenders the caller may see, and turns that scope plus a requested target id
//! into a query constraint. Relationship storage is reached only through
//! [`RelationshipLookup`].

pub mod context;
pub mod lookup;
pub mod resolver;
pub mod scoped;

pub use context::{EntityKind, PortalType, RequestContext, ScopeFilter, ScopeIds};
pub use lookup::{RelationshipLookup, relationship_defined};
pub use resolver::{AccessFilter, AccessScopeResolver};
pub use scoped::{ScopedId, enforce_scope, parse_requested};
