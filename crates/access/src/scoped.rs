//! Scope-enforcing filter construction.
//!
//! Turns a resolved [`AccessFilter`] plus the caller-supplied target id into
//! the id constraint the eventual query must carry. Violations fail loudly; an
//! absent target is a request for everything in scope.

use serde::Serialize;

use fundcrm_core::{CoreError, CoreResult, EntityId};
use fundcrm_query::Filter;

use crate::context::EntityKind;
use crate::resolver::AccessFilter;

/// Id constraint produced for one entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "ids", rename_all = "snake_case")]
pub enum ScopedId {
    /// No restriction (unrestricted scope and no target requested).
    Any,
    One(EntityId),
    /// Member of this set; an empty set matches nothing.
    AnyOf(Vec<EntityId>),
}

impl ScopedId {
    /// Query predicate over `field`, or `None` when unrestricted.
    pub fn to_filter(&self, field: &str) -> Option<Filter> {
        match self {
            ScopedId::Any => None,
            ScopedId::One(id) => Some(Filter::eq(field, id.to_string())),
            ScopedId::AnyOf(ids) => Some(Filter::is_in(field, ids.iter().map(ToString::to_string))),
        }
    }
}

/// Enforce `scope` against an optional requested id.
///
/// | scope        | requested in scope | requested outside | nothing requested |
/// |--------------|--------------------|-------------------|-------------------|
/// | unrestricted | `One(requested)`   | n/a               | `Any`             |
/// | single `X`   | `One(X)`           | error             | `One(X)`          |
/// | set `S`      | `One(requested)`   | error             | `AnyOf(S)`        |
pub fn enforce_scope(kind: EntityKind, scope: &AccessFilter, requested: Option<EntityId>) -> CoreResult<ScopedId> {
    match requested {
        Some(id) if !scope.allows(id) => Err(CoreError::denied(kind.as_str(), id)),
        Some(id) => Ok(ScopedId::One(id)),
        None => Ok(match scope {
            AccessFilter::Unrestricted => ScopedId::Any,
            AccessFilter::Single(own) => ScopedId::One(*own),
            AccessFilter::Set(ids) => ScopedId::AnyOf(ids.clone()),
        }),
    }
}

/// Parse an optional raw target id from request input; blank means absent.
pub fn parse_requested(raw: Option<&str>) -> CoreResult<Option<EntityId>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some),
    }
}
