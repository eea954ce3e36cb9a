//! Exact-value / set-membership filter with include, exclude and `EMPTY` terms.

use serde_json::Value;

use fundcrm_core::{CoreResult, EntityId};

use crate::Filter;
use crate::text::{Term, combine};

/// How the target field is stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArrayFilterOptions {
    /// Values are identifiers: each must parse as an id, and "blank" means
    /// only null or missing (an id is never an empty string).
    pub is_id: bool,
    /// The field holds an array: `EMPTY` also matches `[]`, and `-EMPTY`
    /// therefore also requires at least one element.
    pub is_array: bool,
}

impl ArrayFilterOptions {
    pub fn ids() -> Self {
        Self {
            is_id: true,
            is_array: false,
        }
    }

    pub fn array() -> Self {
        Self {
            is_id: false,
            is_array: true,
        }
    }

    pub fn id_array() -> Self {
        Self {
            is_id: true,
            is_array: true,
        }
    }

    /// Predicate for the `EMPTY` sentinel under these options.
    pub fn empty_predicate(&self, field: &str) -> Filter {
        let base = if self.is_id {
            Filter::missing(field)
        } else {
            Filter::blank(field)
        };
        if self.is_array {
            Filter::or(vec![base, Filter::empty_array(field)])
        } else {
            base
        }
    }
}

/// Build a membership predicate for `field` (dotted paths allowed).
///
/// Each value is `x` (include), `-x` (exclude), `EMPTY` or `-EMPTY`. Inclusions
/// are OR-combined, exclusions AND-combined, and when both are present the
/// result is `AND(exclusions, OR(inclusions))`.
pub fn array_filter<S: AsRef<str>>(
    field: &str,
    values: &[S],
    options: ArrayFilterOptions,
) -> CoreResult<Option<Filter>> {
    let mut included = Vec::new();
    let mut excluded = Vec::new();
    let mut include_empty = false;
    let mut exclude_empty = false;

    for term in values.iter().filter_map(|v| Term::parse(v.as_ref().trim())) {
        match (term.negated, term.is_empty_sentinel()) {
            (false, true) => include_empty = true,
            (true, true) => exclude_empty = true,
            (false, false) => included.push(to_value(field, term.value, options)?),
            (true, false) => excluded.push(to_value(field, term.value, options)?),
        }
    }

    let mut exclusions = Vec::new();
    if !excluded.is_empty() {
        exclusions.push(Filter::not(Filter::is_in(field, excluded)));
    }
    if exclude_empty {
        exclusions.push(Filter::not(options.empty_predicate(field)));
    }

    let mut inclusions = Vec::new();
    if !included.is_empty() {
        inclusions.push(Filter::is_in(field, included));
    }
    if include_empty {
        inclusions.push(options.empty_predicate(field));
    }

    Ok(combine(exclusions, inclusions))
}

fn to_value(field: &str, raw: &str, options: ArrayFilterOptions) -> CoreResult<Value> {
    if options.is_id {
        let id: EntityId = raw.parse().map_err(|_| {
            fundcrm_core::CoreError::validation(format!("{field}: '{raw}' is not a valid identifier"))
        })?;
        Ok(Value::String(id.to_string()))
    } else {
        Ok(Value::String(raw.to_string()))
    }
}
