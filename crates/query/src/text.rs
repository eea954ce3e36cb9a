//! Free-text search over one or more string fields.

use crate::Filter;

/// Token meaning "field is null, missing or blank".
pub const EMPTY_SENTINEL: &str = "EMPTY";

/// One whitespace-separated search term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Term<'a> {
    pub(crate) negated: bool,
    pub(crate) value: &'a str,
}

impl<'a> Term<'a> {
    /// Split `-foo` into an exclusion of `foo`. A lone `-` has no term.
    pub(crate) fn parse(raw: &'a str) -> Option<Self> {
        match raw.strip_prefix('-') {
            Some("") => None,
            Some(rest) => Some(Term {
                negated: true,
                value: rest,
            }),
            None if raw.is_empty() => None,
            None => Some(Term {
                negated: false,
                value: raw,
            }),
        }
    }

    pub(crate) fn is_empty_sentinel(&self) -> bool {
        self.value == EMPTY_SENTINEL
    }
}

/// Combine exclusion and inclusion predicates: `AND(exclusions, OR(inclusions))`.
pub(crate) fn combine(exclusions: Vec<Filter>, inclusions: Vec<Filter>) -> Option<Filter> {
    match (exclusions.is_empty(), inclusions.is_empty()) {
        (true, true) => None,
        (false, true) => Some(Filter::and(exclusions)),
        (true, false) => Some(Filter::or(inclusions)),
        (false, false) => Some(Filter::and(vec![Filter::and(exclusions), Filter::or(inclusions)])),
    }
}

/// Build a search predicate from free text.
///
/// - `foo` matches when any of `fields` contains `foo` (case-insensitive)
/// - `-foo` requires that none of `fields` contains `foo`
/// - `EMPTY` / `-EMPTY` test for blank / non-blank instead of substring
///
/// Inclusions are OR-combined, exclusions AND-combined. Returns `None` when the
/// text holds no terms or no fields are given.
pub fn search_filter(fields: &[&str], text: &str) -> Option<Filter> {
    if fields.is_empty() {
        return None;
    }

    let mut exclusions = Vec::new();
    let mut inclusions = Vec::new();

    for term in text.split_whitespace().filter_map(Term::parse) {
        let per_field = |field: &str| {
            if term.is_empty_sentinel() {
                Filter::blank(field)
            } else {
                Filter::contains(field, term.value)
            }
        };

        if term.negated {
            exclusions.extend(fields.iter().map(|f| Filter::not(per_field(*f))));
        } else {
            inclusions.push(Filter::or(fields.iter().map(|f| per_field(*f)).collect()));
        }
    }

    combine(exclusions, inclusions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_blank_and_substring() {
        let f = search_filter(&["name"], "-EMPTY foo").unwrap();
        assert_eq!(
            f,
            Filter::and(vec![Filter::not(Filter::blank("name")), Filter::contains("name", "foo")])
        );

        assert!(f.matches(&json!({"name": "Big FOOd Corp"})));
        assert!(!f.matches(&json!({"name": "Acme"})));
        assert!(!f.matches(&json!({"name": ""})));
        assert!(!f.matches(&json!({})));
    }

    #[test]
    fn inclusions_are_or_across_terms_and_fields() {
        let f = search_filter(&["name", "email"], "acme globex").unwrap();
        assert!(f.matches(&json!({"name": "ACME LLC"})));
        assert!(f.matches(&json!({"email": "ops@globex.io"})));
        assert!(!f.matches(&json!({"name": "Initech", "email": "x@initech.com"})));
    }

    #[test]
    fn exclusions_are_and_across_terms_and_fields() {
        let f = search_filter(&["name", "email"], "-test -demo").unwrap();
        assert!(f.matches(&json!({"name": "Acme", "email": "a@acme.com"})));
        assert!(!f.matches(&json!({"name": "Acme", "email": "demo@acme.com"})));
        assert!(!f.matches(&json!({"name": "Test Co", "email": "a@acme.com"})));
    }

    #[test]
    fn empty_sentinel_inclusion() {
        let f = search_filter(&["dba"], "EMPTY").unwrap();
        assert_eq!(f, Filter::blank("dba"));
        assert!(f.matches(&json!({"dba": null})));
        assert!(f.matches(&json!({"dba": ""})));
        assert!(!f.matches(&json!({"dba": "Shop"})));
    }

    #[test]
    fn nothing_to_search() {
        assert_eq!(search_filter(&["name"], "   "), None);
        assert_eq!(search_filter(&["name"], "-"), None);
        assert_eq!(search_filter(&[], "foo"), None);
    }
}
