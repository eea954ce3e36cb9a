//! Storage-agnostic query predicate.
//!
//! The vocabulary is small: equality, set membership,
//! case-insensitive substring, null/missing, blank, empty collection, numeric or
//! date range, plus boolean composition. Any backend that can express these
//! primitives can execute a [`Filter`]; [`Filter::matches`] is the in-memory
//! reference evaluator over JSON documents.

use core::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inclusive range bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    Gte,
    Lte,
}

/// Comparable value of a range predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RangeValue {
    Int(i64),
    Float(f64),
    Date(DateTime<Utc>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Filter {
    And { all: Vec<Filter> },
    Or { any: Vec<Filter> },
    Not { filter: Box<Filter> },
    /// Field equals the value, or is an array containing it.
    Eq { field: String, value: Value },
    /// Field equals (or contains) any of the values.
    In { field: String, values: Vec<Value> },
    /// Case-insensitive substring match.
    Contains { field: String, needle: String },
    /// Field is null or absent.
    Missing { field: String },
    /// Field is null, absent, or a whitespace-only string.
    Blank { field: String },
    /// Field is an array with no elements.
    EmptyArray { field: String },
    Range { field: String, bound: Bound, value: RangeValue },
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_in<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Filter::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Filter::Contains {
            field: field.into(),
            needle: needle.into(),
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Filter::Missing { field: field.into() }
    }

    pub fn blank(field: impl Into<String>) -> Self {
        Filter::Blank { field: field.into() }
    }

    pub fn empty_array(field: impl Into<String>) -> Self {
        Filter::EmptyArray { field: field.into() }
    }

    pub fn range(field: impl Into<String>, bound: Bound, value: RangeValue) -> Self {
        Filter::Range {
            field: field.into(),
            bound,
            value,
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(filter: Filter) -> Self {
        Filter::Not {
            filter: Box::new(filter),
        }
    }

    /// Conjunction; a single operand is returned as-is.
    pub fn and(mut all: Vec<Filter>) -> Self {
        if all.len() == 1 {
            return all.remove(0);
        }
        Filter::And { all }
    }

    /// Disjunction; a single operand is returned as-is.
    pub fn or(mut any: Vec<Filter>) -> Self {
        if any.len() == 1 {
            return any.remove(0);
        }
        Filter::Or { any }
    }

    /// Evaluate against a JSON document.
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Filter::And { all } => all.iter().all(|f| f.matches(doc)),
            Filter::Or { any } => any.iter().any(|f| f.matches(doc)),
            Filter::Not { filter } => !filter.matches(doc),
            Filter::Eq { field, value } => resolve(doc, field).into_iter().any(|v| holds(v, value)),
            Filter::In { field, values } => resolve(doc, field)
                .into_iter()
                .any(|v| values.iter().any(|want| holds(v, want))),
            Filter::Contains { field, needle } => {
                let needle = needle.to_lowercase();
                resolve(doc, field)
                    .into_iter()
                    .flat_map(flatten_one)
                    .any(|v| v.as_str().is_some_and(|s| s.to_lowercase().contains(&needle)))
            }
            Filter::Missing { field } => resolve(doc, field).iter().all(|v| v.is_null()),
            Filter::Blank { field } => {
                let found = resolve(doc, field);
                found.is_empty()
                    || found
                        .iter()
                        .any(|v| v.is_null() || v.as_str().is_some_and(|s| s.trim().is_empty()))
            }
            Filter::EmptyArray { field } => resolve(doc, field)
                .into_iter()
                .any(|v| v.as_array().is_some_and(Vec::is_empty)),
            Filter::Range { field, bound, value } => resolve(doc, field)
                .into_iter()
                .flat_map(flatten_one)
                .any(|v| match compare(v, value) {
                    Some(Ordering::Equal) => true,
                    Some(Ordering::Greater) => *bound == Bound::Gte,
                    Some(Ordering::Less) => *bound == Bound::Lte,
                    None => false,
                }),
        }
    }
}

/// Resolve a dotted path, traversing into array elements along the way.
fn resolve<'a>(doc: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut current = vec![doc];
    for segment in path.split('.') {
        let mut next = Vec::new();
        for value in current {
            match value {
                Value::Object(map) => {
                    if let Some(v) = map.get(segment) {
                        next.push(v);
                    }
                }
                Value::Array(items) => {
                    if let Ok(idx) = segment.parse::<usize>() {
                        if let Some(v) = items.get(idx) {
                            next.push(v);
                        }
                    } else {
                        next.extend(
                            items
                                .iter()
                                .filter_map(|item| item.as_object().and_then(|m| m.get(segment))),
                        );
                    }
                }
                _ => {}
            }
        }
        current = next;
    }
    current
}

fn flatten_one(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

fn holds(found: &Value, want: &Value) -> bool {
    json_eq(found, want) || found.as_array().is_some_and(|items| items.iter().any(|v| json_eq(v, want)))
}

fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn compare(found: &Value, bound: &RangeValue) -> Option<Ordering> {
    match bound {
        RangeValue::Int(i) => found.as_f64()?.partial_cmp(&(*i as f64)),
        RangeValue::Float(f) => found.as_f64()?.partial_cmp(f),
        RangeValue::Date(d) => {
            let parsed = DateTime::parse_from_rfc3339(found.as_str()?).ok()?;
            Some(parsed.with_timezone(&Utc).cmp(d))
        }
    }
}
