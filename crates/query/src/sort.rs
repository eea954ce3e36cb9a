//! Sort specification parsed from `field,-other` strings.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Ordered field → direction mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec(Vec<(String, SortDirection)>);

impl SortSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.set(field.into(), direction);
        self
    }

    /// Parse a comma-separated list; a leading `-` sorts descending.
    ///
    /// A repeated field keeps its first position and takes the last direction.
    pub fn parse(raw: &str) -> Self {
        let mut spec = Self::new();
        for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (field, direction) = match part.strip_prefix('-') {
                Some(rest) => (rest.trim(), SortDirection::Desc),
                None => (part.trim_start_matches('+').trim(), SortDirection::Asc),
            };
            if !field.is_empty() {
                spec.set(field.to_string(), direction);
            }
        }
        spec
    }

    fn set(&mut self, field: String, direction: SortDirection) {
        match self.0.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = direction,
            None => self.0.push((field, direction)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &[(String, SortDirection)] {
        &self.0
    }

    /// Compare two documents by this spec (missing sorts first ascending).
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        for (field, direction) in &self.0 {
            let ord = compare_values(lookup(a, field), lookup(b, field));
            let ord = match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    pub fn sort(&self, docs: &mut [Value]) {
        if !self.is_empty() {
            docs.sort_by(|a, b| self.compare(a, b));
        }
    }
}

/// Parse `raw` or fall back to `default` when no sort is given.
pub fn sort_spec(raw: Option<&str>, default: &SortSpec) -> SortSpec {
    match raw.map(SortSpec::parse) {
        Some(spec) if !spec.is_empty() => spec,
        _ => default.clone(),
    }
}

fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(doc, |v, seg| v.get(seg))
        .filter(|v| !v.is_null())
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_directions_in_order() {
        let spec = SortSpec::parse("-funded_at, name,+amount");
        assert_eq!(
            spec.fields(),
            &[
                ("funded_at".to_string(), SortDirection::Desc),
                ("name".to_string(), SortDirection::Asc),
                ("amount".to_string(), SortDirection::Asc),
            ]
        );
    }

    #[test]
    fn repeated_field_keeps_position() {
        let spec = SortSpec::parse("name,amount,-name");
        assert_eq!(
            spec.fields(),
            &[
                ("name".to_string(), SortDirection::Desc),
                ("amount".to_string(), SortDirection::Asc),
            ]
        );
    }

    #[test]
    fn falls_back_to_default() {
        let default = SortSpec::new().by("created_at", SortDirection::Desc);
        assert_eq!(sort_spec(None, &default), default);
        assert_eq!(sort_spec(Some(" , "), &default), default);
        assert_ne!(sort_spec(Some("name"), &default), default);
    }

    #[test]
    fn sorts_documents() {
        let mut docs = vec![
            json!({"name": "b", "amount": 5}),
            json!({"name": "a", "amount": 5}),
            json!({"name": "c", "amount": 9}),
            json!({"name": "d"}),
        ];
        SortSpec::parse("-amount,name").sort(&mut docs);
        let names: Vec<_> = docs.iter().map(|d| d["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["c", "a", "b", "d"]);
    }
}
