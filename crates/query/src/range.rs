//! Greater/less-or-equal filters over numbers, currency amounts and dates.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use fundcrm_core::{CoreError, CoreResult, dollars_to_cents};

use crate::filter::{Bound, RangeValue};
use crate::text::EMPTY_SENTINEL;
use crate::Filter;

/// How a raw bound string is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeKind {
    Number,
    /// Decimal dollars, compared against integer cents.
    Currency,
    /// RFC 3339 timestamp or `YYYY-MM-DD`.
    Date,
}

/// Build a single-bound range predicate.
///
/// `EMPTY` means "field is null or missing" and `-EMPTY` means "field is
/// present and non-null"; both override the comparison. A blank bound yields
/// `None`.
pub fn range_filter(field: &str, bound: Bound, raw: &str, kind: RangeKind) -> CoreResult<Option<Filter>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if raw == EMPTY_SENTINEL {
        return Ok(Some(Filter::missing(field)));
    }
    if raw.strip_prefix('-') == Some(EMPTY_SENTINEL) {
        return Ok(Some(Filter::not(Filter::missing(field))));
    }

    let value = match kind {
        RangeKind::Number => parse_number(field, raw)?,
        RangeKind::Currency => RangeValue::Int(dollars_to_cents(parse_f64(field, raw)?)),
        RangeKind::Date => RangeValue::Date(parse_date(field, raw, bound)?),
    };
    Ok(Some(Filter::range(field, bound, value)))
}

/// Both bounds at once; absent or blank bounds are skipped.
pub fn between(field: &str, min: Option<&str>, max: Option<&str>, kind: RangeKind) -> CoreResult<Option<Filter>> {
    let mut parts = Vec::new();
    if let Some(f) = min.map(|raw| range_filter(field, Bound::Gte, raw, kind)).transpose()?.flatten() {
        parts.push(f);
    }
    if let Some(f) = max.map(|raw| range_filter(field, Bound::Lte, raw, kind)).transpose()?.flatten() {
        parts.push(f);
    }
    Ok((!parts.is_empty()).then(|| Filter::and(parts)))
}

fn parse_f64(field: &str, raw: &str) -> CoreResult<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| CoreError::validation(format!("{field}: '{raw}' is not a number")))
}

fn parse_number(field: &str, raw: &str) -> CoreResult<RangeValue> {
    if let Ok(i) = raw.parse::<i64>() {
        return Ok(RangeValue::Int(i));
    }
    parse_f64(field, raw).map(RangeValue::Float)
}

/// Date-only upper bounds include the whole day.
fn parse_date(field: &str, raw: &str, bound: Bound) -> CoreResult<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| CoreError::validation(format!("{field}: '{raw}' is not a date")))?;
    let (h, m, s, ms) = match bound {
        Bound::Gte => (0, 0, 0, 0),
        Bound::Lte => (23, 59, 59, 999),
    };
    let time = NaiveTime::from_hms_milli_opt(h, m, s, ms)
        .ok_or_else(|| CoreError::validation(format!("{field}: '{raw}' has no valid time of day")))?;
    Ok(day.and_time(time).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundcrm_core::ErrorKind;
    use serde_json::json;

    #[test]
    fn currency_bounds_compare_in_cents() {
        let f = range_filter("amount", Bound::Gte, "10.005", RangeKind::Currency)
            .unwrap()
            .unwrap();
        assert_eq!(f, Filter::range("amount", Bound::Gte, RangeValue::Int(1001)));
        assert!(f.matches(&json!({"amount": 1001})));
        assert!(!f.matches(&json!({"amount": 1000})));
    }

    #[test]
    fn number_bounds() {
        let f = range_filter("factor", Bound::Lte, "1.35", RangeKind::Number).unwrap().unwrap();
        assert!(f.matches(&json!({"factor": 1.3})));
        assert!(!f.matches(&json!({"factor": 1.4})));

        let f = range_filter("term", Bound::Gte, "90", RangeKind::Number).unwrap().unwrap();
        assert_eq!(f, Filter::range("term", Bound::Gte, RangeValue::Int(90)));
    }

    #[test]
    fn sentinels_override_comparison() {
        let f = range_filter("closed_at", Bound::Gte, "EMPTY", RangeKind::Date).unwrap().unwrap();
        assert_eq!(f, Filter::missing("closed_at"));
        assert!(f.matches(&json!({"closed_at": null})));

        let f = range_filter("closed_at", Bound::Lte, "-EMPTY", RangeKind::Date).unwrap().unwrap();
        assert!(f.matches(&json!({"closed_at": "2024-01-01T00:00:00Z"})));
        assert!(!f.matches(&json!({})));
    }

    #[test]
    fn date_only_upper_bound_includes_the_day() {
        let f = range_filter("funded_at", Bound::Lte, "2024-03-10", RangeKind::Date).unwrap().unwrap();
        assert!(f.matches(&json!({"funded_at": "2024-03-10T18:30:00Z"})));
        assert!(!f.matches(&json!({"funded_at": "2024-03-11T00:00:00Z"})));

        let f = range_filter("funded_at", Bound::Gte, "2024-03-10", RangeKind::Date).unwrap().unwrap();
        assert!(f.matches(&json!({"funded_at": "2024-03-10T00:00:00Z"})));
        assert!(!f.matches(&json!({"funded_at": "2024-03-09T23:59:59Z"})));
    }

    #[test]
    fn malformed_bounds_are_validation_errors() {
        let err = range_filter("amount", Bound::Gte, "ten", RangeKind::Currency).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.message().starts_with("amount"));
        assert!(range_filter("d", Bound::Gte, "03/10/2024", RangeKind::Date).is_err());
        assert!(range_filter("n", Bound::Gte, "NaN", RangeKind::Number).is_err());
    }

    #[test]
    fn between_combines_bounds() {
        let f = between("amount", Some("5"), Some("10"), RangeKind::Currency).unwrap().unwrap();
        assert!(f.matches(&json!({"amount": 750})));
        assert!(!f.matches(&json!({"amount": 1001})));
        assert_eq!(between("amount", None, Some("  "), RangeKind::Currency).unwrap(), None);
    }
}
