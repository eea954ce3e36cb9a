//! Environment-driven configuration for the storage layer.

use std::time::Duration;

use thiserror::Error;

use crate::transaction::RetryPolicy;

pub const TXN_MAX_ATTEMPTS: &str = "FUNDCRM_TXN_MAX_ATTEMPTS";
pub const TXN_MAX_COMMIT_ATTEMPTS: &str = "FUNDCRM_TXN_MAX_COMMIT_ATTEMPTS";
pub const TXN_BASE_DELAY_MS: &str = "FUNDCRM_TXN_BASE_DELAY_MS";
pub const TXN_MAX_DELAY_MS: &str = "FUNDCRM_TXN_MAX_DELAY_MS";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}: expected {expected}, got '{value}'")]
    Invalid {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Parse an optional positive integer setting.
pub fn parse_positive(key: &'static str, raw: Option<String>) -> Result<Option<u64>, ConfigError> {
    let Some(value) = raw else {
        return Ok(None);
    };
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => Err(ConfigError::Invalid {
            key,
            value,
            expected: "a positive integer",
        }),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionConfig {
    pub retry: RetryPolicy,
}

impl TransactionConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset keys keep their defaults;
    /// set-but-invalid keys are an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut retry = RetryPolicy::default();

        if let Some(n) = parse_positive(TXN_MAX_ATTEMPTS, lookup(TXN_MAX_ATTEMPTS))? {
            retry.max_attempts = clamp_u32(n);
        }
        if let Some(n) = parse_positive(TXN_MAX_COMMIT_ATTEMPTS, lookup(TXN_MAX_COMMIT_ATTEMPTS))? {
            retry.max_commit_attempts = clamp_u32(n);
        }
        if let Some(ms) = parse_positive(TXN_BASE_DELAY_MS, lookup(TXN_BASE_DELAY_MS))? {
            retry.base_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_positive(TXN_MAX_DELAY_MS, lookup(TXN_MAX_DELAY_MS))? {
            retry.max_delay = Duration::from_millis(ms);
        }

        if retry.max_delay < retry.base_delay {
            return Err(ConfigError::Invalid {
                key: TXN_MAX_DELAY_MS,
                value: retry.max_delay.as_millis().to_string(),
                expected: "a value no smaller than the base delay",
            });
        }

        Ok(Self { retry })
    }
}

fn clamp_u32(n: u64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = TransactionConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.retry, RetryPolicy::default());
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = TransactionConfig::from_lookup(lookup(&[
            (TXN_MAX_ATTEMPTS, "3"),
            (TXN_MAX_COMMIT_ATTEMPTS, "5"),
            (TXN_BASE_DELAY_MS, "2"),
            (TXN_MAX_DELAY_MS, "40"),
        ]))
        .unwrap();
        assert_eq!(cfg.retry.max_attempts, 3);
        assert_eq!(cfg.retry.max_commit_attempts, 5);
        assert_eq!(cfg.retry.base_delay, Duration::from_millis(2));
        assert_eq!(cfg.retry.max_delay, Duration::from_millis(40));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = TransactionConfig::from_lookup(lookup(&[(TXN_MAX_ATTEMPTS, "many")])).unwrap_err();
        assert!(err.to_string().starts_with(TXN_MAX_ATTEMPTS));

        assert!(TransactionConfig::from_lookup(lookup(&[(TXN_MAX_COMMIT_ATTEMPTS, "0")])).is_err());
        assert!(TransactionConfig::from_lookup(lookup(&[(TXN_BASE_DELAY_MS, "50"), (TXN_MAX_DELAY_MS, "10")])).is_err());
    }
}
