//! Process configuration for the API binary.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use fundcrm_infra::Association;

use crate::context::DevToken;

pub const BIND_ADDR: &str = "FUNDCRM_BIND_ADDR";
pub const SEED_FILE: &str = "FUNDCRM_SEED_FILE";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error)]
pub enum ApiConfigError {
    #[error("FUNDCRM_BIND_ADDR: '{0}' is not a socket address")]
    BindAddr(String),

    #[error("seed file {path}: {source}")]
    SeedRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("seed file {path}: {source}")]
    SeedParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub seed_file: Option<PathBuf>,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ApiConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiConfigError> {
        let raw = lookup(BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw.trim().parse().map_err(|_| ApiConfigError::BindAddr(raw.clone()))?;

        let seed_file = lookup(SEED_FILE)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        Ok(Self { bind_addr, seed_file })
    }

    /// Load seed data. An unset or missing file yields an empty seed.
    pub fn load_seed(&self) -> Result<SeedData, ApiConfigError> {
        match &self.seed_file {
            None => {
                warn!("{SEED_FILE} not set; starting with no dev tokens");
                Ok(SeedData::default())
            }
            Some(path) if !path.exists() => {
                warn!(path = %path.display(), "seed file not found; starting with no dev tokens");
                Ok(SeedData::default())
            }
            Some(path) => SeedData::from_file(path),
        }
    }
}

/// Dev tokens and tenant-graph links loaded at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub tokens: Vec<DevToken>,
    #[serde(default)]
    pub associations: Vec<Association>,
}

impl SeedData {
    pub fn from_file(path: &Path) -> Result<Self, ApiConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ApiConfigError::SeedRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw).map_err(|source| ApiConfigError::SeedParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = ApiConfig::from_lookup(|_| None).unwrap();
        assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR.parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.seed_file, None);
        assert_eq!(cfg.load_seed().unwrap(), SeedData::default());
    }

    #[test]
    fn invalid_bind_addr_is_an_error() {
        let err = ApiConfig::from_lookup(|k| (k == BIND_ADDR).then(|| "localhost".to_string())).unwrap_err();
        assert!(matches!(err, ApiConfigError::BindAddr(_)));
    }

    #[test]
    fn missing_seed_file_starts_empty() {
        let cfg = ApiConfig::from_lookup(|k| (k == SEED_FILE).then(|| "/nonexistent/fundcrm-seed.json".to_string()))
            .unwrap();
        assert_eq!(cfg.load_seed().unwrap(), SeedData::default());
    }

    #[test]
    fn seed_json_parses() {
        let raw = r#"{
            "tokens": [{
                "token": "dev-admin",
                "user_id": "0190f5a2-4c1e-7000-8000-000000000001",
                "role": "admin",
                "portal": "admin"
            }],
            "associations": [{
                "from_kind": "funder",
                "from_id": "0190f5a2-4c1e-7000-8000-0000000000f1",
                "to_kind": "merchant",
                "to_id": "0190f5a2-4c1e-7000-8000-0000000000a1"
            }]
        }"#;
        let seed = SeedData::from_json(raw).unwrap();
        assert_eq!(seed.tokens.len(), 1);
        assert_eq!(seed.tokens[0].role, "admin");
        assert_eq!(seed.associations.len(), 1);
    }
}
