use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use fundcrm_core::CoreError;

use crate::{Action, Resource};

/// Permission identifier: the pair `resource:action`.
///
/// Identity is the pair itself, so two permissions compare equal iff they name
/// the same resource and action. The string form is stable and is what tokens,
/// ad hoc grants, and API payloads carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Permission {
    resource: Resource,
    action: Action,
}

impl Permission {
    pub const fn new(resource: Resource, action: Action) -> Self {
        Self { resource, action }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn action(&self) -> Action {
        self.action
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.resource, self.action)
    }
}

impl FromStr for Permission {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (resource, action) = s
            .split_once(':')
            .ok_or_else(|| CoreError::validation(format!("permission '{s}' is not resource:action")))?;
        Ok(Self::new(resource.trim().parse()?, action.trim().parse()?))
    }
}

impl Serialize for Permission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a list of permission strings, e.g. from a query parameter.
pub fn parse_permissions<'a, I>(raw: I) -> Result<Vec<Permission>, CoreError>
where
    I: IntoIterator<Item = &'a str>,
{
    raw.into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}
