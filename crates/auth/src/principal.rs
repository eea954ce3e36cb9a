use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use fundcrm_core::UserId;

use crate::Permission;

/// Authenticated principal as established by the authentication layer.
///
/// `role` is kept as the raw name carried by the token so that an unknown role
/// degrades to "no permissions" instead of failing authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub role: String,
    /// Ad hoc per-user grants, in `resource:action` form.
    #[serde(default)]
    pub permission_list: Vec<String>,
}

impl Principal {
    pub fn new(user_id: UserId, role: impl Into<String>) -> Self {
        Self {
            user_id,
            role: role.into(),
            permission_list: Vec::new(),
        }
    }

    pub fn with_grants<I, S>(mut self, grants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permission_list.extend(grants.into_iter().map(Into::into));
        self
    }

    /// Ad hoc grants that parse as permissions.
    ///
    /// Malformed entries are skipped: they could never match a required
    /// permission, so dropping them cannot narrow or widen access.
    pub fn grants(&self) -> HashSet<Permission> {
        self.permission_list
            .iter()
            .filter_map(|raw| match raw.parse::<Permission>() {
                Ok(p) => Some(p),
                Err(e) => {
                    tracing::warn!(user_id = %self.user_id, grant = %raw, error = %e, "ignoring malformed ad hoc grant");
                    None
                }
            })
            .collect()
    }
}
