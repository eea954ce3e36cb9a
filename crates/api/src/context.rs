use serde::{Deserialize, Serialize};

use fundcrm_access::{PortalType, RequestContext, ScopeFilter};
use fundcrm_auth::Principal;
use fundcrm_core::UserId;

/// One statically configured bearer token and the identity it carries.
///
/// Stands in for a real identity provider in dev and tests. The handlers only
/// ever see the resulting [`RequestContext`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevToken {
    pub token: String,
    pub user_id: UserId,
    pub role: String,
    pub portal: PortalType,
    #[serde(default)]
    pub permission_list: Vec<String>,
    #[serde(default)]
    pub filter: ScopeFilter,
}

impl DevToken {
    pub fn to_context(&self) -> RequestContext {
        let principal = Principal {
            user_id: self.user_id,
            role: self.role.clone(),
            permission_list: self.permission_list.clone(),
        };
        RequestContext::new(self.portal, principal).with_filter(self.filter.clone())
    }
}
