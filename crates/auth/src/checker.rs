//! Role + ad hoc grant evaluation.
//!
//! - No IO
//! - No panics
//! - Pure function of the registry, the principal and the inputs

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::{Permission, Principal, registry};

/// Outcome of [`check_permissions`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PermissionCheck {
    /// `require_all = true`: every required permission is held.
    All(bool),
    /// `require_all = false`: per-permission capability map.
    Each(BTreeMap<Permission, bool>),
}

impl PermissionCheck {
    /// True iff every checked permission is held.
    pub fn is_granted(&self) -> bool {
        match self {
            PermissionCheck::All(granted) => *granted,
            PermissionCheck::Each(map) => map.values().all(|held| *held),
        }
    }
}

/// Union of the role's static set and the principal's ad hoc grants.
///
/// An unknown role contributes nothing.
pub fn effective_permissions(role: &str, principal: &Principal) -> HashSet<Permission> {
    let mut effective = principal.grants();
    if let Some(static_set) = registry().permissions_for_name(role) {
        effective.extend(static_set.iter().copied());
    }
    effective
}

/// Evaluate `required` against `role` plus the principal's ad hoc grants.
///
/// With `require_all` the result is AND over `required` (vacuously true when
/// empty); otherwise it is the per-permission map.
pub fn check_permissions(
    role: &str,
    principal: &Principal,
    required: &[Permission],
    require_all: bool,
) -> PermissionCheck {
    let effective = effective_permissions(role, principal);
    if require_all {
        PermissionCheck::All(required.iter().all(|p| effective.contains(p)))
    } else {
        PermissionCheck::Each(required.iter().map(|p| (*p, effective.contains(p))).collect())
    }
}

/// Required permissions the principal does not hold, in input order.
pub fn missing_permissions(role: &str, principal: &Principal, required: &[Permission]) -> Vec<Permission> {
    let effective = effective_permissions(role, principal);
    required.iter().filter(|p| !effective.contains(p)).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Action, Resource, Role};
    use fundcrm_core::UserId;
    use proptest::prelude::*;

    fn perm(s: &str) -> Permission {
        s.parse().unwrap()
    }

    fn principal(role: &str) -> Principal {
        Principal::new(UserId::new(), role)
    }

    #[test]
    fn funder_user_partial_capability_map() {
        let user = principal("funder_user");
        let required = [perm("merchant:read"), perm("merchant:delete")];
        let result = check_permissions(&user.role, &user, &required, false);

        let PermissionCheck::Each(map) = &result else {
            panic!("expected per-permission map");
        };
        assert_eq!(map.get(&perm("merchant:read")), Some(&true));
        assert_eq!(map.get(&perm("merchant:delete")), Some(&false));
        assert!(!result.is_granted());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json, serde_json::json!({"merchant:delete": false, "merchant:read": true}));
    }

    #[test]
    fn require_all_is_and_semantics() {
        let user = principal("funder_user");
        let both = [perm("merchant:read"), perm("merchant:delete")];
        assert_eq!(check_permissions(&user.role, &user, &both, true), PermissionCheck::All(false));
        let one = [perm("merchant:read")];
        assert_eq!(check_permissions(&user.role, &user, &one, true), PermissionCheck::All(true));
        assert_eq!(check_permissions(&user.role, &user, &[], true), PermissionCheck::All(true));
    }

    #[test]
    fn unknown_role_is_empty_set() {
        let user = principal("superuser");
        assert!(!check_permissions(&user.role, &user, &[perm("user:self")], true).is_granted());
    }

    #[test]
    fn ad_hoc_grants_extend_role() {
        let user = principal("funder_user").with_grants(["merchant:delete", "garbage"]);
        assert!(check_permissions(&user.role, &user, &[perm("merchant:delete")], true).is_granted());
    }

    #[test]
    fn unknown_role_with_grants_gets_only_grants() {
        let user = principal("contractor").with_grants(["report:read"]);
        assert!(check_permissions(&user.role, &user, &[perm("report:read")], true).is_granted());
        assert!(!check_permissions(&user.role, &user, &[perm("report:export")], true).is_granted());
    }

    #[test]
    fn missing_lists_only_absent() {
        let user = principal("merchant");
        let required = [perm("merchant:read"), perm("merchant:delete"), perm("funding:approve")];
        assert_eq!(
            missing_permissions(&user.role, &user, &required),
            vec![perm("merchant:delete"), perm("funding:approve")]
        );
    }

    fn any_permission() -> impl Strategy<Value = Permission> {
        (0..Resource::ALL.len(), 0..Action::ALL.len())
            .prop_map(|(r, a)| Permission::new(Resource::ALL[r], Action::ALL[a]))
    }

    fn any_role() -> impl Strategy<Value = Role> {
        (0..Role::ALL.len()).prop_map(|i| Role::ALL[i])
    }

    proptest! {
        /// Property: with no ad hoc grants, a check passes iff the role's static set holds the permission.
        #[test]
        fn static_check_matches_registry(role in any_role(), p in any_permission()) {
            let user = principal(role.as_str());
            let granted = check_permissions(role.as_str(), &user, &[p], true).is_granted();
            prop_assert_eq!(granted, registry().role_grants(role, p));
        }

        /// Property: adding ad hoc grants never turns a passing check into a failing one.
        #[test]
        fn grants_are_monotonic(
            role in any_role(),
            required in prop::collection::vec(any_permission(), 0..6),
            extra in prop::collection::vec(any_permission(), 0..12),
        ) {
            let base = principal(role.as_str());
            let widened = base.clone().with_grants(extra.iter().map(ToString::to_string));

            let before = check_permissions(role.as_str(), &base, &required, false);
            let after = check_permissions(role.as_str(), &widened, &required, false);
            let (PermissionCheck::Each(before), PermissionCheck::Each(after)) = (before, after) else {
                panic!("expected maps");
            };
            for (p, held) in before {
                if held {
                    prop_assert!(after[&p]);
                }
            }
        }
    }
}
