//! `fundcrm-auth`: role/resource/action permission model.
//!
//! This crate has no HTTP or storage dependencies: the registry is
//! a build-once static table and the checker is a pure function over it.

pub mod checker;
pub mod permissions;
pub mod principal;
pub mod registry;
pub mod resources;
pub mod roles;

pub use checker::{PermissionCheck, check_permissions, effective_permissions, missing_permissions};
pub use permissions::{Permission, parse_permissions};
pub use principal::Principal;
pub use registry::{PermissionDefinition, PermissionRegistry, RoleDefinition, registry};
pub use resources::{Action, Resource};
pub use roles::Role;
