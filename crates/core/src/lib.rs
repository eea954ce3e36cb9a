//! `fundcrm-core`: shared foundation: error model, identifiers, money.
//!
//! This crate has no knowledge of HTTP, storage, or authorization policy.

pub mod error;
pub mod id;
pub mod money;

pub use error::{CoreError, CoreResult, ErrorEnvelope, ErrorKind, require_created, require_found};
pub use id::{EntityId, UserId};
pub use money::{cents_to_dollars, dollars_to_cents};
