//! In-memory storage adapters (tests/dev).

mod associations;
mod in_memory;

pub use associations::{Association, InMemoryAssociations};
pub use in_memory::{InMemoryDocumentStore, InMemorySession};
