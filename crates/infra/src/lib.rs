//! Infrastructure layer: transactions, storage adapters, config.

pub mod config;
pub mod store;
pub mod transaction;


pub use config::{ConfigError, TransactionConfig};
pub use store::{Association, InMemoryAssociations, InMemoryDocumentStore, InMemorySession};
pub use transaction::{
    RetryPolicy, Session, SessionSource, StorageError, TransactionOptions, TransactionRunner, TransientFailure, TxnError,
};
