//! Transactional unit-of-work execution.

mod retry;
mod runner;
mod session;

pub use retry::{BackoffStrategy, RetryPolicy};
pub use runner::TransactionRunner;
pub use session::{
    ReadConcern, RetryPhase, Session, SessionSource, StorageError, TransactionOptions, TransientFailure, TxnError,
    WriteConcern,
};
