//! Unit-of-work seam between the transaction runner and a storage driver.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use fundcrm_core::CoreError;

/// Read isolation requested when a transaction starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadConcern {
    Local,
    Majority,
    #[default]
    Snapshot,
}

/// Write acknowledgement requested when a transaction starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteConcern {
    Acknowledged,
    #[default]
    Majority,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOptions {
    pub read_concern: ReadConcern,
    pub write_concern: WriteConcern,
}

/// Which retry loop gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPhase {
    UnitOfWork,
    Commit,
}

impl core::fmt::Display for RetryPhase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RetryPhase::UnitOfWork => f.write_str("unit of work"),
            RetryPhase::Commit => f.write_str("commit"),
        }
    }
}

/// Storage driver error.
///
/// `Transient` and `UnknownCommitResult` are retried by the runner and never
/// reach callers directly; once a retry budget is spent they are reported as
/// `RetriesExhausted`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Safe to rerun the whole unit of work (e.g. write conflict).
    #[error("transient transaction error: {0}")]
    Transient(String),

    /// The commit may or may not have landed; re-committing is idempotent.
    #[error("unknown transaction commit result: {0}")]
    UnknownCommitResult(String),

    #[error("no active transaction")]
    NoActiveTransaction,

    #[error("transaction retries exhausted in {phase} after {attempts} attempts: {last}")]
    RetriesExhausted {
        phase: RetryPhase,
        attempts: u32,
        last: String,
    },

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn is_unknown_commit_result(&self) -> bool {
        matches!(self, StorageError::UnknownCommitResult(_))
    }
}

impl From<StorageError> for CoreError {
    fn from(value: StorageError) -> Self {
        CoreError::storage(value.to_string())
    }
}

/// Classifies errors the runner may retry by rerunning the unit of work.
pub trait TransientFailure {
    fn is_transient(&self) -> bool;
}

impl TransientFailure for StorageError {
    fn is_transient(&self) -> bool {
        matches!(self, StorageError::Transient(_))
    }
}

/// Error type for unit-of-work closures that mix storage and domain failures.
#[derive(Debug, Error)]
pub enum TxnError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl TransientFailure for TxnError {
    fn is_transient(&self) -> bool {
        match self {
            TxnError::Storage(e) => e.is_transient(),
            TxnError::Core(_) => false,
        }
    }
}

impl From<TxnError> for CoreError {
    fn from(value: TxnError) -> Self {
        match value {
            TxnError::Storage(e) => e.into(),
            TxnError::Core(e) => e,
        }
    }
}

/// A driver session that can host one transaction at a time.
#[async_trait::async_trait]
pub trait Session: Send + 'static {
    fn start_transaction(&mut self, options: &TransactionOptions) -> Result<(), StorageError>;

    async fn commit_transaction(&mut self) -> Result<(), StorageError>;

    /// A no-op when no transaction is active.
    async fn abort_transaction(&mut self) -> Result<(), StorageError>;

    /// Release the session. Called exactly once by the runner.
    async fn end_session(&mut self);
}

/// Hands out sessions (e.g. a client connection pool).
#[async_trait::async_trait]
pub trait SessionSource: Send + Sync {
    type Session: Session;

    async fn start_session(&self) -> Result<Self::Session, StorageError>;
}
