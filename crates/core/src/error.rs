//! Core error model shared by every layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across the core crates.
pub type CoreResult<T> = Result<T, CoreError>;

/// Externally visible error.
///
/// Every variant carries a human message naming the specific entity or field
/// involved. Storage-internal retry classes live in `fundcrm-infra` and never
/// reach this type unless retries are exhausted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Caller lacks a permission, or targets an id outside its resolved scope.
    #[error("access denied: {0}")]
    Authorization(String),

    /// A value failed validation (e.g. malformed filter input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was malformed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A resource that must exist after an insert does not.
    #[error("creation invariant violated: {0}")]
    CreationInvariant(String),

    /// A storage failure that is not retryable by the caller.
    #[error("storage failure: {0}")]
    Storage(String),
}

/// Stable classification of a [`CoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Authorization,
    Validation,
    InvalidId,
    NotFound,
    CreationInvariant,
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Authorization => "authorization",
            ErrorKind::Validation => "validation",
            ErrorKind::InvalidId => "invalid_id",
            ErrorKind::NotFound => "not_found",
            ErrorKind::CreationInvariant => "creation_invariant",
            ErrorKind::Storage => "storage",
        }
    }

    /// HTTP-style status classification.
    pub fn status(&self) -> u16 {
        match self {
            ErrorKind::Authorization => 403,
            ErrorKind::Validation | ErrorKind::InvalidId => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::CreationInvariant => 500,
            ErrorKind::Storage => 503,
        }
    }
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CoreError {
    /// Scope violation for a specific entity kind and id.
    pub fn denied(entity: &str, id: impl core::fmt::Display) -> Self {
        Self::Authorization(format!("{entity} {id} is outside the caller's scope"))
    }

    pub fn authorization(msg: impl Into<String>) -> Self {
        Self::Authorization(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn creation_invariant(msg: impl Into<String>) -> Self {
        Self::CreationInvariant(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Authorization(_) => ErrorKind::Authorization,
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::InvalidId(_) => ErrorKind::InvalidId,
            CoreError::NotFound(_) => ErrorKind::NotFound,
            CoreError::CreationInvariant(_) => ErrorKind::CreationInvariant,
            CoreError::Storage(_) => ErrorKind::Storage,
        }
    }

    pub fn status(&self) -> u16 {
        self.kind().status()
    }

    /// The bare message, without the kind prefix added by `Display`.
    pub fn message(&self) -> &str {
        match self {
            CoreError::Authorization(m)
            | CoreError::Validation(m)
            | CoreError::InvalidId(m)
            | CoreError::NotFound(m)
            | CoreError::CreationInvariant(m)
            | CoreError::Storage(m) => m,
        }
    }

    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: self.kind(),
            message: self.message().to_string(),
            status: self.status(),
        }
    }
}

/// Uniform serialized error form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorKind,
    pub message: String,
    pub status: u16,
}

impl From<&CoreError> for ErrorEnvelope {
    fn from(value: &CoreError) -> Self {
        value.to_envelope()
    }
}

/// Turn a lookup miss into [`CoreError::NotFound`].
pub fn require_found<T>(value: Option<T>, what: impl core::fmt::Display) -> CoreResult<T> {
    value.ok_or_else(|| CoreError::not_found(format!("{what} does not exist")))
}

/// Turn a missing post-insert read into [`CoreError::CreationInvariant`].
pub fn require_created<T>(value: Option<T>, what: impl core::fmt::Display) -> CoreResult<T> {
    value.ok_or_else(|| CoreError::creation_invariant(format!("{what} was not found after insert")))
}
