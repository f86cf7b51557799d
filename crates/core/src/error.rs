//! Errors raised by domain values and rules, before any storage is involved.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Input that can never form a valid value (a zero denomination, an empty set).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An operation would leave a value outside what it can represent.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// Text that does not parse as an identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A write computed from a snapshot whose version has since moved.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}
