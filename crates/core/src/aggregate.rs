//! Aggregate root trait and optimistic concurrency expectations.

use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};

/// Aggregate root: an entity whose persisted state carries a version.
///
/// Every successful save bumps the version by one. Stores compare it against an
/// [`ExpectedVersion`] to reject a write computed from a stale snapshot.
pub trait AggregateRoot: Entity {
    /// Monotonically increasing version of the persisted state.
    fn version(&self) -> u64;

    /// Expectation that pins a later save to the version this snapshot was read at.
    fn expected_version(&self) -> ExpectedVersion {
        ExpectedVersion::Exact(self.version())
    }
}

/// Optimistic concurrency expectation for an aggregate.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (migrations, administrative overrides).
    Any,
    /// Require the aggregate to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}
