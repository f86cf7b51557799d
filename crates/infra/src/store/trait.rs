use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use cashpoint_core::{AtmId, ExpectedVersion};
use cashpoint_dispenser::Atm;

/// Store operation error.
///
/// These are **infrastructure errors** (storage, concurrency) as opposed to domain
/// errors (validation, infeasible withdrawals).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Conflict(String),

    #[error("atm {0} not found")]
    NotFound(AtmId),

    #[error("atm {0} already exists")]
    AlreadyExists(AtmId),

    #[error("record serialization failed: {0}")]
    Serialization(String),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Persistence collaborator for ATM records.
///
/// ## Save semantics
///
/// `save()`:
/// - fails with `NotFound` if the record was never created
/// - compares the stored version against `expected_version` and fails with
///   `Conflict` on mismatch, leaving the stored record untouched
/// - otherwise writes inventory and total together, bumps the version by one and
///   stamps `updated_at`, returning the record as stored
///
/// The engine never coordinates a read-compute-write cycle; the version check here
/// is what keeps two withdrawals from spending the same snapshot.
#[async_trait]
pub trait AtmStore: Send + Sync {
    /// Persist a freshly opened unit.
    async fn create(&self, atm: Atm) -> Result<Atm, StoreError>;

    /// Load a unit by id; `None` if it doesn't exist.
    async fn load(&self, id: AtmId) -> Result<Option<Atm>, StoreError>;

    async fn save(&self, atm: Atm, expected_version: ExpectedVersion) -> Result<Atm, StoreError>;
}

#[async_trait]
impl<S> AtmStore for Arc<S>
where
    S: AtmStore + ?Sized,
{
    async fn create(&self, atm: Atm) -> Result<Atm, StoreError> {
        (**self).create(atm).await
    }

    async fn load(&self, id: AtmId) -> Result<Option<Atm>, StoreError> {
        (**self).load(id).await
    }

    async fn save(&self, atm: Atm, expected_version: ExpectedVersion) -> Result<Atm, StoreError> {
        (**self).save(atm, expected_version).await
    }
}
