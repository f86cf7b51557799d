//! ATM operations as seen from the outside (application-level orchestration).
//!
//! Every mutating call runs the same pipeline:
//!
//! ```text
//! request
//!   ↓
//! 1. Load the unit from the store (NotFound if missing)
//!   ↓
//! 2. Validate the request against the configured policy (keys, amount range, total)
//!   ↓
//! 3. Run the pure denomination engine on the loaded snapshot
//!   ↓
//! 4. Save inventory + total together, pinned to the loaded version
//! ```
//!
//! A failed save (conflict or backend error) leaves the stored record as it was and
//! is reported as an error, never as a successful withdrawal or deposit.

use std::collections::BTreeMap;

use chrono::Utc;
use thiserror::Error;
use tracing::instrument;

use cashpoint_core::{AggregateRoot, AtmId, DomainError};
use cashpoint_dispenser::{
    available_denominations, deposit, withdraw, Atm, Denomination, Deposited,
    InvalidDenominations, Inventory, Withdrawal, WithdrawalPlan,
};

use crate::config::AtmConfig;
use crate::store::{AtmStore, StoreError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("atm not found")]
    NotFound,

    #[error("banknotes cannot be empty")]
    EmptyDeposit,

    #[error(transparent)]
    InvalidDenominations(#[from] InvalidDenominations),

    /// The deposit would push a count or the total past `u64::MAX`. Nothing was written.
    #[error("deposit rejected: {0}")]
    DepositOverflow(DomainError),

    #[error("amount {amount} is outside the allowed range {min}..={max}")]
    AmountOutOfRange { amount: u64, min: u64, max: u64 },

    /// Requested more than the unit holds in total.
    #[error("insufficient funds")]
    InsufficientFunds { requested: u64, total: u64 },

    /// The record changed between load and save; nothing was written.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Persisting failed; nothing was written.
    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => ServiceError::Conflict(msg),
            StoreError::NotFound(_) => ServiceError::NotFound,
            other => ServiceError::Store(other),
        }
    }
}

/// Outcome of a validated withdrawal request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WithdrawOutcome {
    /// Notes handed out; `atm` is the record as saved afterwards.
    Dispensed { plan: WithdrawalPlan, atm: Atm },
    /// The amount is covered by the total but not by the note mix. Nothing changed.
    Infeasible { available: Vec<Denomination> },
}

impl WithdrawOutcome {
    /// Notes handed out; empty when nothing was dispensed.
    pub fn plan(&self) -> WithdrawalPlan {
        match self {
            WithdrawOutcome::Dispensed { plan, .. } => plan.clone(),
            WithdrawOutcome::Infeasible { .. } => WithdrawalPlan::empty(),
        }
    }
}

/// Boundary between callers and the denomination engine.
pub struct AtmService<S> {
    store: S,
    config: AtmConfig,
}

impl<S> AtmService<S>
where
    S: AtmStore,
{
    pub fn new(store: S, config: AtmConfig) -> Self {
        Self { store, config }
    }

    /// Register a new, empty unit.
    #[instrument(skip(self))]
    pub async fn open(&self) -> Result<Atm, ServiceError> {
        let atm = Atm::open(AtmId::new(), Utc::now());
        let created = self.store.create(atm).await.inspect_err(|e| {
            tracing::error!(error = %e, "failed to open atm");
        })?;

        tracing::info!(atm_id = %created.id_typed(), "atm opened");
        Ok(created)
    }

    #[instrument(skip(self), fields(atm_id = %id))]
    pub async fn get(&self, id: AtmId) -> Result<Atm, ServiceError> {
        self.store.load(id).await?.ok_or(ServiceError::NotFound)
    }

    /// Deposit banknotes keyed the way callers send them (`{"50": 2}`).
    ///
    /// Any key outside the configured set rejects the whole deposit.
    #[instrument(skip(self, banknotes), fields(atm_id = %id))]
    pub async fn add_banknotes(
        &self,
        id: AtmId,
        banknotes: &BTreeMap<String, u64>,
    ) -> Result<Atm, ServiceError> {
        let atm = self.get(id).await?;

        if banknotes.is_empty() {
            return Err(ServiceError::EmptyDeposit);
        }
        let counts = self.config.denominations.parse_counts(banknotes)?;

        let Deposited { inventory, total } =
            deposit(atm.inventory(), counts).map_err(ServiceError::DepositOverflow)?;
        let saved = self.persist(&atm, inventory, total).await?;

        tracing::info!(total = saved.total(), version = saved.version(), "banknotes added");
        Ok(saved)
    }

    /// Withdraw `amount`, choosing notes greedily from the largest denomination down.
    #[instrument(skip(self), fields(atm_id = %id))]
    pub async fn withdraw(&self, id: AtmId, amount: u64) -> Result<WithdrawOutcome, ServiceError> {
        let atm = self.get(id).await?;

        let limits = self.config.limits;
        if !limits.contains(amount) {
            return Err(ServiceError::AmountOutOfRange {
                amount,
                min: limits.min(),
                max: limits.max(),
            });
        }
        if amount > atm.total() {
            return Err(ServiceError::InsufficientFunds {
                requested: amount,
                total: atm.total(),
            });
        }

        match withdraw(atm.inventory(), amount) {
            Withdrawal::Infeasible { inventory, .. } => {
                let available = available_denominations(&inventory);
                tracing::info!(?available, "amount not payable with notes on hand");
                Ok(WithdrawOutcome::Infeasible { available })
            }
            Withdrawal::Dispensed {
                plan,
                inventory,
                total,
            } => {
                let saved = self.persist(&atm, inventory, total).await?;
                tracing::info!(total = saved.total(), version = saved.version(), "banknotes withdrawn");
                Ok(WithdrawOutcome::Dispensed { plan, atm: saved })
            }
        }
    }

    async fn persist(&self, atm: &Atm, inventory: Inventory, total: u64) -> Result<Atm, ServiceError> {
        let next = atm.with_inventory(inventory, total);

        match self.store.save(next, atm.expected_version()).await {
            Ok(saved) => Ok(saved),
            Err(StoreError::Conflict(msg)) => {
                tracing::warn!(%msg, "concurrent update; nothing saved");
                Err(ServiceError::Conflict(msg))
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to save atm; nothing saved");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use cashpoint_core::ExpectedVersion;

    use crate::store::InMemoryAtmStore;

    fn d(v: u32) -> Denomination {
        Denomination::new(v).unwrap()
    }

    fn raw(pairs: &[(&str, u64)]) -> BTreeMap<String, u64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn plan_of(outcome: &WithdrawOutcome) -> Vec<(u32, u64)> {
        outcome.plan().iter().map(|(d, c)| (d.value(), c)).collect()
    }

    fn service() -> AtmService<Arc<InMemoryAtmStore>> {
        AtmService::new(Arc::new(InMemoryAtmStore::new()), AtmConfig::default())
    }

    /// Open a unit stocked with `{5:3, 10:4, 25:5, 50:6}` (total 480).
    async fn stocked(svc: &AtmService<Arc<InMemoryAtmStore>>) -> AtmId {
        let id = svc.open().await.unwrap().id_typed();
        svc.add_banknotes(id, &raw(&[("5", 3), ("10", 4), ("25", 5), ("50", 6)]))
            .await
            .unwrap();
        id
    }

    #[tokio::test]
    async fn deposit_merges_into_stored_inventory() {
        let svc = service();
        let id = stocked(&svc).await;

        let atm = svc
            .add_banknotes(
                id,
                &raw(&[("1", 1), ("2", 2), ("5", 3), ("10", 4), ("25", 5), ("50", 6)]),
            )
            .await
            .unwrap();

        assert_eq!(atm.total(), 965);
        assert_eq!(atm.inventory().count(d(5)), 6);
        assert_eq!(atm.inventory().count(d(50)), 12);
        assert_eq!(svc.get(id).await.unwrap(), atm);
    }

    #[tokio::test]
    async fn deposit_with_unknown_key_changes_nothing() {
        let svc = service();
        let id = stocked(&svc).await;
        let before = svc.get(id).await.unwrap();

        let err = svc
            .add_banknotes(id, &raw(&[("50", 1), ("3", 1), ("7", 2)]))
            .await
            .unwrap_err();

        match err {
            ServiceError::InvalidDenominations(e) => assert_eq!(e.keys, vec!["3", "7"]),
            other => panic!("Expected InvalidDenominations, got {other:?}"),
        }
        assert_eq!(svc.get(id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn empty_deposit_is_rejected() {
        let svc = service();
        let id = stocked(&svc).await;

        let err = svc.add_banknotes(id, &BTreeMap::new()).await.unwrap_err();
        assert!(matches!(err, ServiceError::EmptyDeposit));
    }

    #[tokio::test]
    async fn overflowing_deposit_is_rejected_and_keeps_every_note() {
        let svc = service();
        let id = svc.open().await.unwrap().id_typed();
        let huge = u64::MAX / 50;

        let first = svc.add_banknotes(id, &raw(&[("50", huge)])).await.unwrap();
        assert_eq!(first.total(), huge * 50);

        let err = svc.add_banknotes(id, &raw(&[("50", huge)])).await.unwrap_err();
        assert!(matches!(err, ServiceError::DepositOverflow(_)));

        let err = svc.add_banknotes(id, &raw(&[("1", u64::MAX)])).await.unwrap_err();
        assert!(matches!(err, ServiceError::DepositOverflow(_)));

        // Two spellings of the same note still add up, and still overflow.
        let err = svc
            .add_banknotes(id, &raw(&[("050", u64::MAX), ("50", 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DepositOverflow(_)));

        assert_eq!(svc.get(id).await.unwrap(), first);
    }

    #[tokio::test]
    async fn unknown_atm_is_not_found() {
        let svc = service();

        let err = svc.add_banknotes(AtmId::new(), &raw(&[("50", 1)])).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));

        let err = svc.withdraw(AtmId::new(), 10).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));
    }

    #[tokio::test]
    async fn withdraw_dispenses_and_persists() {
        let svc = service();
        let id = stocked(&svc).await;

        let outcome = svc.withdraw(id, 145).await.unwrap();
        assert_eq!(plan_of(&outcome), vec![(10, 2), (25, 1), (50, 2)]);

        let atm = svc.get(id).await.unwrap();
        assert_eq!(atm.total(), 335);
        assert_eq!(atm.inventory().count(d(25)), 4);
    }

    #[tokio::test]
    async fn second_withdrawal_sees_first_one() {
        let svc = service();
        let id = stocked(&svc).await;

        let first = svc.withdraw(id, 300).await.unwrap();
        assert_eq!(plan_of(&first), vec![(50, 6)]);

        let second = svc.withdraw(id, 300).await.unwrap_err();
        assert!(matches!(
            second,
            ServiceError::InsufficientFunds {
                requested: 300,
                total: 180
            }
        ));
    }

    #[tokio::test]
    async fn withdraw_above_total_is_insufficient_funds() {
        let svc = service();
        let id = stocked(&svc).await;

        let err = svc.withdraw(id, 481).await.unwrap_err();
        assert!(matches!(err, ServiceError::InsufficientFunds { .. }));
        assert_eq!(svc.get(id).await.unwrap().total(), 480);
    }

    #[tokio::test]
    async fn denomination_infeasible_lists_available_notes() {
        let svc = service();
        let id = stocked(&svc).await;
        let before = svc.get(id).await.unwrap();

        let outcome = svc.withdraw(id, 4).await.unwrap();
        assert_eq!(
            outcome,
            WithdrawOutcome::Infeasible {
                available: vec![d(50), d(25), d(10), d(5)]
            }
        );
        assert!(outcome.plan().is_empty());
        assert_eq!(svc.get(id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn amount_outside_limits_is_rejected_before_engine_runs() {
        let svc = service();
        let id = stocked(&svc).await;

        let err = svc.withdraw(id, 0).await.unwrap_err();
        assert!(matches!(err, ServiceError::AmountOutOfRange { min: 1, max: 1000, .. }));

        let err = svc.withdraw(id, 1001).await.unwrap_err();
        assert!(matches!(err, ServiceError::AmountOutOfRange { amount: 1001, .. }));
    }

    /// Store whose writes always fail, to check nothing is reported as dispensed.
    struct ReadOnlyStore(InMemoryAtmStore);

    #[async_trait]
    impl AtmStore for ReadOnlyStore {
        async fn create(&self, atm: Atm) -> Result<Atm, StoreError> {
            self.0.create(atm).await
        }

        async fn load(&self, id: AtmId) -> Result<Option<Atm>, StoreError> {
            self.0.load(id).await
        }

        async fn save(&self, _atm: Atm, _expected: ExpectedVersion) -> Result<Atm, StoreError> {
            Err(StoreError::Backend("disk full".to_string()))
        }
    }

    #[tokio::test]
    async fn failed_save_is_not_reported_as_success() {
        let inner = InMemoryAtmStore::new();
        let notes = Inventory::from_counts([(d(50), 2)]).unwrap();
        let atm = inner.create(Atm::open(AtmId::new(), Utc::now())).await.unwrap();
        inner
            .save(atm.with_inventory(notes, 100), atm.expected_version())
            .await
            .unwrap();

        let svc = AtmService::new(ReadOnlyStore(inner), AtmConfig::default());
        let id = atm.id_typed();

        let err = svc.withdraw(id, 50).await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(StoreError::Backend(_))));

        let err = svc.add_banknotes(id, &raw(&[("10", 1)])).await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(_)));

        assert_eq!(svc.get(id).await.unwrap().total(), 100);
    }

    #[tokio::test]
    async fn stale_snapshot_surfaces_as_conflict() {
        let svc = service();
        let id = stocked(&svc).await;
        let snapshot = svc.get(id).await.unwrap();

        svc.withdraw(id, 100).await.unwrap();

        // A writer still holding the pre-withdrawal snapshot must not overwrite it.
        let err = svc
            .persist(&snapshot, snapshot.inventory().clone(), snapshot.total())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(svc.get(id).await.unwrap().total(), 380);
    }

    #[tokio::test]
    async fn respects_configured_denominations() {
        let config = AtmConfig {
            denominations: cashpoint_dispenser::DenominationSet::new([100, 20]).unwrap(),
            ..AtmConfig::default()
        };
        let svc = AtmService::new(InMemoryAtmStore::new(), config);
        let id = svc.open().await.unwrap().id_typed();

        assert!(svc.add_banknotes(id, &raw(&[("50", 1)])).await.is_err());

        svc.add_banknotes(id, &raw(&[("100", 1), ("20", 3)])).await.unwrap();
        let outcome = svc.withdraw(id, 140).await.unwrap();
        assert_eq!(plan_of(&outcome), vec![(20, 2), (100, 1)]);
    }
}
