//! Banknote counts: what a unit holds, and what it hands out.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use cashpoint_core::{DomainError, DomainResult, ValueObject};

use crate::denomination::Denomination;

/// Banknotes on hand, per denomination.
///
/// Entries may carry a zero count once a denomination has been emptied; a zero
/// entry and an absent entry mean the same thing to the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    notes: BTreeMap<Denomination, u64>,
}

impl Inventory {
    /// An inventory with every denomination absent.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn count(&self, denomination: Denomination) -> u64 {
        self.notes.get(&denomination).copied().unwrap_or(0)
    }

    /// Build an inventory from `(denomination, count)` pairs; repeated denominations add up.
    pub fn from_counts(counts: impl IntoIterator<Item = (Denomination, u64)>) -> DomainResult<Self> {
        let mut inventory = Self::empty();
        for (denomination, count) in counts {
            inventory.add(denomination, count)?;
        }
        inventory.check_total()?;
        Ok(inventory)
    }

    /// Total monetary value: `sum(denomination * count)`, recomputed on every call.
    ///
    /// Inventories built through [`Inventory::from_counts`] or a deposit always fit in
    /// a `u64`; use [`Inventory::checked_total`] for ones read from elsewhere.
    pub fn total(&self) -> u64 {
        self.checked_total().unwrap_or(u64::MAX)
    }

    /// `None` when the total does not fit in a `u64`.
    pub fn checked_total(&self) -> Option<u64> {
        self.notes
            .iter()
            .try_fold(0u64, |acc, (d, c)| acc.checked_add(d.checked_times(*c)?))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Denomination, u64)> + '_ {
        self.notes.iter().map(|(d, c)| (*d, *c))
    }

    pub fn is_empty(&self) -> bool {
        self.notes.values().all(|c| *c == 0)
    }

    /// Fails, leaving the count untouched, if it would not fit in a `u64`.
    pub(crate) fn add(&mut self, denomination: Denomination, count: u64) -> DomainResult<()> {
        let slot = self.notes.entry(denomination).or_insert(0);
        *slot = slot.checked_add(count).ok_or_else(|| {
            DomainError::invariant(format!("count of {denomination}s would overflow"))
        })?;
        Ok(())
    }

    pub(crate) fn check_total(&self) -> DomainResult<()> {
        match self.checked_total() {
            Some(_) => Ok(()),
            None => Err(DomainError::invariant("inventory total would overflow")),
        }
    }

    /// Caller guarantees `count <= self.count(denomination)`.
    pub(crate) fn remove(&mut self, denomination: Denomination, count: u64) {
        let slot = self.notes.entry(denomination).or_insert(0);
        debug_assert!(*slot >= count, "removing more {denomination}s than on hand");
        *slot = slot.saturating_sub(count);
    }
}

impl ValueObject for Inventory {}

/// Banknotes selected for one withdrawal.
///
/// Either sums exactly to the requested amount or is empty; there is no partial plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WithdrawalPlan {
    notes: BTreeMap<Denomination, u64>,
}

impl WithdrawalPlan {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_notes(notes: BTreeMap<Denomination, u64>) -> Self {
        Self { notes }
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn count(&self, denomination: Denomination) -> u64 {
        self.notes.get(&denomination).copied().unwrap_or(0)
    }

    /// Amount this plan dispenses. A plan never exceeds the inventory it came from.
    pub fn value(&self) -> u64 {
        self.notes
            .iter()
            .try_fold(0u64, |acc, (d, c)| acc.checked_add(d.checked_times(*c)?))
            .unwrap_or(u64::MAX)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Denomination, u64)> + '_ {
        self.notes.iter().map(|(d, c)| (*d, *c))
    }
}

impl ValueObject for WithdrawalPlan {}
