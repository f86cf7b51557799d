//! Denomination engine: deposit, availability and greedy withdrawal.
//!
//! Every function here takes an inventory snapshot and returns a new one. Nothing is
//! cached between calls and nothing is validated: keys and amounts are checked by
//! the caller before they reach the engine.

use std::collections::BTreeMap;

use cashpoint_core::DomainResult;

use crate::denomination::Denomination;
use crate::inventory::{Inventory, WithdrawalPlan};

/// Result of a deposit: the merged inventory and its recomputed total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deposited {
    pub inventory: Inventory,
    pub total: u64,
}

/// Result of a withdrawal attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Withdrawal {
    /// The plan covers the amount exactly; `inventory`/`total` are after dispensing.
    Dispensed {
        plan: WithdrawalPlan,
        inventory: Inventory,
        total: u64,
    },
    /// The note mix cannot cover the amount. Inventory and total are unchanged.
    Infeasible { inventory: Inventory, total: u64 },
}

impl Withdrawal {
    /// Notes to dispense; empty when infeasible.
    pub fn plan(&self) -> WithdrawalPlan {
        match self {
            Withdrawal::Dispensed { plan, .. } => plan.clone(),
            Withdrawal::Infeasible { .. } => WithdrawalPlan::empty(),
        }
    }

    pub fn inventory(&self) -> &Inventory {
        match self {
            Withdrawal::Dispensed { inventory, .. } | Withdrawal::Infeasible { inventory, .. } => {
                inventory
            }
        }
    }

    pub fn total(&self) -> u64 {
        match self {
            Withdrawal::Dispensed { total, .. } | Withdrawal::Infeasible { total, .. } => *total,
        }
    }

    pub fn is_dispensed(&self) -> bool {
        matches!(self, Withdrawal::Dispensed { .. })
    }
}

/// Add deposited counts to `current`. Denominations not deposited are left as they are.
///
/// Fails with an invariant violation, and `current` stays as it was, when a count or
/// the total would no longer fit in a `u64`.
pub fn deposit(
    current: &Inventory,
    deposited: impl IntoIterator<Item = (Denomination, u64)>,
) -> DomainResult<Deposited> {
    let mut inventory = current.clone();
    for (denomination, count) in deposited {
        inventory.add(denomination, count)?;
    }
    inventory.check_total()?;

    let total = inventory.total();
    Ok(Deposited { inventory, total })
}

/// Denominations with at least one note on hand, largest first.
pub fn available_denominations(inventory: &Inventory) -> Vec<Denomination> {
    let mut denominations: Vec<Denomination> = inventory
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(d, _)| d)
        .collect();
    denominations.sort_unstable_by(|a, b| b.cmp(a));
    denominations
}

/// Greedy single pass over [`available_denominations`]; empty when `amount` can't be met.
///
/// A denomination larger than what is still owed is skipped, and a denomination is
/// never revisited once the pass has moved to a smaller one. Some amounts that the
/// total could cover are therefore refused (10 against a stock of fifties).
pub fn calculate_withdrawal(inventory: &Inventory, amount: u64) -> WithdrawalPlan {
    let mut notes = BTreeMap::new();
    let mut remaining = amount;

    for denomination in available_denominations(inventory) {
        let value = u64::from(denomination.value());
        if value > remaining {
            continue;
        }

        let have = inventory.count(denomination);
        let want = remaining / value;

        if want > have {
            notes.insert(denomination, have);
            remaining -= have * value;
        } else {
            notes.insert(denomination, want);
            remaining %= value;
        }

        if remaining == 0 {
            break;
        }
    }

    if remaining > 0 {
        return WithdrawalPlan::empty();
    }

    WithdrawalPlan::from_notes(notes)
}

/// Compute the plan for `amount` and, if feasible, the inventory left afterwards.
///
/// `amount` must be positive. Zero yields an empty plan, which reads as infeasible.
pub fn withdraw(inventory: &Inventory, amount: u64) -> Withdrawal {
    let plan = calculate_withdrawal(inventory, amount);
    if plan.is_empty() {
        return Withdrawal::Infeasible {
            inventory: inventory.clone(),
            total: inventory.total(),
        };
    }

    let mut remaining = inventory.clone();
    for (denomination, count) in plan.iter() {
        remaining.remove(denomination, count);
    }

    let total = remaining.total();
    Withdrawal::Dispensed {
        plan,
        inventory: remaining,
        total,
    }
}
