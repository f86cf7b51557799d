//! Cash dispenser domain module.
//!
//! Banknote inventories and the greedy denomination engine, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod atm;
pub mod denomination;
pub mod engine;
pub mod inventory;

pub use atm::Atm;
pub use denomination::{Denomination, DenominationSet, InvalidDenominations, STANDARD_DENOMINATIONS};
pub use engine::{
    available_denominations, calculate_withdrawal, deposit, withdraw, Deposited, Withdrawal,
};
pub use inventory::{Inventory, WithdrawalPlan};
