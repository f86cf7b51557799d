//! Value object trait: equality by value, not identity.
//!
//! Banknote counts, withdrawal plans and denomination sets are values: two
//! inventories holding the same notes are the same inventory, regardless of which
//! ATM they were read from.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new value (deposit and withdrawal both return a fresh inventory).
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Inventory { notes: BTreeMap<Denomination, u64> }
///
/// impl ValueObject for Inventory {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
