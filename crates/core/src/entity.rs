//! Entity trait: identity that survives every deposit and withdrawal.

/// Something tracked by identity rather than by value (an ATM stays the same ATM
/// while its inventory changes).
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    fn id(&self) -> &Self::Id;
}
