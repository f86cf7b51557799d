//! ATM record storage boundary.
//!
//! A durable key/counter store: one record per unit holding its banknote counts,
//! the derived total and a version used for optimistic concurrency.

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryAtmStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresAtmStore;
pub use r#trait::{AtmStore, StoreError};
