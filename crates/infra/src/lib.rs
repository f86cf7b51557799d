//! Infrastructure layer: configuration, persistence, and the service boundary
//! that wires the denomination engine to a store.

pub mod atm_service;
pub mod config;
pub mod store;

pub use atm_service::{AtmService, ServiceError, WithdrawOutcome};
pub use config::{AppConfig, AtmConfig, ConfigError, WithdrawalLimits};
pub use store::{AtmStore, InMemoryAtmStore, StoreError};
