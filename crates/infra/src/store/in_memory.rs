use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use cashpoint_core::{AggregateRoot, AtmId, ExpectedVersion};
use cashpoint_dispenser::Atm;

use super::r#trait::{AtmStore, StoreError};

/// In-memory ATM store.
///
/// Intended for tests/dev. The version check and the write happen under one write
/// lock, so concurrent saves against the same snapshot resolve to one winner.
#[derive(Debug, Default)]
pub struct InMemoryAtmStore {
    atms: RwLock<HashMap<AtmId, Atm>>,
}

impl InMemoryAtmStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.atms.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AtmStore for InMemoryAtmStore {
    async fn create(&self, atm: Atm) -> Result<Atm, StoreError> {
        let mut atms = self
            .atms
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        let id = atm.id_typed();
        if atms.contains_key(&id) {
            return Err(StoreError::AlreadyExists(id));
        }

        atms.insert(id, atm.clone());
        Ok(atm)
    }

    async fn load(&self, id: AtmId) -> Result<Option<Atm>, StoreError> {
        let atms = self
            .atms
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        Ok(atms.get(&id).cloned())
    }

    async fn save(&self, atm: Atm, expected_version: ExpectedVersion) -> Result<Atm, StoreError> {
        let mut atms = self
            .atms
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        let id = atm.id_typed();
        let current = atms.get(&id).ok_or(StoreError::NotFound(id))?;

        let current_version = current.version();
        expected_version
            .check(current_version)
            .map_err(|e| StoreError::Conflict(e.to_string()))?;

        let stored = Atm::restore(
            id,
            atm.inventory().clone(),
            current_version + 1,
            current.created_at(),
            Utc::now(),
        );
        atms.insert(id, stored.clone());
        Ok(stored)
    }
}
