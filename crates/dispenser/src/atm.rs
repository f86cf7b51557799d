use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cashpoint_core::{AggregateRoot, AtmId, Entity};

use crate::inventory::Inventory;

/// A dispensing unit as persisted: its inventory, the derived total and a version.
///
/// `total` always equals `inventory.total()`; it is stored alongside so readers of
/// the record don't have to recompute it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Atm {
    id: AtmId,
    inventory: Inventory,
    total: u64,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Atm {
    /// A newly installed unit holding no cash.
    pub fn open(id: AtmId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            inventory: Inventory::empty(),
            total: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a unit from stored fields. The total is recomputed from the inventory.
    pub fn restore(
        id: AtmId,
        inventory: Inventory,
        version: u64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        let total = inventory.total();
        Self {
            id,
            inventory,
            total,
            version,
            created_at,
            updated_at,
        }
    }

    pub fn id_typed(&self) -> AtmId {
        self.id
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Same unit, same version, holding `inventory`. Nothing is persisted yet.
    pub fn with_inventory(&self, inventory: Inventory, total: u64) -> Self {
        debug_assert_eq!(total, inventory.total());
        Self {
            inventory,
            total,
            ..self.clone()
        }
    }
}

impl Entity for Atm {
    type Id = AtmId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AggregateRoot for Atm {
    fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::denomination::Denomination;
    use cashpoint_core::ExpectedVersion;

    #[test]
    fn open_unit_is_empty_at_version_zero() {
        let atm = Atm::open(AtmId::new(), Utc::now());
        assert_eq!(atm.total(), 0);
        assert_eq!(atm.version(), 0);
        assert!(atm.inventory().is_empty());
    }

    #[test]
    fn restore_recomputes_total() {
        let inventory = Inventory::from_counts([(Denomination::new(50).unwrap(), 2)]).unwrap();
        let now = Utc::now();
        let atm = Atm::restore(AtmId::new(), inventory, 7, now, now);
        assert_eq!(atm.total(), 100);
        assert_eq!(atm.expected_version(), ExpectedVersion::Exact(7));
    }

    #[test]
    fn with_inventory_keeps_identity_and_version() {
        let atm = Atm::open(AtmId::new(), Utc::now());
        let inventory = Inventory::from_counts([(Denomination::new(10).unwrap(), 3)]).unwrap();

        let next = atm.with_inventory(inventory.clone(), 30);
        assert_eq!(next.id(), atm.id());
        assert_eq!(next.version(), 0);
        assert_eq!(next.inventory(), &inventory);
        assert_eq!(next.total(), 30);
    }
}
