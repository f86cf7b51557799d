use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cashpoint_core::{DomainError, DomainResult, ValueObject};

/// Denominations stocked by the reference deployment, largest first.
pub const STANDARD_DENOMINATIONS: [u32; 6] = [50, 25, 10, 5, 2, 1];

/// Face value of a single banknote.
///
/// Always positive. Serialized as a bare integer, which JSON maps render as a
/// decimal string key (`{"50": 2}`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Denomination(u32);

impl Denomination {
    pub fn new(value: u32) -> DomainResult<Self> {
        if value == 0 {
            return Err(DomainError::validation("denomination must be positive"));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Monetary value of `count` notes of this denomination; `None` on overflow.
    pub fn checked_times(self, count: u64) -> Option<u64> {
        u64::from(self.0).checked_mul(count)
    }
}

impl core::fmt::Display for Denomination {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl TryFrom<u32> for Denomination {
    type Error = DomainError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Denomination> for u32 {
    fn from(value: Denomination) -> Self {
        value.0
    }
}

impl ValueObject for Denomination {}

/// Deposit keys that are not members of the configured denomination set.
///
/// Keys are kept exactly as the caller sent them so the rejection can echo them back.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid denominations: [{}]", .keys.join(", "))]
pub struct InvalidDenominations {
    pub keys: Vec<String>,
}

/// The fixed set of denominations a unit accepts, kept in descending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenominationSet(Vec<Denomination>);

impl DenominationSet {
    /// Build a set from raw values. Duplicates collapse; zero and an empty set are rejected.
    pub fn new(values: impl IntoIterator<Item = u32>) -> DomainResult<Self> {
        let mut denominations = values
            .into_iter()
            .map(Denomination::new)
            .collect::<DomainResult<Vec<_>>>()?;

        if denominations.is_empty() {
            return Err(DomainError::validation("denomination set cannot be empty"));
        }

        denominations.sort_unstable_by(|a, b| b.cmp(a));
        denominations.dedup();
        Ok(Self(denominations))
    }

    pub fn standard() -> Self {
        Self(STANDARD_DENOMINATIONS.iter().copied().map(Denomination).collect())
    }

    pub fn contains(&self, denomination: Denomination) -> bool {
        self.0.contains(&denomination)
    }

    pub fn as_slice(&self) -> &[Denomination] {
        &self.0
    }

    /// Resolve an external key (`"50"`) to a member denomination.
    pub fn parse(&self, key: &str) -> Option<Denomination> {
        key.trim()
            .parse::<u32>()
            .ok()
            .and_then(|v| Denomination::new(v).ok())
            .filter(|d| self.contains(*d))
    }

    /// Convert an externally keyed deposit into typed counts.
    ///
    /// All-or-nothing: a single unknown key rejects the whole mapping, and the error
    /// lists every offending key. Keys spelling the same value (`"50"`, `"050"`) stay
    /// separate entries; the deposit adds them up.
    pub fn parse_counts(
        &self,
        raw: &BTreeMap<String, u64>,
    ) -> Result<Vec<(Denomination, u64)>, InvalidDenominations> {
        let mut counts = Vec::with_capacity(raw.len());
        let mut invalid = Vec::new();

        for (key, count) in raw {
            match self.parse(key) {
                Some(d) => counts.push((d, *count)),
                None => invalid.push(key.clone()),
            }
        }

        if invalid.is_empty() {
            Ok(counts)
        } else {
            Err(InvalidDenominations { keys: invalid })
        }
    }
}

impl Default for DenominationSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl ValueObject for DenominationSet {}
