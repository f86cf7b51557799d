use std::collections::BTreeMap;

use serde::Deserialize;

use cashpoint_core::AggregateRoot;
use cashpoint_dispenser::Atm;

// -------------------------
// Request DTOs
// -------------------------

/// Body of `PUT /atms/:id/add_banknotes`, keyed by denomination: `{"banknotes": {"50": 2}}`.
///
/// Keys stay raw strings so unknown ones can be reported back verbatim.
#[derive(Debug, Deserialize)]
pub struct AddBanknotesRequest {
    pub banknotes: BTreeMap<String, u64>,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawQuery {
    pub amount: u64,
}

// -------------------------
// Response mapping
// -------------------------

pub fn atm_to_json(atm: &Atm) -> serde_json::Value {
    serde_json::json!({
        "id": atm.id_typed().to_string(),
        "banknotes": atm.inventory(),
        "total": atm.total(),
        "version": atm.version(),
        "created_at": atm.created_at(),
        "updated_at": atm.updated_at(),
    })
}
