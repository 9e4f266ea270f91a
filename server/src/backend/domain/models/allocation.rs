//! Domain model for one member's share of a group entry.
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainAllocation {
    pub id: String,
    pub entry_id: String,
    pub member_id: String,
    pub amount: Decimal,
    pub percent: Decimal,
    pub description: String,
}
