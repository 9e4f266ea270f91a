//! Domain model for an installment term.
//!
//! Only the skip flag is stored; the term's status is always derived from
//! the ledger and the current date.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainTerm {
    pub id: String,
    pub entry_id: String,
    pub term_number: u32,
    pub due_date: NaiveDate,
    pub skipped: bool,
    pub notes: String,
}
