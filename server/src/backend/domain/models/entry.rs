//! Domain model for a loan/expense entry.
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{PaymentFrequency, PaymentStatus, SplitMode, TransactionType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEntry {
    pub id: String,
    pub name: String,
    pub description: String,
    pub transaction_type: TransactionType,
    pub lender_id: String,
    pub borrower_id: Option<String>,
    pub borrower_group_id: Option<String>,
    pub amount_borrowed: Decimal,
    pub amount_remaining: Decimal,
    pub status: PaymentStatus,
    pub date_borrowed: Option<NaiveDate>,
    pub date_fully_paid: Option<String>, // RFC 3339 timestamp
    pub installment_start_date: Option<NaiveDate>,
    pub payment_terms: Option<u32>,
    pub payment_frequency: Option<PaymentFrequency>,
    pub payment_amount_per_term: Option<Decimal>,
    pub split_mode: Option<SplitMode>,
    pub notes: String,
    pub proof_refs: Vec<String>,
    pub created_at: String, // RFC 3339 timestamp
    pub updated_at: String, // RFC 3339 timestamp
}

impl DomainEntry {
    pub fn is_installment(&self) -> bool {
        self.transaction_type == TransactionType::Installment
    }

    pub fn is_group(&self) -> bool {
        self.transaction_type == TransactionType::Group
    }

    /// ID of whoever owes the money: a person, or a group for GROUP entries
    pub fn borrower_ref(&self) -> Option<&str> {
        match self.transaction_type {
            TransactionType::Group => self.borrower_group_id.as_deref(),
            _ => self.borrower_id.as_deref(),
        }
    }
}
