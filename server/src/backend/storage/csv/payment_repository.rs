//! # CSV Payment Repository
//!
//! The payment ledger lives in `payments.csv`. Payments are append-only;
//! the only mutation besides insert is delete.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use log::info;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::Payment;

use super::connection::{CsvConnection, CsvRecord};
use super::entry_repository::proof_refs_column;
use crate::backend::storage::PaymentStorage;

const PAYMENTS_FILE: &str = "payments.csv";

/// CSV record structure for payments
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PaymentRecord {
    id: String,
    entry_id: String,
    #[serde(with = "rust_decimal::serde::str")]
    amount: Decimal,
    date: NaiveDate,
    payee_id: String,
    note: String,
    #[serde(with = "proof_refs_column")]
    proof_refs: Vec<String>,
    term_id: Option<String>,
    allocation_id: Option<String>,
    created_at: String,
}

impl CsvRecord for PaymentRecord {
    const HEADERS: &'static [&'static str] = &[
        "id",
        "entry_id",
        "amount",
        "date",
        "payee_id",
        "note",
        "proof_refs",
        "term_id",
        "allocation_id",
        "created_at",
    ];
}

impl From<Payment> for PaymentRecord {
    fn from(payment: Payment) -> Self {
        PaymentRecord {
            id: payment.id,
            entry_id: payment.entry_id,
            amount: payment.amount,
            date: payment.date,
            payee_id: payment.payee_id,
            note: payment.note,
            proof_refs: payment.proof_refs,
            term_id: payment.term_id,
            allocation_id: payment.allocation_id,
            created_at: payment.created_at,
        }
    }
}

impl From<PaymentRecord> for Payment {
    fn from(record: PaymentRecord) -> Self {
        Payment {
            id: record.id,
            entry_id: record.entry_id,
            amount: record.amount,
            date: record.date,
            payee_id: record.payee_id,
            note: record.note,
            proof_refs: record.proof_refs,
            term_id: record.term_id,
            allocation_id: record.allocation_id,
            created_at: record.created_at,
        }
    }
}

#[derive(Clone)]
pub struct PaymentRepository {
    connection: CsvConnection,
}

impl PaymentRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl PaymentStorage for PaymentRepository {
    async fn store_payment(&self, payment: &Payment) -> Result<()> {
        info!(
            "Storing payment {} of {} against entry {}",
            payment.id, payment.amount, payment.entry_id
        );
        self.connection.modify_csv::<PaymentRecord, _, _>(PAYMENTS_FILE, |records| {
            if records.iter().any(|r| r.id == payment.id) {
                return Err(anyhow!("Payment {} already exists", payment.id));
            }
            records.push(PaymentRecord::from(payment.clone()));
            Ok(())
        })
    }

    async fn get_payment(&self, payment_id: &str) -> Result<Option<Payment>> {
        let records = self.connection.read_csv::<PaymentRecord>(PAYMENTS_FILE)?;
        Ok(records
            .into_iter()
            .find(|r| r.id == payment_id)
            .map(Payment::from))
    }

    async fn list_payments_for_entry(&self, entry_id: &str) -> Result<Vec<Payment>> {
        let records = self.connection.read_csv::<PaymentRecord>(PAYMENTS_FILE)?;
        let mut payments: Vec<Payment> = records
            .into_iter()
            .filter(|r| r.entry_id == entry_id)
            .map(Payment::from)
            .collect();
        payments.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.created_at.cmp(&b.created_at)));
        Ok(payments)
    }

    async fn delete_payment(&self, payment_id: &str) -> Result<bool> {
        self.connection.modify_csv::<PaymentRecord, _, _>(PAYMENTS_FILE, |records| {
            let before = records.len();
            records.retain(|r| r.id != payment_id);
            Ok(records.len() != before)
        })
    }

    async fn delete_payments_for_entry(&self, entry_id: &str) -> Result<u32> {
        self.connection.modify_csv::<PaymentRecord, _, _>(PAYMENTS_FILE, |records| {
            let before = records.len();
            records.retain(|r| r.entry_id != entry_id);
            Ok((before - records.len()) as u32)
        })
    }
}
