//! # CSV Entry Repository
//!
//! Entry headers live in `entries.csv`. The derived fields
//! (`amount_remaining`, `status`, `date_fully_paid`) are stored alongside the
//! header and rewritten whenever the ledger changes.
//!
//! Proof references are stored as a JSON array in a single column, left
//! blank when there are none.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use log::info;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{PaymentFrequency, PaymentStatus, SplitMode, TransactionType};

use super::connection::{CsvConnection, CsvRecord};
use crate::backend::domain::models::DomainEntry;
use crate::backend::storage::EntryStorage;

const ENTRIES_FILE: &str = "entries.csv";

/// CSV record structure for entries
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryRecord {
    id: String,
    name: String,
    description: String,
    transaction_type: TransactionType,
    lender_id: String,
    borrower_id: Option<String>,
    borrower_group_id: Option<String>,
    #[serde(with = "rust_decimal::serde::str")]
    amount_borrowed: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    amount_remaining: Decimal,
    status: PaymentStatus,
    date_borrowed: Option<NaiveDate>,
    date_fully_paid: Option<String>,
    installment_start_date: Option<NaiveDate>,
    payment_terms: Option<u32>,
    payment_frequency: Option<PaymentFrequency>,
    #[serde(with = "rust_decimal::serde::str_option")]
    payment_amount_per_term: Option<Decimal>,
    split_mode: Option<SplitMode>,
    notes: String,
    #[serde(with = "proof_refs_column")]
    proof_refs: Vec<String>,
    created_at: String,
    updated_at: String,
}

impl CsvRecord for EntryRecord {
    const HEADERS: &'static [&'static str] = &[
        "id",
        "name",
        "description",
        "transaction_type",
        "lender_id",
        "borrower_id",
        "borrower_group_id",
        "amount_borrowed",
        "amount_remaining",
        "status",
        "date_borrowed",
        "date_fully_paid",
        "installment_start_date",
        "payment_terms",
        "payment_frequency",
        "payment_amount_per_term",
        "split_mode",
        "notes",
        "proof_refs",
        "created_at",
        "updated_at",
    ];
}

/// Serde adapter for a list of proof references in one CSV column
pub(super) mod proof_refs_column {
    use serde::de::Error as _;
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(refs: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        if refs.is_empty() {
            return serializer.serialize_str("");
        }
        let json = serde_json::to_string(refs).map_err(S::Error::custom)?;
        serializer.serialize_str(&json)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw).map_err(D::Error::custom)
    }
}

impl From<DomainEntry> for EntryRecord {
    fn from(entry: DomainEntry) -> Self {
        EntryRecord {
            id: entry.id,
            name: entry.name,
            description: entry.description,
            transaction_type: entry.transaction_type,
            lender_id: entry.lender_id,
            borrower_id: entry.borrower_id,
            borrower_group_id: entry.borrower_group_id,
            amount_borrowed: entry.amount_borrowed,
            amount_remaining: entry.amount_remaining,
            status: entry.status,
            date_borrowed: entry.date_borrowed,
            date_fully_paid: entry.date_fully_paid,
            installment_start_date: entry.installment_start_date,
            payment_terms: entry.payment_terms,
            payment_frequency: entry.payment_frequency,
            payment_amount_per_term: entry.payment_amount_per_term,
            split_mode: entry.split_mode,
            notes: entry.notes,
            proof_refs: entry.proof_refs,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

impl From<EntryRecord> for DomainEntry {
    fn from(record: EntryRecord) -> Self {
        DomainEntry {
            id: record.id,
            name: record.name,
            description: record.description,
            transaction_type: record.transaction_type,
            lender_id: record.lender_id,
            borrower_id: record.borrower_id,
            borrower_group_id: record.borrower_group_id,
            amount_borrowed: record.amount_borrowed,
            amount_remaining: record.amount_remaining,
            status: record.status,
            date_borrowed: record.date_borrowed,
            date_fully_paid: record.date_fully_paid,
            installment_start_date: record.installment_start_date,
            payment_terms: record.payment_terms,
            payment_frequency: record.payment_frequency,
            payment_amount_per_term: record.payment_amount_per_term,
            split_mode: record.split_mode,
            notes: record.notes,
            proof_refs: record.proof_refs,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct EntryRepository {
    connection: CsvConnection,
}

impl EntryRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl EntryStorage for EntryRepository {
    async fn store_entry(&self, entry: &DomainEntry) -> Result<()> {
        info!("Storing entry {} ({:?})", entry.id, entry.transaction_type);
        self.connection.modify_csv::<EntryRecord, _, _>(ENTRIES_FILE, |records| {
            if records.iter().any(|r| r.id == entry.id) {
                return Err(anyhow!("Entry {} already exists", entry.id));
            }
            records.push(EntryRecord::from(entry.clone()));
            Ok(())
        })
    }

    async fn get_entry(&self, entry_id: &str) -> Result<Option<DomainEntry>> {
        let records = self.connection.read_csv::<EntryRecord>(ENTRIES_FILE)?;
        Ok(records
            .into_iter()
            .find(|r| r.id == entry_id)
            .map(DomainEntry::from))
    }

    async fn list_entries(&self) -> Result<Vec<DomainEntry>> {
        let records = self.connection.read_csv::<EntryRecord>(ENTRIES_FILE)?;
        let mut entries: Vec<DomainEntry> = records.into_iter().map(DomainEntry::from).collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    async fn update_entry(&self, entry: &DomainEntry) -> Result<()> {
        self.connection.modify_csv::<EntryRecord, _, _>(ENTRIES_FILE, |records| {
            let existing = records
                .iter_mut()
                .find(|r| r.id == entry.id)
                .ok_or_else(|| anyhow!("Entry {} not found", entry.id))?;
            *existing = EntryRecord::from(entry.clone());
            Ok(())
        })
    }

    async fn delete_entry(&self, entry_id: &str) -> Result<bool> {
        self.connection.modify_csv::<EntryRecord, _, _>(ENTRIES_FILE, |records| {
            let before = records.len();
            records.retain(|r| r.id != entry_id);
            Ok(records.len() != before)
        })
    }
}
