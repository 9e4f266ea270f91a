//! # CSV Allocation Repository
//!
//! Group allocations live in `allocations.csv`. The paid amount and status
//! are not stored; they are derived from the payment ledger on read.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::info;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::connection::{CsvConnection, CsvRecord};
use crate::backend::domain::models::DomainAllocation;
use crate::backend::storage::AllocationStorage;

const ALLOCATIONS_FILE: &str = "allocations.csv";

/// CSV record structure for allocations
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AllocationRecord {
    id: String,
    entry_id: String,
    member_id: String,
    #[serde(with = "rust_decimal::serde::str")]
    amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    percent: Decimal,
    description: String,
}

impl CsvRecord for AllocationRecord {
    const HEADERS: &'static [&'static str] =
        &["id", "entry_id", "member_id", "amount", "percent", "description"];
}

impl From<DomainAllocation> for AllocationRecord {
    fn from(allocation: DomainAllocation) -> Self {
        AllocationRecord {
            id: allocation.id,
            entry_id: allocation.entry_id,
            member_id: allocation.member_id,
            amount: allocation.amount,
            percent: allocation.percent,
            description: allocation.description,
        }
    }
}

impl From<AllocationRecord> for DomainAllocation {
    fn from(record: AllocationRecord) -> Self {
        DomainAllocation {
            id: record.id,
            entry_id: record.entry_id,
            member_id: record.member_id,
            amount: record.amount,
            percent: record.percent,
            description: record.description,
        }
    }
}

#[derive(Clone)]
pub struct AllocationRepository {
    connection: CsvConnection,
}

impl AllocationRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl AllocationStorage for AllocationRepository {
    async fn store_allocations(&self, allocations: &[DomainAllocation]) -> Result<()> {
        info!("Storing {} allocations", allocations.len());
        self.connection.modify_csv::<AllocationRecord, _, _>(ALLOCATIONS_FILE, |records| {
            let mut ids: HashSet<String> = records.iter().map(|r| r.id.clone()).collect();
            for allocation in allocations {
                if !ids.insert(allocation.id.clone()) {
                    return Err(anyhow!("Allocation {} already exists", allocation.id));
                }
                records.push(AllocationRecord::from(allocation.clone()));
            }
            Ok(())
        })
    }

    async fn get_allocation(&self, allocation_id: &str) -> Result<Option<DomainAllocation>> {
        let records = self.connection.read_csv::<AllocationRecord>(ALLOCATIONS_FILE)?;
        Ok(records
            .into_iter()
            .find(|r| r.id == allocation_id)
            .map(DomainAllocation::from))
    }

    async fn list_allocations_for_entry(&self, entry_id: &str) -> Result<Vec<DomainAllocation>> {
        let records = self.connection.read_csv::<AllocationRecord>(ALLOCATIONS_FILE)?;
        Ok(records
            .into_iter()
            .filter(|r| r.entry_id == entry_id)
            .map(DomainAllocation::from)
            .collect())
    }

    async fn update_allocation(&self, allocation: &DomainAllocation) -> Result<()> {
        self.connection.modify_csv::<AllocationRecord, _, _>(ALLOCATIONS_FILE, |records| {
            let existing = records
                .iter_mut()
                .find(|r| r.id == allocation.id)
                .ok_or_else(|| anyhow!("Allocation {} not found", allocation.id))?;
            *existing = AllocationRecord::from(allocation.clone());
            Ok(())
        })
    }

    async fn delete_allocations_for_entry(&self, entry_id: &str) -> Result<u32> {
        self.connection.modify_csv::<AllocationRecord, _, _>(ALLOCATIONS_FILE, |records| {
            let before = records.len();
            records.retain(|r| r.entry_id != entry_id);
            Ok((before - records.len()) as u32)
        })
    }
}
