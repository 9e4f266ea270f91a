//! # CSV Installment Term Repository
//!
//! Terms live in `terms.csv`, one row per scheduled slice. Only the skip
//! flag and notes ever change after a schedule is written.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::info;
use std::collections::HashSet;

use super::connection::{CsvConnection, CsvRecord};
use crate::backend::domain::models::DomainTerm;
use crate::backend::storage::TermStorage;

const TERMS_FILE: &str = "terms.csv";

impl CsvRecord for DomainTerm {
    const HEADERS: &'static [&'static str] =
        &["id", "entry_id", "term_number", "due_date", "skipped", "notes"];
}

#[derive(Clone)]
pub struct TermRepository {
    connection: CsvConnection,
}

impl TermRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl TermStorage for TermRepository {
    async fn store_terms(&self, terms: &[DomainTerm]) -> Result<()> {
        info!("Storing {} installment terms", terms.len());
        self.connection.modify_csv::<DomainTerm, _, _>(TERMS_FILE, |records| {
            let mut ids: HashSet<String> = records.iter().map(|r| r.id.clone()).collect();
            for term in terms {
                if !ids.insert(term.id.clone()) {
                    return Err(anyhow!("Term {} already exists", term.id));
                }
                records.push(term.clone());
            }
            Ok(())
        })
    }

    async fn list_terms_for_entry(&self, entry_id: &str) -> Result<Vec<DomainTerm>> {
        let mut terms: Vec<DomainTerm> = self
            .connection
            .read_csv::<DomainTerm>(TERMS_FILE)?
            .into_iter()
            .filter(|t| t.entry_id == entry_id)
            .collect();
        terms.sort_by_key(|t| t.term_number);
        Ok(terms)
    }

    async fn update_term(&self, term: &DomainTerm) -> Result<()> {
        self.connection.modify_csv::<DomainTerm, _, _>(TERMS_FILE, |records| {
            let existing = records
                .iter_mut()
                .find(|r| r.id == term.id)
                .ok_or_else(|| anyhow!("Term {} not found", term.id))?;
            *existing = term.clone();
            Ok(())
        })
    }

    async fn delete_terms_for_entry(&self, entry_id: &str) -> Result<u32> {
        self.connection.modify_csv::<DomainTerm, _, _>(TERMS_FILE, |records| {
            let before = records.len();
            records.retain(|r| r.entry_id != entry_id);
            Ok((before - records.len()) as u32)
        })
    }
}
