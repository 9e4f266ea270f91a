//! Allocation service for GROUP entries.
//!
//! Lists each member's share with its own paid amount and status, runs the
//! splitter for previews, and regenerates the allocation descriptions after
//! people or the entry have been renamed.

use anyhow::Result;
use log::info;
use std::sync::Arc;

use crate::backend::domain::allocation_splitter::{describe_share, AllocationDraft};
use crate::backend::domain::allocation_status::{derive_allocation_views, AllocationView};
use crate::backend::domain::commands::allocations::{AllocationPreviewCommand, AllocationPreviewResult};
use crate::backend::domain::errors::DomainError;
use crate::backend::domain::models::DomainEntry;
use crate::backend::storage::{AllocationStorage, Connection, EntryStorage, PaymentStorage, PersonStorage};

#[derive(Clone)]
pub struct AllocationService<C: Connection> {
    allocation_repository: C::AllocationRepository,
    entry_repository: C::EntryRepository,
    payment_repository: C::PaymentRepository,
    person_repository: C::PersonRepository,
}

impl<C: Connection> AllocationService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            allocation_repository: connection.create_allocation_repository(),
            entry_repository: connection.create_entry_repository(),
            payment_repository: connection.create_payment_repository(),
            person_repository: connection.create_person_repository(),
        }
    }

    pub async fn list_allocations(&self, entry_id: &str) -> Result<Vec<AllocationView>> {
        let entry = self.group_entry(entry_id).await?;
        let allocations = self.allocation_repository.list_allocations_for_entry(&entry.id).await?;
        let payments = self.payment_repository.list_payments_for_entry(&entry.id).await?;
        Ok(derive_allocation_views(&allocations, &payments))
    }

    /// Run the splitter without storing anything
    pub fn preview(&self, command: AllocationPreviewCommand) -> Result<AllocationPreviewResult> {
        let mut draft = AllocationDraft::new(command.total, &command.member_ids, command.split_mode)
            .map_err(|e| DomainError::validation(e.to_string()))?;
        draft
            .apply_shares(&command.shares)
            .map_err(|e| DomainError::validation(e.to_string()))?;

        Ok(AllocationPreviewResult {
            allocated_total: draft.allocated_total(),
            warnings: draft.warnings(),
            rows: draft.into_rows(),
        })
    }

    /// Rewrite every allocation description from the current names and shares
    pub async fn recompute_notes(&self, entry_id: &str) -> Result<Vec<AllocationView>> {
        info!("Recomputing allocation notes for entry {}", entry_id);

        let entry = self.group_entry(entry_id).await?;
        let allocations = self.allocation_repository.list_allocations_for_entry(&entry.id).await?;

        for mut allocation in allocations {
            let member_name = match self.person_repository.get_person(&allocation.member_id).await? {
                Some(person) => person.display_name(),
                None => allocation.member_id.clone(),
            };
            allocation.description =
                describe_share(&member_name, allocation.amount, allocation.percent, &entry.name);
            self.allocation_repository.update_allocation(&allocation).await?;
        }

        self.list_allocations(entry_id).await
    }

    async fn group_entry(&self, entry_id: &str) -> Result<DomainEntry> {
        let entry = self
            .entry_repository
            .get_entry(entry_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Entry", entry_id))?;

        if !entry.is_group() {
            return Err(DomainError::validation("Only group entries have allocations").into());
        }
        Ok(entry)
    }
}
