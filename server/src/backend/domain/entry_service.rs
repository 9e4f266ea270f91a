//! Entry service domain logic for the loan tracker.
//!
//! This module owns the lifecycle of an entry header and the sub-schedules
//! that are created with it.
//!
//! ## Key Responsibilities
//!
//! - **Entry CRUD**: creating STRAIGHT, INSTALLMENT and GROUP entries,
//!   reading them singly or as a filtered collection, and deleting them with
//!   their payments, terms and allocations
//! - **Sub-schedules**: building the term schedule of an installment entry
//!   and the member allocations of a group entry at creation time
//! - **Field lock**: descriptive fields stay editable forever, while the
//!   money and schedule fields freeze with the first payment
//! - **Detail view**: entry plus ledger, with term and allocation statuses
//!   derived for today
//!
//! ## Business Rules
//!
//! - Lender and borrower are existing people and never the same person
//! - A lender is never a member of the group that borrows
//! - Allocations partition the borrowing group at the moment of creation
//! - Split sum mismatches are reported as warnings and never block creation

use anyhow::{anyhow, Result};
use log::{error, info, warn};
use rust_decimal::Decimal;
use shared::{
    CreateEntryRequest, IdKind, PaymentStatus, SplitMode, TransactionType, UpdateEntryRequest,
};
use std::sync::Arc;

use crate::backend::domain::allocation_splitter::{check_partition, describe_share, AllocationDraft, SplitRow};
use crate::backend::domain::allocation_status::derive_allocation_views;
use crate::backend::domain::balance_service::{apply_entry_balance, BalanceService};
use crate::backend::domain::clock::Clock;
use crate::backend::domain::commands::entries::{
    CreateEntryResult, DeleteEntryResult, EntryDetail, EntryListQuery, ValidateEntryResult,
};
use crate::backend::domain::entry_validation::{check_field_lock, validate_new_entry, EntryValidationError};
use crate::backend::domain::errors::DomainError;
use crate::backend::domain::installment_schedule::{
    build_schedule, derive_term_views, payment_amount_per_term, MAX_PAYMENT_TERMS,
};
use crate::backend::domain::models::{DomainAllocation, DomainEntry, DomainTerm};
use crate::backend::domain::money::MAX_AMOUNT;
use crate::backend::storage::{
    AllocationStorage, Connection, EntryStorage, GroupStorage, PaymentStorage, PersonStorage, TermStorage,
};

/// Outcome of checking a new entry against the rules and the stored data
struct NewEntryCheck {
    errors: Vec<String>,
    draft: Option<AllocationDraft>,
}

/// Service for managing entries and their sub-schedules
#[derive(Clone)]
pub struct EntryService<C: Connection> {
    entry_repository: C::EntryRepository,
    payment_repository: C::PaymentRepository,
    term_repository: C::TermRepository,
    allocation_repository: C::AllocationRepository,
    person_repository: C::PersonRepository,
    group_repository: C::GroupRepository,
    balance_service: BalanceService<C>,
    clock: Arc<dyn Clock>,
}

impl<C: Connection> EntryService<C> {
    pub fn new(connection: Arc<C>, balance_service: BalanceService<C>, clock: Arc<dyn Clock>) -> Self {
        Self {
            entry_repository: connection.create_entry_repository(),
            payment_repository: connection.create_payment_repository(),
            term_repository: connection.create_term_repository(),
            allocation_repository: connection.create_allocation_repository(),
            person_repository: connection.create_person_repository(),
            group_repository: connection.create_group_repository(),
            balance_service,
            clock,
        }
    }

    /// Create an entry together with its schedule or allocations
    pub async fn create_entry(&self, request: CreateEntryRequest) -> Result<CreateEntryResult> {
        info!(
            "Creating {:?} entry '{}' for {:?}",
            request.transaction_type, request.name, request.amount_borrowed
        );

        let check = self.check_new_entry(&request).await?;
        if !check.errors.is_empty() {
            warn!("Entry rejected: {}", check.errors.join("; "));
            return Err(DomainError::from_validation_errors(check.errors.as_slice()).into());
        }

        let amount_borrowed = request
            .amount_borrowed
            .ok_or_else(|| DomainError::validation("Amount borrowed is required"))?;
        let now = self.clock.now().to_rfc3339();

        let mut entry = DomainEntry {
            id: shared::generate_id(IdKind::Entry),
            name: request.name.trim().to_string(),
            description: request.description.trim().to_string(),
            transaction_type: request.transaction_type,
            lender_id: request.lender_id.clone().unwrap_or_default(),
            borrower_id: None,
            borrower_group_id: None,
            amount_borrowed,
            amount_remaining: amount_borrowed,
            status: PaymentStatus::Unpaid,
            date_borrowed: request.date_borrowed,
            date_fully_paid: None,
            installment_start_date: None,
            payment_terms: None,
            payment_frequency: None,
            payment_amount_per_term: None,
            split_mode: None,
            notes: request.notes.trim().to_string(),
            proof_refs: request.proof_refs.clone(),
            created_at: now.clone(),
            updated_at: now,
        };

        let mut terms = Vec::new();
        let mut allocations = Vec::new();
        let mut warnings = Vec::new();

        match request.transaction_type {
            TransactionType::Straight => {
                entry.borrower_id = request.borrower_id.clone();
            }
            TransactionType::Installment => {
                entry.borrower_id = request.borrower_id.clone();
                let plan = request
                    .installment
                    .as_ref()
                    .ok_or_else(|| DomainError::validation("Installment plan is required"))?;
                let payment_terms = plan.payment_terms.unwrap_or_default();
                entry.installment_start_date = plan.start_date;
                entry.payment_terms = plan.payment_terms;
                entry.payment_frequency = Some(plan.payment_frequency);
                entry.payment_amount_per_term = plan
                    .payment_amount_per_term
                    .or_else(|| payment_amount_per_term(amount_borrowed, payment_terms));
                terms = Self::schedule_for(&entry)?;
            }
            TransactionType::Group => {
                entry.borrower_group_id = request.borrower_group_id.clone();
                let draft = check
                    .draft
                    .ok_or_else(|| anyhow!("Group entry checked without a split"))?;
                entry.split_mode = Some(draft.mode());
                warnings = draft.warnings();
                allocations = self.allocations_for(&entry, draft.rows()).await?;
            }
        }

        self.entry_repository.store_entry(&entry).await?;
        if let Err(e) = self.store_sub_schedules(&terms, &allocations).await {
            warn!("Entry {} could not be stored in full, rolling back: {:#}", entry.id, e);
            self.discard_entry(&entry.id).await;
            return Err(e);
        }

        for warning in &warnings {
            warn!("Entry {} split warning: {}", entry.id, warning);
        }
        info!(
            "Created entry {} with {} terms and {} allocations",
            entry.id,
            terms.len(),
            allocations.len()
        );

        Ok(CreateEntryResult {
            entry,
            terms,
            allocations,
            warnings,
        })
    }

    /// Run every creation check without storing anything
    pub async fn validate_entry(&self, request: &CreateEntryRequest) -> Result<ValidateEntryResult> {
        let check = self.check_new_entry(request).await?;
        Ok(ValidateEntryResult {
            errors: check.errors,
            warnings: check.draft.map(|d| d.warnings()).unwrap_or_default(),
        })
    }

    pub async fn get_entry(&self, entry_id: &str) -> Result<DomainEntry> {
        self.entry_repository
            .get_entry(entry_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Entry", entry_id).into())
    }

    /// Full collection of entries, newest first, narrowed by the query
    pub async fn list_entries(&self, query: EntryListQuery) -> Result<Vec<DomainEntry>> {
        let entries = self.entry_repository.list_entries().await?;
        Ok(entries.into_iter().filter(|e| query.matches(e)).collect())
    }

    /// Entry with its ledger, terms and allocations as of today
    pub async fn get_entry_detail(&self, entry_id: &str) -> Result<EntryDetail> {
        let entry = self.get_entry(entry_id).await?;
        let payments = self.payment_repository.list_payments_for_entry(entry_id).await?;

        let terms = match entry.installment_start_date {
            Some(start_date) if entry.is_installment() => {
                let terms = self.term_repository.list_terms_for_entry(entry_id).await?;
                derive_term_views(start_date, &terms, &payments, self.clock.today())
            }
            _ => Vec::new(),
        };

        let allocations = if entry.is_group() {
            let allocations = self.allocation_repository.list_allocations_for_entry(entry_id).await?;
            derive_allocation_views(&allocations, &payments)
        } else {
            Vec::new()
        };

        Ok(EntryDetail {
            is_locked: !payments.is_empty(),
            entry,
            payments,
            terms,
            allocations,
        })
    }

    /// Edit an entry
    ///
    /// Before the first payment a change to the schedule fields rebuilds the
    /// terms, and a change to the amount, group or split mode re-splits the
    /// allocations. After it, those fields are rejected.
    pub async fn update_entry(&self, entry_id: &str, request: UpdateEntryRequest) -> Result<DomainEntry> {
        info!("Updating entry {}: {:?}", entry_id, request);

        let mut entry = self.get_entry(entry_id).await?;
        let payments = self.payment_repository.list_payments_for_entry(entry_id).await?;
        check_field_lock(&entry, &request, !payments.is_empty())?;

        if let Some(name) = &request.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(DomainError::validation("Entry name is required").into());
            }
            entry.name = name.to_string();
        }
        if let Some(description) = &request.description {
            entry.description = description.trim().to_string();
        }
        if let Some(notes) = &request.notes {
            entry.notes = notes.trim().to_string();
        }
        if let Some(date_borrowed) = request.date_borrowed {
            entry.date_borrowed = Some(date_borrowed);
        }
        if let Some(proof_refs) = &request.proof_refs {
            entry.proof_refs = proof_refs.clone();
        }

        // Only reachable without payments; the lock has rejected real changes otherwise
        let before = entry.clone();
        self.apply_locked_fields(&mut entry, &request).await?;

        let schedule_changed = entry.installment_start_date != before.installment_start_date
            || entry.payment_terms != before.payment_terms
            || entry.payment_frequency != before.payment_frequency;
        let split_changed = entry.amount_borrowed != before.amount_borrowed
            || entry.borrower_group_id != before.borrower_group_id
            || entry.split_mode != before.split_mode;

        if entry.amount_borrowed != before.amount_borrowed {
            apply_entry_balance(&mut entry, Decimal::ZERO, self.clock.now());
        }
        entry.updated_at = self.clock.now().to_rfc3339();

        if entry.is_installment() && schedule_changed {
            let stored = self.term_repository.list_terms_for_entry(entry_id).await?;
            if stored.iter().any(|t| t.skipped) {
                return Err(DomainError::FieldLocked(Self::changed_schedule_field(&before, &entry)).into());
            }
            let terms = Self::schedule_for(&entry)?;
            self.term_repository.delete_terms_for_entry(entry_id).await?;
            self.term_repository.store_terms(&terms).await?;
            info!("Rebuilt {} terms for entry {}", terms.len(), entry_id);
        }

        if entry.is_group() && split_changed {
            let rows = self.resplit(&before, &entry).await?;
            let allocations = self.allocations_for(&entry, &rows).await?;
            self.allocation_repository.delete_allocations_for_entry(entry_id).await?;
            self.allocation_repository.store_allocations(&allocations).await?;
            info!("Reallocated entry {} across {} members", entry_id, allocations.len());
        }

        self.entry_repository.update_entry(&entry).await?;
        Ok(entry)
    }

    /// Delete an entry along with its payments, terms and allocations
    pub async fn delete_entry(&self, entry_id: &str) -> Result<DeleteEntryResult> {
        info!("Deleting entry {}", entry_id);

        if !self.entry_repository.delete_entry(entry_id).await? {
            return Err(DomainError::not_found("Entry", entry_id).into());
        }

        let result = DeleteEntryResult {
            deleted_payments: self.payment_repository.delete_payments_for_entry(entry_id).await?,
            deleted_terms: self.term_repository.delete_terms_for_entry(entry_id).await?,
            deleted_allocations: self
                .allocation_repository
                .delete_allocations_for_entry(entry_id)
                .await?,
        };

        info!(
            "Deleted entry {} with {} payments, {} terms, {} allocations",
            entry_id, result.deleted_payments, result.deleted_terms, result.deleted_allocations
        );
        Ok(result)
    }

    /// Re-derive the stored balance from the ledger
    pub async fn refresh_balance(&self, entry_id: &str) -> Result<DomainEntry> {
        self.balance_service.refresh_entry(entry_id).await
    }

    async fn check_new_entry(&self, request: &CreateEntryRequest) -> Result<NewEntryCheck> {
        let mut errors = Vec::new();

        for (role, person_id) in [("Lender", &request.lender_id), ("Borrower", &request.borrower_id)] {
            if let Some(person_id) = person_id.as_deref().filter(|id| !id.trim().is_empty()) {
                if self.person_repository.get_person(person_id).await?.is_none() {
                    errors.push(format!("{} {} not found", role, person_id));
                }
            }
        }

        let mut group_members = None;
        if let Some(group_id) = request.borrower_group_id.as_deref().filter(|id| !id.trim().is_empty()) {
            match self.group_repository.get_group(group_id).await? {
                Some(group) => group_members = Some(group.member_ids),
                None => errors.push(format!("Borrower group {} not found", group_id)),
            }
        }

        errors.extend(
            validate_new_entry(request, group_members.as_deref())
                .iter()
                .map(|e| e.to_string()),
        );

        let mut draft = None;
        if request.transaction_type == TransactionType::Group {
            if let (Some(members), Some(total)) = (&group_members, request.amount_borrowed) {
                let plan = request.allocation.as_ref();
                let mode = plan.map_or(SplitMode::Equal, |p| p.split_mode);
                let shares = plan.map(|p| p.shares.as_slice()).unwrap_or_default();

                let split = AllocationDraft::new(total, members, mode).and_then(|mut d| {
                    d.apply_shares(shares)?;
                    check_partition(members, &d.member_ids())?;
                    Ok(d)
                });
                match split {
                    Ok(d) => draft = Some(d),
                    Err(e) if total > Decimal::ZERO => errors.push(e.to_string()),
                    Err(_) => {}
                }
            }
        }

        Ok(NewEntryCheck { errors, draft })
    }

    async fn store_sub_schedules(&self, terms: &[DomainTerm], allocations: &[DomainAllocation]) -> Result<()> {
        if !terms.is_empty() {
            self.term_repository.store_terms(terms).await?;
        }
        if !allocations.is_empty() {
            self.allocation_repository.store_allocations(allocations).await?;
        }
        Ok(())
    }

    /// Remove whatever part of a half-created entry made it to storage
    async fn discard_entry(&self, entry_id: &str) {
        if let Err(e) = self.term_repository.delete_terms_for_entry(entry_id).await {
            error!("Failed to remove terms of discarded entry {}: {:#}", entry_id, e);
        }
        if let Err(e) = self.allocation_repository.delete_allocations_for_entry(entry_id).await {
            error!("Failed to remove allocations of discarded entry {}: {:#}", entry_id, e);
        }
        if let Err(e) = self.entry_repository.delete_entry(entry_id).await {
            error!("Failed to remove discarded entry {}: {:#}", entry_id, e);
        }
    }

    /// Copy the money and schedule fields from an update onto the entry
    async fn apply_locked_fields(&self, entry: &mut DomainEntry, request: &UpdateEntryRequest) -> Result<()> {
        if let Some(amount) = request.amount_borrowed {
            if amount <= Decimal::ZERO {
                return Err(DomainError::from(EntryValidationError::NonPositiveAmount).into());
            }
            if amount > MAX_AMOUNT {
                return Err(DomainError::from(EntryValidationError::AmountTooLarge).into());
            }
            entry.amount_borrowed = amount;
        }

        if let Some(lender_id) = &request.lender_id {
            entry.lender_id = lender_id.clone();
        }
        if entry.is_group() {
            if let Some(group_id) = &request.borrower_group_id {
                entry.borrower_group_id = Some(group_id.clone());
            }
        } else if let Some(borrower_id) = &request.borrower_id {
            entry.borrower_id = Some(borrower_id.clone());
        }
        if request.lender_id.is_some() || request.borrower_id.is_some() || request.borrower_group_id.is_some() {
            self.check_parties(entry).await?;
        }

        if entry.is_installment() {
            if let Some(start_date) = request.installment_start_date {
                entry.installment_start_date = Some(start_date);
            }
            if let Some(frequency) = request.payment_frequency {
                entry.payment_frequency = Some(frequency);
            }
            if let Some(terms) = request.payment_terms {
                if terms == 0 {
                    return Err(DomainError::from(EntryValidationError::InvalidPaymentTerms).into());
                }
                if terms > MAX_PAYMENT_TERMS {
                    return Err(DomainError::from(EntryValidationError::TooManyPaymentTerms).into());
                }
                entry.payment_terms = Some(terms);
            }
            match request.payment_amount_per_term {
                Some(per_term) if per_term <= Decimal::ZERO => {
                    return Err(DomainError::from(EntryValidationError::NonPositiveAmountPerTerm).into());
                }
                Some(per_term) if per_term > MAX_AMOUNT => {
                    return Err(DomainError::from(EntryValidationError::AmountPerTermTooLarge).into());
                }
                Some(per_term) => entry.payment_amount_per_term = Some(per_term),
                None if request.amount_borrowed.is_some() || request.payment_terms.is_some() => {
                    entry.payment_amount_per_term = entry
                        .payment_terms
                        .and_then(|terms| payment_amount_per_term(entry.amount_borrowed, terms));
                }
                None => {}
            }
        }

        if entry.is_group() {
            if let Some(mode) = request.split_mode {
                entry.split_mode = Some(mode);
            }
        }

        Ok(())
    }

    /// Lender and borrower exist and do not collide
    async fn check_parties(&self, entry: &DomainEntry) -> Result<()> {
        if self.person_repository.get_person(&entry.lender_id).await?.is_none() {
            return Err(DomainError::validation(format!("Lender {} not found", entry.lender_id)).into());
        }

        if let Some(group_id) = entry.borrower_group_id.as_deref().filter(|_| entry.is_group()) {
            let group = self
                .group_repository
                .get_group(group_id)
                .await?
                .ok_or_else(|| DomainError::validation(format!("Borrower group {} not found", group_id)))?;
            if group.member_ids.contains(&entry.lender_id) {
                return Err(DomainError::validation("Lender cannot be a member of the borrowing group").into());
            }
        } else if let Some(borrower_id) = entry.borrower_id.as_deref() {
            if borrower_id == entry.lender_id {
                return Err(DomainError::validation("Borrower and lender must be different people").into());
            }
            if self.person_repository.get_person(borrower_id).await?.is_none() {
                return Err(DomainError::validation(format!("Borrower {} not found", borrower_id)).into());
            }
        }
        Ok(())
    }

    /// New split rows after an edit to the amount, group or mode
    ///
    /// A new group starts over from its members. Otherwise the stored rows
    /// are resumed, the mode switched and the total re-applied.
    async fn resplit(&self, before: &DomainEntry, entry: &DomainEntry) -> Result<Vec<SplitRow>> {
        let mode = entry.split_mode.unwrap_or(SplitMode::Equal);

        let draft = if entry.borrower_group_id != before.borrower_group_id {
            let group_id = entry.borrower_group_id.as_deref().unwrap_or_default();
            let group = self
                .group_repository
                .get_group(group_id)
                .await?
                .ok_or_else(|| DomainError::validation(format!("Borrower group {} not found", group_id)))?;
            AllocationDraft::new(entry.amount_borrowed, &group.member_ids, mode)
        } else {
            let rows = self
                .allocation_repository
                .list_allocations_for_entry(&entry.id)
                .await?
                .into_iter()
                .map(|a| SplitRow {
                    member_id: a.member_id,
                    amount: a.amount,
                    percent: a.percent,
                })
                .collect();
            AllocationDraft::from_rows(
                before.amount_borrowed,
                before.split_mode.unwrap_or(SplitMode::Equal),
                rows,
            )
            .and_then(|mut d| {
                d.switch_mode(mode);
                d.set_total(entry.amount_borrowed)?;
                Ok(d)
            })
        };

        let draft = draft.map_err(|e| DomainError::validation(e.to_string()))?;
        for warning in draft.warnings() {
            warn!("Entry {} split warning: {}", entry.id, warning);
        }
        Ok(draft.into_rows())
    }

    /// First schedule field an edit changed; a skipped term freezes all of them
    fn changed_schedule_field(before: &DomainEntry, entry: &DomainEntry) -> &'static str {
        if entry.installment_start_date != before.installment_start_date {
            "installment_start_date"
        } else if entry.payment_terms != before.payment_terms {
            "payment_terms"
        } else {
            "payment_frequency"
        }
    }

    fn schedule_for(entry: &DomainEntry) -> Result<Vec<DomainTerm>> {
        let (Some(start_date), Some(frequency), Some(count)) = (
            entry.installment_start_date,
            entry.payment_frequency,
            entry.payment_terms,
        ) else {
            return Err(DomainError::validation("Installment start date, frequency and terms are required").into());
        };

        build_schedule(&entry.id, start_date, frequency, count)
            .ok_or_else(|| DomainError::validation("Installment schedule runs past the supported date range").into())
    }

    async fn allocations_for(&self, entry: &DomainEntry, rows: &[SplitRow]) -> Result<Vec<DomainAllocation>> {
        let mut allocations = Vec::with_capacity(rows.len());
        for row in rows {
            let member_name = match self.person_repository.get_person(&row.member_id).await? {
                Some(person) => person.display_name(),
                None => row.member_id.clone(),
            };
            allocations.push(DomainAllocation {
                id: shared::generate_id(IdKind::Allocation),
                entry_id: entry.id.clone(),
                member_id: row.member_id.clone(),
                amount: row.amount,
                percent: row.percent,
                description: describe_share(&member_name, row.amount, row.percent, &entry.name),
            });
        }
        Ok(allocations)
    }
}
