//! Installment term operations: listing with derived status, skipping and
//! term notes.
//!
//! Skipping never removes a term. The skipped term keeps its number and stays
//! SKIPPED for good, and a new term is appended one payment period after the
//! current last one.

use anyhow::Result;
use chrono::NaiveDate;
use log::info;
use shared::TermAction;
use std::sync::Arc;

use crate::backend::domain::clock::Clock;
use crate::backend::domain::commands::installments::SkipTermResult;
use crate::backend::domain::errors::DomainError;
use crate::backend::domain::installment_schedule::{derive_term_views, next_term, TermView};
use crate::backend::domain::models::DomainEntry;
use crate::backend::storage::{Connection, EntryStorage, PaymentStorage, TermStorage};

#[derive(Clone)]
pub struct InstallmentService<C: Connection> {
    entry_repository: C::EntryRepository,
    term_repository: C::TermRepository,
    payment_repository: C::PaymentRepository,
    clock: Arc<dyn Clock>,
}

impl<C: Connection> InstallmentService<C> {
    pub fn new(connection: Arc<C>, clock: Arc<dyn Clock>) -> Self {
        Self {
            entry_repository: connection.create_entry_repository(),
            term_repository: connection.create_term_repository(),
            payment_repository: connection.create_payment_repository(),
            clock,
        }
    }

    /// Terms of an installment entry with their status as of today
    pub async fn list_terms(&self, entry_id: &str) -> Result<Vec<TermView>> {
        let (_, start_date) = self.installment_entry(entry_id).await?;
        self.term_views(entry_id, start_date).await
    }

    /// Skip a term that is due or overdue and append its replacement
    pub async fn skip_term(&self, entry_id: &str, term_number: u32) -> Result<SkipTermResult> {
        info!("Skipping term {} of entry {}", term_number, entry_id);

        let (mut entry, start_date) = self.installment_entry(entry_id).await?;
        let frequency = entry
            .payment_frequency
            .ok_or_else(|| DomainError::validation("Entry has no payment frequency"))?;

        let views = self.term_views(entry_id, start_date).await?;
        let view = Self::find_term(&views, entry_id, term_number)?;
        if !view.actions.contains(&TermAction::Skip) {
            return Err(DomainError::validation(format!(
                "Term {} is {:?} and cannot be skipped",
                term_number, view.status
            ))
            .into());
        }

        let mut skipped = view.term.clone();
        skipped.skipped = true;
        self.term_repository.update_term(&skipped).await?;

        let last = views
            .last()
            .map(|v| v.term.clone())
            .ok_or_else(|| DomainError::not_found("Term", entry_id))?;
        let appended = next_term(&last, frequency)
            .ok_or_else(|| DomainError::validation("Installment schedule runs past the supported date range"))?;
        self.term_repository.store_terms(std::slice::from_ref(&appended)).await?;

        entry.payment_terms = Some(appended.term_number);
        entry.updated_at = self.clock.now().to_rfc3339();
        self.entry_repository.update_entry(&entry).await?;

        info!(
            "Skipped term {} of entry {}; appended term {} due {}",
            term_number, entry_id, appended.term_number, appended.due_date
        );

        let views = self.term_views(entry_id, start_date).await?;
        Ok(SkipTermResult {
            skipped: Self::find_term(&views, entry_id, term_number)?.clone(),
            appended: Self::find_term(&views, entry_id, appended.term_number)?.clone(),
        })
    }

    pub async fn update_term_notes(&self, entry_id: &str, term_number: u32, notes: &str) -> Result<TermView> {
        let (_, start_date) = self.installment_entry(entry_id).await?;
        let views = self.term_views(entry_id, start_date).await?;

        let mut term = Self::find_term(&views, entry_id, term_number)?.term.clone();
        term.notes = notes.trim().to_string();
        self.term_repository.update_term(&term).await?;

        let views = self.term_views(entry_id, start_date).await?;
        Ok(Self::find_term(&views, entry_id, term_number)?.clone())
    }

    async fn installment_entry(&self, entry_id: &str) -> Result<(DomainEntry, NaiveDate)> {
        let entry = self
            .entry_repository
            .get_entry(entry_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Entry", entry_id))?;

        match entry.installment_start_date {
            Some(start_date) if entry.is_installment() => Ok((entry, start_date)),
            _ => Err(DomainError::validation("Only installment entries have terms").into()),
        }
    }

    async fn term_views(&self, entry_id: &str, start_date: NaiveDate) -> Result<Vec<TermView>> {
        let terms = self.term_repository.list_terms_for_entry(entry_id).await?;
        let payments = self.payment_repository.list_payments_for_entry(entry_id).await?;
        Ok(derive_term_views(start_date, &terms, &payments, self.clock.today()))
    }

    fn find_term<'a>(views: &'a [TermView], entry_id: &str, term_number: u32) -> Result<&'a TermView> {
        views
            .iter()
            .find(|v| v.term.term_number == term_number)
            .ok_or_else(|| DomainError::not_found("Term", format!("{} #{}", entry_id, term_number)).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::balance_service::BalanceService;
    use crate::backend::domain::clock::FixedClock;
    use crate::backend::domain::commands::payments::CreatePaymentCommand;
    use crate::backend::domain::entry_service::tests::{date, installment_request, seed_parties, straight_request};
    use crate::backend::domain::entry_service::EntryService;
    use crate::backend::domain::payment_service::PaymentService;
    use crate::backend::storage::csv::test_utils::TestEnvironment;
    use crate::backend::storage::CsvConnection;
    use rust_decimal_macros::dec;
    use shared::{InstallmentStatus, PaymentFrequency, UpdateEntryRequest};

    struct Harness {
        entries: EntryService<CsvConnection>,
        payments: PaymentService<CsvConnection>,
        installments: InstallmentService<CsvConnection>,
        _env: TestEnvironment,
    }

    async fn create_test_service(today: NaiveDate) -> Harness {
        let env = TestEnvironment::new().await.unwrap();
        seed_parties(&env.connection).await;

        let connection = Arc::new(env.connection.clone());
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::on(today));
        let balance_service = BalanceService::new(connection.clone(), clock.clone());

        Harness {
            entries: EntryService::new(connection.clone(), balance_service.clone(), clock.clone()),
            payments: PaymentService::new(connection.clone(), balance_service, clock.clone()),
            installments: InstallmentService::new(connection, clock),
            _env: env,
        }
    }

    #[tokio::test]
    async fn test_list_terms_derives_status() {
        let h = create_test_service(date(2024, 2, 1)).await;
        let entry = h.entries.create_entry(installment_request(dec!(300), 3)).await.unwrap().entry;

        let terms = h.installments.list_terms(&entry.id).await.unwrap();
        assert_eq!(terms.len(), 3);
        // Due today: unpaid, not yet delinquent
        assert_eq!(terms[0].status, InstallmentStatus::Unpaid);
        assert_eq!(terms[0].actions, vec![TermAction::RecordPayment, TermAction::Skip]);
        assert_eq!(terms[1].status, InstallmentStatus::NotStarted);
    }

    #[tokio::test]
    async fn test_skip_appends_term() {
        let h = create_test_service(date(2024, 2, 2)).await;
        let entry = h.entries.create_entry(installment_request(dec!(300), 3)).await.unwrap().entry;

        let result = h.installments.skip_term(&entry.id, 1).await.unwrap();
        assert_eq!(result.skipped.status, InstallmentStatus::Skipped);
        assert!(result.skipped.actions.is_empty());
        assert_eq!(result.appended.term.term_number, 4);
        assert_eq!(result.appended.term.due_date, date(2024, 5, 1));
        assert_eq!(result.appended.status, InstallmentStatus::NotStarted);
        assert!(result.appended.term.notes.is_empty());

        let terms = h.installments.list_terms(&entry.id).await.unwrap();
        let numbers: Vec<u32> = terms.iter().map(|t| t.term.term_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);

        let entry = h.entries.get_entry(&entry.id).await.unwrap();
        assert_eq!(entry.payment_terms, Some(4));
    }

    #[tokio::test]
    async fn test_skipped_term_is_terminal() {
        let h = create_test_service(date(2024, 2, 2)).await;
        let entry = h.entries.create_entry(installment_request(dec!(300), 3)).await.unwrap().entry;
        h.installments.skip_term(&entry.id, 1).await.unwrap();

        // Neither a second skip nor a payment is accepted
        assert!(h.installments.skip_term(&entry.id, 1).await.is_err());
        let err = h
            .payments
            .create_payment(CreatePaymentCommand {
                entry_id: entry.id.clone(),
                amount: dec!(100),
                date: None,
                payee_id: "person::borrower".to_string(),
                note: String::new(),
                proof_refs: Vec::new(),
                term_number: Some(1),
                allocation_id: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Term 1 is Skipped and cannot take a payment");

        let terms = h.installments.list_terms(&entry.id).await.unwrap();
        assert_eq!(terms[0].status, InstallmentStatus::Skipped);
    }

    #[tokio::test]
    async fn test_skip_freezes_schedule_fields() {
        let h = create_test_service(date(2024, 2, 2)).await;
        let entry = h.entries.create_entry(installment_request(dec!(300), 3)).await.unwrap().entry;
        h.installments.skip_term(&entry.id, 1).await.unwrap();

        let err = h
            .entries
            .update_entry(
                &entry.id,
                UpdateEntryRequest {
                    installment_start_date: Some(date(2024, 1, 2)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::FieldLocked("installment_start_date"))
        ));

        // Edits that leave the schedule alone still go through
        let renamed = h
            .entries
            .update_entry(
                &entry.id,
                UpdateEntryRequest {
                    name: Some("Laptop".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.installment_start_date, Some(date(2024, 1, 1)));

        let terms = h.installments.list_terms(&entry.id).await.unwrap();
        assert_eq!(terms.len(), 4);
        assert_eq!(terms[0].status, InstallmentStatus::Skipped);
    }

    #[tokio::test]
    async fn test_cannot_skip_future_term() {
        let h = create_test_service(date(2024, 2, 2)).await;
        let entry = h.entries.create_entry(installment_request(dec!(300), 3)).await.unwrap().entry;

        let err = h.installments.skip_term(&entry.id, 2).await.unwrap_err();
        assert_eq!(err.to_string(), "Term 2 is NotStarted and cannot be skipped");
    }

    #[tokio::test]
    async fn test_weekly_skip_adds_seven_days() {
        let h = create_test_service(date(2024, 1, 8)).await;
        let mut request = installment_request(dec!(200), 2);
        if let Some(plan) = request.installment.as_mut() {
            plan.payment_frequency = PaymentFrequency::Weekly;
        }
        let entry = h.entries.create_entry(request).await.unwrap().entry;

        let result = h.installments.skip_term(&entry.id, 1).await.unwrap();
        assert_eq!(result.appended.term.due_date, date(2024, 1, 22));
    }

    #[tokio::test]
    async fn test_update_term_notes() {
        let h = create_test_service(date(2024, 1, 15)).await;
        let entry = h.entries.create_entry(installment_request(dec!(300), 3)).await.unwrap().entry;

        let view = h
            .installments
            .update_term_notes(&entry.id, 2, "  will pay late  ")
            .await
            .unwrap();
        assert_eq!(view.term.notes, "will pay late");
        assert_eq!(view.term.term_number, 2);
    }

    #[tokio::test]
    async fn test_straight_entry_has_no_terms() {
        let h = create_test_service(date(2024, 1, 15)).await;
        let entry = h.entries.create_entry(straight_request(dec!(30))).await.unwrap().entry;

        assert!(h.installments.list_terms(&entry.id).await.is_err());
        assert!(h.installments.list_terms("entry::missing").await.is_err());
    }
}
