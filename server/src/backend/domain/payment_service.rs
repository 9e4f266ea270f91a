//! Payment ledger service for the loan tracker.
//!
//! Payments are append-only: they are recorded and deleted, never edited.
//! Every change to the ledger is followed by a re-derivation of the parent
//! entry's balance before the call returns, so callers always see the entry
//! as it stands after their own change.
//!
//! ## Business Rules
//!
//! - Amounts are positive, no larger than [`MAX_AMOUNT`], and the payee is a
//!   known person
//! - A term takes one payment, and only while it offers `RECORD_PAYMENT`
//! - A payment against an allocation never exceeds what is left on it
//! - Direct payments on the entry are not capped; the remaining amount
//!   bottoms out at zero

use anyhow::Result;
use chrono::NaiveDate;
use log::{info, warn};
use rust_decimal::Decimal;
use shared::{IdKind, InstallmentStatus, Payment, TermAction};
use std::sync::Arc;

use crate::backend::domain::allocation_status::AllocationView;
use crate::backend::domain::balance_service::{total_paid_for_entry, BalanceService};
use crate::backend::domain::clock::Clock;
use crate::backend::domain::commands::payments::{
    CreatePaymentCommand, CreatePaymentResult, DeletePaymentResult,
};
use crate::backend::domain::errors::DomainError;
use crate::backend::domain::installment_schedule::derive_term_views;
use crate::backend::domain::models::DomainEntry;
use crate::backend::domain::money::MAX_AMOUNT;
use crate::backend::storage::{
    AllocationStorage, Connection, EntryStorage, PaymentStorage, PersonStorage, TermStorage,
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PaymentValidationError {
    #[error("Payment amount must be greater than zero")]
    NonPositiveAmount,
    #[error("Payment amount cannot exceed {max}", max = MAX_AMOUNT)]
    AmountTooLarge,
    #[error("Payments on this entry would exceed the supported range")]
    LedgerOverflow,
    #[error("Payee {0} not found")]
    UnknownPayee(String),
    #[error("A payment can target a term or an allocation, not both")]
    TermAndAllocation,
    #[error("Only installment entries have terms")]
    NotInstallment,
    #[error("Only group entries have allocations")]
    NotGroup,
    #[error("Term {term_number} is {status:?} and cannot take a payment")]
    TermNotPayable {
        term_number: u32,
        status: InstallmentStatus,
    },
    #[error("Payment of {amount:.2} exceeds the {max_payable:.2} left on this allocation")]
    ExceedsAllocation { amount: Decimal, max_payable: Decimal },
}

impl From<PaymentValidationError> for DomainError {
    fn from(error: PaymentValidationError) -> Self {
        DomainError::Validation(error.to_string())
    }
}

/// Service for recording and removing payments
#[derive(Clone)]
pub struct PaymentService<C: Connection> {
    payment_repository: C::PaymentRepository,
    entry_repository: C::EntryRepository,
    term_repository: C::TermRepository,
    allocation_repository: C::AllocationRepository,
    person_repository: C::PersonRepository,
    balance_service: BalanceService<C>,
    clock: Arc<dyn Clock>,
}

impl<C: Connection> PaymentService<C> {
    pub fn new(connection: Arc<C>, balance_service: BalanceService<C>, clock: Arc<dyn Clock>) -> Self {
        Self {
            payment_repository: connection.create_payment_repository(),
            entry_repository: connection.create_entry_repository(),
            term_repository: connection.create_term_repository(),
            allocation_repository: connection.create_allocation_repository(),
            person_repository: connection.create_person_repository(),
            balance_service,
            clock,
        }
    }

    /// Record a payment and re-derive the entry's balance
    pub async fn create_payment(&self, command: CreatePaymentCommand) -> Result<CreatePaymentResult> {
        info!(
            "Recording payment of {} on entry {} (term {:?}, allocation {:?})",
            command.amount, command.entry_id, command.term_number, command.allocation_id
        );

        if command.amount <= Decimal::ZERO {
            return Err(DomainError::from(PaymentValidationError::NonPositiveAmount).into());
        }
        if command.amount > MAX_AMOUNT {
            return Err(DomainError::from(PaymentValidationError::AmountTooLarge).into());
        }
        if command.term_number.is_some() && command.allocation_id.is_some() {
            return Err(DomainError::from(PaymentValidationError::TermAndAllocation).into());
        }

        let entry = self
            .entry_repository
            .get_entry(&command.entry_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Entry", &command.entry_id))?;

        if self.person_repository.get_person(&command.payee_id).await?.is_none() {
            return Err(DomainError::from(PaymentValidationError::UnknownPayee(command.payee_id)).into());
        }

        let payments = self.payment_repository.list_payments_for_entry(&entry.id).await?;
        if total_paid_for_entry(&entry.id, &payments)
            .and_then(|total| total.checked_add(command.amount))
            .is_none()
        {
            return Err(DomainError::from(PaymentValidationError::LedgerOverflow).into());
        }

        let term_id = match command.term_number {
            Some(term_number) => Some(self.payable_term(&entry, term_number, &payments).await?),
            None => None,
        };

        if let Some(allocation_id) = &command.allocation_id {
            self.check_allocation_cap(&entry, allocation_id, command.amount, &payments)
                .await?;
        }

        let payment = Payment {
            id: shared::generate_id(IdKind::Payment),
            entry_id: entry.id.clone(),
            amount: command.amount,
            date: command.date.unwrap_or_else(|| self.clock.today()),
            payee_id: command.payee_id,
            note: command.note.trim().to_string(),
            proof_refs: command.proof_refs,
            term_id,
            allocation_id: command.allocation_id,
            created_at: self.clock.now().to_rfc3339(),
        };

        self.payment_repository.store_payment(&payment).await?;
        let entry = self.balance_service.refresh_entry(&entry.id).await?;

        info!("Recorded payment {} on entry {}", payment.id, entry.id);
        Ok(CreatePaymentResult { payment, entry })
    }

    pub async fn get_payment(&self, payment_id: &str) -> Result<Payment> {
        self.payment_repository
            .get_payment(payment_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Payment", payment_id).into())
    }

    /// Every payment of an entry, in date order
    pub async fn list_payments(&self, entry_id: &str) -> Result<Vec<Payment>> {
        if self.entry_repository.get_entry(entry_id).await?.is_none() {
            return Err(DomainError::not_found("Entry", entry_id).into());
        }
        self.payment_repository.list_payments_for_entry(entry_id).await
    }

    /// Delete a payment and re-derive whatever it contributed to
    ///
    /// A payment whose entry is already gone is simply removed.
    pub async fn delete_payment(&self, payment_id: &str) -> Result<DeletePaymentResult> {
        info!("Deleting payment {}", payment_id);

        let payment = self.get_payment(payment_id).await?;
        self.payment_repository.delete_payment(payment_id).await?;

        let entry = match self.entry_repository.get_entry(&payment.entry_id).await? {
            Some(_) => Some(self.balance_service.refresh_entry(&payment.entry_id).await?),
            None => {
                warn!("Payment {} belonged to missing entry {}", payment.id, payment.entry_id);
                None
            }
        };

        Ok(DeletePaymentResult { payment, entry })
    }

    /// ID of the term a payment may be recorded against
    async fn payable_term(&self, entry: &DomainEntry, term_number: u32, payments: &[Payment]) -> Result<String> {
        let start_date = match entry.installment_start_date {
            Some(start_date) if entry.is_installment() => start_date,
            _ => return Err(DomainError::from(PaymentValidationError::NotInstallment).into()),
        };

        let terms = self.term_repository.list_terms_for_entry(&entry.id).await?;
        let view = derive_term_views(start_date, &terms, payments, self.today())
            .into_iter()
            .find(|v| v.term.term_number == term_number)
            .ok_or_else(|| DomainError::not_found("Term", format!("{} #{}", entry.id, term_number)))?;

        if !view.actions.contains(&TermAction::RecordPayment) {
            return Err(DomainError::from(PaymentValidationError::TermNotPayable {
                term_number,
                status: view.status,
            })
            .into());
        }
        Ok(view.term.id)
    }

    async fn check_allocation_cap(
        &self,
        entry: &DomainEntry,
        allocation_id: &str,
        amount: Decimal,
        payments: &[Payment],
    ) -> Result<()> {
        if !entry.is_group() {
            return Err(DomainError::from(PaymentValidationError::NotGroup).into());
        }

        let allocation = self
            .allocation_repository
            .get_allocation(allocation_id)
            .await?
            .filter(|a| a.entry_id == entry.id)
            .ok_or_else(|| DomainError::not_found("Allocation", allocation_id))?;

        let view = AllocationView::derive(&allocation, payments);
        if amount > view.max_payable {
            return Err(DomainError::from(PaymentValidationError::ExceedsAllocation {
                amount,
                max_payable: view.max_payable,
            })
            .into());
        }
        Ok(())
    }

    fn today(&self) -> NaiveDate {
        self.clock.today()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::clock::FixedClock;
    use crate::backend::domain::entry_service::tests::{
        date, group_request, installment_request, seed_parties, straight_request,
    };
    use crate::backend::domain::entry_service::EntryService;
    use crate::backend::storage::csv::test_utils::TestEnvironment;
    use crate::backend::storage::CsvConnection;
    use rust_decimal_macros::dec;
    use shared::PaymentStatus;

    struct Harness {
        entries: EntryService<CsvConnection>,
        payments: PaymentService<CsvConnection>,
        _env: TestEnvironment,
    }

    async fn create_test_service() -> Harness {
        let env = TestEnvironment::new().await.unwrap();
        seed_parties(&env.connection).await;

        let connection = Arc::new(env.connection.clone());
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::on(date(2024, 2, 15)));
        let balance_service = BalanceService::new(connection.clone(), clock.clone());

        Harness {
            entries: EntryService::new(connection.clone(), balance_service.clone(), clock.clone()),
            payments: PaymentService::new(connection, balance_service, clock),
            _env: env,
        }
    }

    fn command(entry_id: &str, amount: Decimal) -> CreatePaymentCommand {
        CreatePaymentCommand {
            entry_id: entry_id.to_string(),
            amount,
            date: None,
            payee_id: "person::lender".to_string(),
            note: String::new(),
            proof_refs: Vec::new(),
            term_number: None,
            allocation_id: None,
        }
    }

    fn validation_message(err: &anyhow::Error) -> String {
        match err.downcast_ref::<DomainError>() {
            Some(DomainError::Validation(message)) => message.clone(),
            other => panic!("expected a validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_payments_drive_entry_status() {
        let h = create_test_service().await;
        let entry = h.entries.create_entry(straight_request(dec!(100))).await.unwrap().entry;

        let first = h.payments.create_payment(command(&entry.id, dec!(40))).await.unwrap();
        assert_eq!(first.payment.date, date(2024, 2, 15));
        assert_eq!(first.entry.amount_remaining, dec!(60));
        assert_eq!(first.entry.status, PaymentStatus::PartiallyPaid);

        let second = h.payments.create_payment(command(&entry.id, dec!(60))).await.unwrap();
        assert_eq!(second.entry.status, PaymentStatus::Paid);
        assert_eq!(second.entry.amount_remaining, dec!(0));
        assert!(second.entry.date_fully_paid.is_some());

        // Deleting re-opens the entry and clears the completion date
        let deleted = h.payments.delete_payment(&second.payment.id).await.unwrap();
        let entry = deleted.entry.unwrap();
        assert_eq!(entry.status, PaymentStatus::PartiallyPaid);
        assert_eq!(entry.amount_remaining, dec!(60));
        assert_eq!(entry.date_fully_paid, None);

        assert_eq!(h.payments.list_payments(&entry.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_overpayment_clamps_remaining() {
        let h = create_test_service().await;
        let entry = h.entries.create_entry(straight_request(dec!(50))).await.unwrap().entry;

        let result = h.payments.create_payment(command(&entry.id, dec!(80))).await.unwrap();
        assert_eq!(result.entry.amount_remaining, dec!(0));
        assert_eq!(result.entry.status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn test_payment_validation() {
        let h = create_test_service().await;
        let entry = h.entries.create_entry(straight_request(dec!(50))).await.unwrap().entry;

        let err = h.payments.create_payment(command(&entry.id, dec!(0))).await.unwrap_err();
        assert_eq!(validation_message(&err), "Payment amount must be greater than zero");

        let mut stranger = command(&entry.id, dec!(5));
        stranger.payee_id = "person::ghost".to_string();
        let err = h.payments.create_payment(stranger).await.unwrap_err();
        assert_eq!(validation_message(&err), "Payee person::ghost not found");

        let err = h.payments.create_payment(command("entry::missing", dec!(5))).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::NotFound { .. })
        ));

        let mut term = command(&entry.id, dec!(5));
        term.term_number = Some(1);
        let err = h.payments.create_payment(term).await.unwrap_err();
        assert_eq!(validation_message(&err), "Only installment entries have terms");
    }

    #[tokio::test]
    async fn test_out_of_range_payment_is_not_stored() {
        let h = create_test_service().await;
        let entry = h.entries.create_entry(straight_request(dec!(50))).await.unwrap().entry;

        let half = Decimal::MAX / dec!(2) + dec!(1);
        let err = h.payments.create_payment(command(&entry.id, half)).await.unwrap_err();
        assert_eq!(validation_message(&err), "Payment amount cannot exceed 1000000000000");
        assert!(h.payments.list_payments(&entry.id).await.unwrap().is_empty());

        // The entry is unharmed and still takes ordinary payments
        let result = h.payments.create_payment(command(&entry.id, dec!(20))).await.unwrap();
        assert_eq!(result.entry.amount_remaining, dec!(30));

        // A ledger already pushed past the range by hand is reported, not summed
        let repository = h._env.connection.create_payment_repository();
        for _ in 0..2 {
            let mut payment = result.payment.clone();
            payment.id = shared::generate_id(IdKind::Payment);
            payment.amount = half;
            repository.store_payment(&payment).await.unwrap();
        }
        let err = h.payments.create_payment(command(&entry.id, dec!(1))).await.unwrap_err();
        assert_eq!(validation_message(&err), "Payments on this entry would exceed the supported range");
        let err = h.entries.refresh_balance(&entry.id).await.unwrap_err();
        assert!(validation_message(&err).contains("exceed the supported range"));
    }

    #[tokio::test]
    async fn test_term_payment_rules() {
        let h = create_test_service().await;
        let entry = h.entries.create_entry(installment_request(dec!(300), 3)).await.unwrap().entry;

        // Term 1 is due 2024-02-01 and delinquent on 2024-02-15
        let mut pay_first = command(&entry.id, dec!(100));
        pay_first.term_number = Some(1);
        let result = h.payments.create_payment(pay_first.clone()).await.unwrap();
        assert!(result.payment.term_id.is_some());
        assert_eq!(result.entry.amount_remaining, dec!(200));

        // At most one payment per term
        let err = h.payments.create_payment(pay_first).await.unwrap_err();
        assert_eq!(validation_message(&err), "Term 1 is Paid and cannot take a payment");

        // Term 2 is not due yet
        let mut pay_second = command(&entry.id, dec!(100));
        pay_second.term_number = Some(2);
        let err = h.payments.create_payment(pay_second).await.unwrap_err();
        assert_eq!(validation_message(&err), "Term 2 is NotStarted and cannot take a payment");

        let mut missing = command(&entry.id, dec!(100));
        missing.term_number = Some(9);
        assert!(h.payments.create_payment(missing).await.is_err());
    }

    #[tokio::test]
    async fn test_allocation_payment_cap() {
        let h = create_test_service().await;
        let created = h.entries.create_entry(group_request(dec!(300), None)).await.unwrap();
        let allocation_id = created.allocations[0].id.clone();
        let entry_id = created.entry.id;

        let mut first = command(&entry_id, dec!(80));
        first.allocation_id = Some(allocation_id.clone());
        first.payee_id = "person::a".to_string();
        h.payments.create_payment(first).await.unwrap();

        // 100 due, 80 paid: at most 20 more
        let mut over = command(&entry_id, dec!(20.01));
        over.allocation_id = Some(allocation_id.clone());
        let err = h.payments.create_payment(over).await.unwrap_err();
        assert_eq!(
            validation_message(&err),
            "Payment of 20.01 exceeds the 20.00 left on this allocation"
        );

        let mut exact = command(&entry_id, dec!(20));
        exact.allocation_id = Some(allocation_id.clone());
        let result = h.payments.create_payment(exact).await.unwrap();
        assert_eq!(result.entry.amount_remaining, dec!(200));

        let detail = h.entries.get_entry_detail(&entry_id).await.unwrap();
        assert_eq!(detail.allocations[0].status, PaymentStatus::Paid);
        assert!(detail.is_locked);
    }

    #[tokio::test]
    async fn test_delete_payment_of_deleted_entry() {
        let h = create_test_service().await;
        let entry = h.entries.create_entry(straight_request(dec!(50))).await.unwrap().entry;
        let payment = h.payments.create_payment(command(&entry.id, dec!(10))).await.unwrap().payment;

        // Remove only the entry header, leaving the payment orphaned
        h._env.connection.create_entry_repository().delete_entry(&entry.id).await.unwrap();

        let result = h.payments.delete_payment(&payment.id).await.unwrap();
        assert!(result.entry.is_none());
        assert!(h.payments.get_payment(&payment.id).await.is_err());
    }
}
