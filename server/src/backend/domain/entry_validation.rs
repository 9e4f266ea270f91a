//! Validation rules for creating and editing entries.
//!
//! ## Key Responsibilities
//!
//! - **Creation checks**: required fields, party collisions and installment
//!   plan sanity, collected into a list so a form can show all of them at once
//! - **Field lock**: once money has moved, the fields that define what is
//!   owed are frozen
//! - **Entry form state**: the borrower/lender collision rule and the
//!   auto-computed per-term amount that a client form applies while the user
//!   is typing

use rust_decimal::Decimal;
use shared::{CreateEntryRequest, TransactionType, UpdateEntryRequest};

use crate::backend::domain::errors::DomainError;
use crate::backend::domain::installment_schedule::{payment_amount_per_term, MAX_PAYMENT_TERMS};
use crate::backend::domain::models::DomainEntry;
use crate::backend::domain::money::MAX_AMOUNT;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntryValidationError {
    #[error("Entry name is required")]
    MissingName,
    #[error("Borrower is required")]
    MissingBorrower,
    #[error("Lender is required")]
    MissingLender,
    #[error("Amount borrowed must be greater than zero")]
    NonPositiveAmount,
    #[error("Amount borrowed cannot exceed {max}", max = MAX_AMOUNT)]
    AmountTooLarge,
    #[error("Borrower and lender must be different people")]
    BorrowerIsLender,
    #[error("Lender cannot be a member of the borrowing group")]
    LenderInBorrowerGroup,
    #[error("Group entries must name a borrower group, not a person")]
    GroupBorrowerRequired,
    #[error("Only group entries can be borrowed by a group")]
    PersonBorrowerRequired,
    #[error("Installment start date is required")]
    MissingStartDate,
    #[error("Number of payment terms must be a positive whole number")]
    InvalidPaymentTerms,
    #[error("Number of payment terms cannot exceed {max}", max = MAX_PAYMENT_TERMS)]
    TooManyPaymentTerms,
    #[error("Payment amount per term must be greater than zero")]
    NonPositiveAmountPerTerm,
    #[error("Payment amount per term cannot exceed {max}", max = MAX_AMOUNT)]
    AmountPerTermTooLarge,
}

impl From<EntryValidationError> for DomainError {
    fn from(error: EntryValidationError) -> Self {
        DomainError::Validation(error.to_string())
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// Check a new entry before anything is stored
///
/// `group_members` are the members of the borrower group, when the entry
/// names one that exists.
pub fn validate_new_entry(
    request: &CreateEntryRequest,
    group_members: Option<&[String]>,
) -> Vec<EntryValidationError> {
    let mut errors = Vec::new();

    if request.name.trim().is_empty() {
        errors.push(EntryValidationError::MissingName);
    }

    match request.transaction_type {
        TransactionType::Group => {
            if !is_blank(&request.borrower_id) {
                errors.push(EntryValidationError::GroupBorrowerRequired);
            } else if is_blank(&request.borrower_group_id) {
                errors.push(EntryValidationError::MissingBorrower);
            }
        }
        TransactionType::Straight | TransactionType::Installment => {
            if !is_blank(&request.borrower_group_id) {
                errors.push(EntryValidationError::PersonBorrowerRequired);
            } else if is_blank(&request.borrower_id) {
                errors.push(EntryValidationError::MissingBorrower);
            }
        }
    }

    if is_blank(&request.lender_id) {
        errors.push(EntryValidationError::MissingLender);
    } else if request.lender_id == request.borrower_id {
        errors.push(EntryValidationError::BorrowerIsLender);
    } else if let (Some(lender_id), Some(members)) = (&request.lender_id, group_members) {
        if members.iter().any(|m| m == lender_id) {
            errors.push(EntryValidationError::LenderInBorrowerGroup);
        }
    }

    match request.amount_borrowed {
        Some(amount) if amount > MAX_AMOUNT => errors.push(EntryValidationError::AmountTooLarge),
        Some(amount) if amount > Decimal::ZERO => {}
        _ => errors.push(EntryValidationError::NonPositiveAmount),
    }

    if request.transaction_type == TransactionType::Installment {
        let plan = request.installment.as_ref();

        if plan.and_then(|p| p.start_date).is_none() {
            errors.push(EntryValidationError::MissingStartDate);
        }

        match plan.and_then(|p| p.payment_terms) {
            Some(terms) if terms > MAX_PAYMENT_TERMS => errors.push(EntryValidationError::TooManyPaymentTerms),
            Some(terms) if terms > 0 => {}
            _ => errors.push(EntryValidationError::InvalidPaymentTerms),
        }

        if let Some(per_term) = plan.and_then(|p| p.payment_amount_per_term) {
            if per_term <= Decimal::ZERO {
                errors.push(EntryValidationError::NonPositiveAmountPerTerm);
            } else if per_term > MAX_AMOUNT {
                errors.push(EntryValidationError::AmountPerTermTooLarge);
            }
        }
    }

    errors
}

/// Reject edits to frozen fields
///
/// The transaction type never changes. The money and schedule fields only
/// change while no payment exists; sending the stored value back is not a
/// change.
pub fn check_field_lock(
    entry: &DomainEntry,
    update: &UpdateEntryRequest,
    has_payments: bool,
) -> Result<(), DomainError> {
    if let Some(transaction_type) = update.transaction_type {
        if transaction_type != entry.transaction_type {
            return Err(DomainError::TransactionTypeImmutable);
        }
    }

    if !has_payments {
        return Ok(());
    }

    fn changed<T: PartialEq>(requested: &Option<T>, current: &T) -> bool {
        requested.as_ref().map_or(false, |r| r != current)
    }

    let locked = [
        ("amount_borrowed", changed(&update.amount_borrowed, &entry.amount_borrowed)),
        ("payment_terms", changed(&update.payment_terms.map(Some), &entry.payment_terms)),
        (
            "payment_frequency",
            changed(&update.payment_frequency.map(Some), &entry.payment_frequency),
        ),
        (
            "payment_amount_per_term",
            changed(&update.payment_amount_per_term.map(Some), &entry.payment_amount_per_term),
        ),
        (
            "installment_start_date",
            changed(&update.installment_start_date.map(Some), &entry.installment_start_date),
        ),
        ("borrower_id", changed(&update.borrower_id.clone().map(Some), &entry.borrower_id)),
        (
            "borrower_group_id",
            changed(&update.borrower_group_id.clone().map(Some), &entry.borrower_group_id),
        ),
        ("lender_id", changed(&update.lender_id, &entry.lender_id)),
        ("split_mode", changed(&update.split_mode.map(Some), &entry.split_mode)),
    ];

    match locked.iter().find(|(_, is_changed)| *is_changed) {
        Some((field, _)) => Err(DomainError::FieldLocked(*field)),
        None => Ok(()),
    }
}

/// Client-side state of the entry form
///
/// Mirrors what a form does between keystrokes: choosing the same person on
/// both sides clears the lender and leaves a one-shot warning, and the per-term
/// amount follows the borrowed amount until the user types their own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryForm {
    borrower_id: Option<String>,
    lender_id: Option<String>,
    amount_borrowed: Option<Decimal>,
    payment_terms: Option<u32>,
    amount_per_term: Option<Decimal>,
    amount_per_term_overridden: bool,
    warning: Option<String>,
}

const SAME_PARTY_WARNING: &str = "Borrower and lender cannot be the same person";

impl EntryForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn borrower_id(&self) -> Option<&str> {
        self.borrower_id.as_deref()
    }

    pub fn lender_id(&self) -> Option<&str> {
        self.lender_id.as_deref()
    }

    pub fn amount_per_term(&self) -> Option<Decimal> {
        self.amount_per_term
    }

    pub fn set_borrower(&mut self, borrower_id: &str) {
        self.borrower_id = Some(borrower_id.to_string());
        self.clear_lender_on_collision();
    }

    pub fn set_lender(&mut self, lender_id: &str) {
        self.lender_id = Some(lender_id.to_string());
        self.clear_lender_on_collision();
    }

    pub fn set_amount_borrowed(&mut self, amount: Decimal) {
        self.amount_borrowed = Some(amount);
        self.recompute_amount_per_term();
    }

    pub fn set_payment_terms(&mut self, terms: u32) {
        self.payment_terms = Some(terms);
        self.recompute_amount_per_term();
    }

    /// The user typed a per-term amount; stop deriving it
    pub fn override_amount_per_term(&mut self, amount: Decimal) {
        self.amount_per_term = Some(amount);
        self.amount_per_term_overridden = true;
    }

    /// Pending warning, cleared once read
    pub fn take_warning(&mut self) -> Option<String> {
        self.warning.take()
    }

    fn clear_lender_on_collision(&mut self) {
        if self.borrower_id.is_some() && self.borrower_id == self.lender_id {
            self.lender_id = None;
            self.warning = Some(SAME_PARTY_WARNING.to_string());
        }
    }

    fn recompute_amount_per_term(&mut self) {
        if self.amount_per_term_overridden {
            return;
        }
        if let (Some(amount), Some(terms)) = (self.amount_borrowed, self.payment_terms) {
            self.amount_per_term = payment_amount_per_term(amount, terms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use shared::{InstallmentPlanRequest, PaymentFrequency, PaymentStatus, SplitMode};

    fn straight_request() -> CreateEntryRequest {
        CreateEntryRequest {
            name: "Concert tickets".to_string(),
            description: String::new(),
            transaction_type: TransactionType::Straight,
            lender_id: Some("person::lender".to_string()),
            borrower_id: Some("person::borrower".to_string()),
            borrower_group_id: None,
            amount_borrowed: Some(dec!(120)),
            date_borrowed: None,
            notes: String::new(),
            proof_refs: Vec::new(),
            installment: None,
            allocation: None,
        }
    }

    fn stored_entry() -> DomainEntry {
        DomainEntry {
            id: "entry::1".to_string(),
            name: "Laptop".to_string(),
            description: String::new(),
            transaction_type: TransactionType::Installment,
            lender_id: "person::lender".to_string(),
            borrower_id: Some("person::borrower".to_string()),
            borrower_group_id: None,
            amount_borrowed: dec!(900),
            amount_remaining: dec!(900),
            status: PaymentStatus::Unpaid,
            date_borrowed: None,
            date_fully_paid: None,
            installment_start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            payment_terms: Some(3),
            payment_frequency: Some(PaymentFrequency::Monthly),
            payment_amount_per_term: Some(dec!(300)),
            split_mode: None,
            notes: String::new(),
            proof_refs: Vec::new(),
            created_at: "2024-01-01T00:00:00+00:00".to_string(),
            updated_at: "2024-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_valid_straight_entry() {
        assert!(validate_new_entry(&straight_request(), None).is_empty());
    }

    #[test]
    fn test_missing_fields_are_all_reported() {
        let mut request = straight_request();
        request.name = "  ".to_string();
        request.lender_id = None;
        request.borrower_id = None;
        request.amount_borrowed = Some(dec!(-5));

        let errors = validate_new_entry(&request, None);
        assert_eq!(
            errors,
            vec![
                EntryValidationError::MissingName,
                EntryValidationError::MissingBorrower,
                EntryValidationError::MissingLender,
                EntryValidationError::NonPositiveAmount,
            ]
        );
    }

    #[test]
    fn test_borrower_cannot_be_lender() {
        let mut request = straight_request();
        request.lender_id = request.borrower_id.clone();
        assert_eq!(
            validate_new_entry(&request, None),
            vec![EntryValidationError::BorrowerIsLender]
        );
    }

    #[test]
    fn test_lender_cannot_be_in_borrower_group() {
        let mut request = straight_request();
        request.transaction_type = TransactionType::Group;
        request.borrower_id = None;
        request.borrower_group_id = Some("group::1".to_string());

        let members = vec!["person::lender".to_string(), "person::other".to_string()];
        assert_eq!(
            validate_new_entry(&request, Some(&members)),
            vec![EntryValidationError::LenderInBorrowerGroup]
        );
    }

    #[test]
    fn test_borrower_kind_must_match_type() {
        let mut group = straight_request();
        group.transaction_type = TransactionType::Group;
        assert_eq!(
            validate_new_entry(&group, None),
            vec![EntryValidationError::GroupBorrowerRequired]
        );

        let mut straight = straight_request();
        straight.borrower_group_id = Some("group::1".to_string());
        assert_eq!(
            validate_new_entry(&straight, None),
            vec![EntryValidationError::PersonBorrowerRequired]
        );
    }

    #[test]
    fn test_installment_plan_requirements() {
        let mut request = straight_request();
        request.transaction_type = TransactionType::Installment;
        assert_eq!(
            validate_new_entry(&request, None),
            vec![
                EntryValidationError::MissingStartDate,
                EntryValidationError::InvalidPaymentTerms,
            ]
        );

        request.installment = Some(InstallmentPlanRequest {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            payment_terms: Some(0),
            payment_frequency: PaymentFrequency::Weekly,
            payment_amount_per_term: Some(dec!(0)),
        });
        assert_eq!(
            validate_new_entry(&request, None),
            vec![
                EntryValidationError::InvalidPaymentTerms,
                EntryValidationError::NonPositiveAmountPerTerm,
            ]
        );
    }

    #[test]
    fn test_out_of_range_plan_is_rejected() {
        let mut request = straight_request();
        request.amount_borrowed = Some(Decimal::MAX);
        assert_eq!(
            validate_new_entry(&request, None),
            vec![EntryValidationError::AmountTooLarge]
        );

        request.amount_borrowed = Some(MAX_AMOUNT);
        request.transaction_type = TransactionType::Installment;
        request.installment = Some(InstallmentPlanRequest {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            payment_terms: Some(20_000),
            payment_frequency: PaymentFrequency::Monthly,
            payment_amount_per_term: Some(Decimal::MAX),
        });
        assert_eq!(
            validate_new_entry(&request, None),
            vec![
                EntryValidationError::TooManyPaymentTerms,
                EntryValidationError::AmountPerTermTooLarge,
            ]
        );

        if let Some(plan) = request.installment.as_mut() {
            plan.payment_terms = Some(MAX_PAYMENT_TERMS);
            plan.payment_amount_per_term = None;
        }
        assert!(validate_new_entry(&request, None).is_empty());
    }

    #[test]
    fn test_transaction_type_never_changes() {
        let update = UpdateEntryRequest {
            transaction_type: Some(TransactionType::Straight),
            ..Default::default()
        };
        assert!(matches!(
            check_field_lock(&stored_entry(), &update, false),
            Err(DomainError::TransactionTypeImmutable)
        ));
    }

    #[test]
    fn test_amount_locked_after_payment() {
        let update = UpdateEntryRequest {
            name: Some("Renamed".to_string()),
            amount_borrowed: Some(dec!(1000)),
            ..Default::default()
        };
        assert!(check_field_lock(&stored_entry(), &update, false).is_ok());
        assert!(matches!(
            check_field_lock(&stored_entry(), &update, true),
            Err(DomainError::FieldLocked("amount_borrowed"))
        ));
    }

    #[test]
    fn test_descriptive_fields_and_same_values_pass_the_lock() {
        let update = UpdateEntryRequest {
            name: Some("Renamed".to_string()),
            description: Some("New laptop".to_string()),
            notes: Some("Paid on time so far".to_string()),
            date_borrowed: NaiveDate::from_ymd_opt(2023, 12, 20),
            amount_borrowed: Some(dec!(900.00)),
            payment_terms: Some(3),
            transaction_type: Some(TransactionType::Installment),
            ..Default::default()
        };
        assert!(check_field_lock(&stored_entry(), &update, true).is_ok());
    }

    #[test]
    fn test_schedule_fields_locked_after_payment() {
        let frequency = UpdateEntryRequest {
            payment_frequency: Some(PaymentFrequency::Weekly),
            ..Default::default()
        };
        assert!(matches!(
            check_field_lock(&stored_entry(), &frequency, true),
            Err(DomainError::FieldLocked("payment_frequency"))
        ));

        let split = UpdateEntryRequest {
            split_mode: Some(SplitMode::Percent),
            ..Default::default()
        };
        assert!(matches!(
            check_field_lock(&stored_entry(), &split, true),
            Err(DomainError::FieldLocked("split_mode"))
        ));
    }

    #[test]
    fn test_form_clears_lender_on_collision() {
        let mut form = EntryForm::new();
        form.set_borrower("person::a");
        form.set_lender("person::a");

        assert_eq!(form.lender_id(), None);
        assert_eq!(form.borrower_id(), Some("person::a"));
        assert_eq!(form.take_warning().as_deref(), Some(SAME_PARTY_WARNING));
        // Transient: shown once
        assert_eq!(form.take_warning(), None);

        form.set_lender("person::b");
        form.set_borrower("person::b");
        assert_eq!(form.lender_id(), None);
        assert_eq!(form.borrower_id(), Some("person::b"));
    }

    #[test]
    fn test_form_amount_per_term_follows_until_overridden() {
        let mut form = EntryForm::new();
        form.set_amount_borrowed(dec!(1000));
        assert_eq!(form.amount_per_term(), None);

        form.set_payment_terms(3);
        assert_eq!(form.amount_per_term(), Some(dec!(333.33)));

        form.set_payment_terms(4);
        assert_eq!(form.amount_per_term(), Some(dec!(250)));

        form.override_amount_per_term(dec!(300));
        form.set_amount_borrowed(dec!(2000));
        assert_eq!(form.amount_per_term(), Some(dec!(300)));
    }
}
