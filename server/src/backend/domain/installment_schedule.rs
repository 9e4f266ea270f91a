//! Installment schedule rules.
//!
//! Builds the term schedule of an INSTALLMENT entry and derives each term's
//! status from its due date, its own payment, its skip flag and today's date.
//! Everything here is a pure function of its inputs.

use chrono::{Days, Months, NaiveDate};
use rust_decimal::Decimal;
use shared::{IdKind, InstallmentStatus, Payment, PaymentFrequency, TermAction};

use crate::backend::domain::models::DomainTerm;
use crate::backend::domain::money::round_cents;

/// Everything the term status depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermStatusInput {
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
    pub has_payment: bool,
    pub skipped: bool,
    pub today: NaiveDate,
}

/// Derive a term's status; the first matching rule wins
///
/// Payment and skip always override the date comparisons. Dates are plain
/// calendar days, so there is no time-of-day to drift across midnight.
pub fn derive_term_status(input: TermStatusInput) -> InstallmentStatus {
    if input.today < input.start_date {
        return InstallmentStatus::NotStarted;
    }
    if input.has_payment {
        return InstallmentStatus::Paid;
    }
    if input.skipped {
        return InstallmentStatus::Skipped;
    }
    if input.today < input.due_date {
        return InstallmentStatus::NotStarted;
    }
    if input.today == input.due_date {
        return InstallmentStatus::Unpaid;
    }
    if input.today > input.due_date {
        return InstallmentStatus::Delinquent;
    }
    InstallmentStatus::Unpaid
}

/// Actions a client may offer for a term in the given status
pub fn allowed_term_actions(status: InstallmentStatus) -> Vec<TermAction> {
    match status {
        InstallmentStatus::Unpaid | InstallmentStatus::Delinquent => {
            vec![TermAction::RecordPayment, TermAction::Skip]
        }
        InstallmentStatus::NotStarted | InstallmentStatus::Paid | InstallmentStatus::Skipped => {
            Vec::new()
        }
    }
}

/// Longest schedule an entry may have: fifty years of monthly terms
pub const MAX_PAYMENT_TERMS: u32 = 600;

/// Advance a date by `units` payment periods
///
/// Monthly steps land on the same day of the month, clamped to the month's
/// last day. Returns None if the result is out of range.
pub fn advance(date: NaiveDate, frequency: PaymentFrequency, units: u32) -> Option<NaiveDate> {
    match frequency {
        PaymentFrequency::Monthly => date.checked_add_months(Months::new(units)),
        PaymentFrequency::Weekly => date.checked_add_days(Days::new(7 * u64::from(units))),
    }
}

/// Build terms `1..=count`, term `n` falling due `n` periods after the start
pub fn build_schedule(
    entry_id: &str,
    start_date: NaiveDate,
    frequency: PaymentFrequency,
    count: u32,
) -> Option<Vec<DomainTerm>> {
    (1..=count)
        .map(|term_number| {
            advance(start_date, frequency, term_number).map(|due_date| DomainTerm {
                id: shared::generate_id(IdKind::Term),
                entry_id: entry_id.to_string(),
                term_number,
                due_date,
                skipped: false,
                notes: String::new(),
            })
        })
        .collect()
}

/// Due date one payment period after `last_due`
pub fn next_due_date(last_due: NaiveDate, frequency: PaymentFrequency) -> Option<NaiveDate> {
    advance(last_due, frequency, 1)
}

/// The term appended to the end of the schedule when a term is skipped
pub fn next_term(last: &DomainTerm, frequency: PaymentFrequency) -> Option<DomainTerm> {
    next_due_date(last.due_date, frequency).map(|due_date| DomainTerm {
        id: shared::generate_id(IdKind::Term),
        entry_id: last.entry_id.clone(),
        term_number: last.term_number + 1,
        due_date,
        skipped: false,
        notes: String::new(),
    })
}

/// `amount_borrowed / terms` rounded to the cent
pub fn payment_amount_per_term(amount_borrowed: Decimal, terms: u32) -> Option<Decimal> {
    if terms == 0 {
        return None;
    }
    Some(round_cents(amount_borrowed / Decimal::from(terms)))
}

/// A term together with everything derived about it
#[derive(Debug, Clone, PartialEq)]
pub struct TermView {
    pub term: DomainTerm,
    pub status: InstallmentStatus,
    pub actions: Vec<TermAction>,
    pub payment_id: Option<String>,
}

/// Derive the status of every term of an entry for `today`
pub fn derive_term_views(
    start_date: NaiveDate,
    terms: &[DomainTerm],
    payments: &[Payment],
    today: NaiveDate,
) -> Vec<TermView> {
    terms
        .iter()
        .map(|term| {
            let payment_id = payments
                .iter()
                .find(|p| p.term_id.as_deref() == Some(term.id.as_str()))
                .map(|p| p.id.clone());

            let status = derive_term_status(TermStatusInput {
                start_date,
                due_date: term.due_date,
                has_payment: payment_id.is_some(),
                skipped: term.skipped,
                today,
            });

            TermView {
                term: term.clone(),
                status,
                actions: allowed_term_actions(status),
                payment_id,
            }
        })
        .collect()
}
