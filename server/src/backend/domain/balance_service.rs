//! Balance management service for the loan tracker.
//!
//! Turns an entry's payment ledger into its remaining amount, payment status
//! and completion date. The derivation itself is a set of pure functions; the
//! service wraps them with the storage round trip that runs after every
//! ledger change.

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::info;
use rust_decimal::Decimal;
use shared::{Payment, PaymentStatus};
use std::sync::Arc;

use crate::backend::domain::clock::Clock;
use crate::backend::domain::errors::DomainError;
use crate::backend::domain::models::DomainEntry;
use crate::backend::storage::{Connection, EntryStorage, PaymentStorage};

/// Remaining amount and status derived from an entry's ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryBalance {
    pub amount_remaining: Decimal,
    pub status: PaymentStatus,
}

/// Derive the remaining amount and status of an entry from what has been paid
pub fn derive_entry_balance(amount_borrowed: Decimal, total_paid: Decimal) -> EntryBalance {
    let amount_remaining = (amount_borrowed - total_paid).max(Decimal::ZERO);

    let status = if amount_remaining.is_zero() {
        PaymentStatus::Paid
    } else if amount_remaining < amount_borrowed {
        PaymentStatus::PartiallyPaid
    } else {
        PaymentStatus::Unpaid
    };

    EntryBalance {
        amount_remaining,
        status,
    }
}

/// Sum of every payment attributed to the entry, whether it was made
/// directly or against one of the entry's terms or allocations
///
/// None when the sum leaves the range a `Decimal` can hold.
pub fn total_paid_for_entry(entry_id: &str, payments: &[Payment]) -> Option<Decimal> {
    payments
        .iter()
        .filter(|p| p.entry_id == entry_id)
        .try_fold(Decimal::ZERO, |total, p| total.checked_add(p.amount))
}

/// Write the derived balance onto the entry
///
/// `date_fully_paid` is stamped with `now` on the transition to zero, kept
/// while the entry stays paid, and cleared as soon as money is owed again.
/// Returns true when anything changed.
pub fn apply_entry_balance(entry: &mut DomainEntry, total_paid: Decimal, now: DateTime<Utc>) -> bool {
    let balance = derive_entry_balance(entry.amount_borrowed, total_paid);

    let date_fully_paid = if balance.status == PaymentStatus::Paid {
        entry
            .date_fully_paid
            .clone()
            .or_else(|| Some(now.to_rfc3339()))
    } else {
        None
    };

    let changed = entry.amount_remaining != balance.amount_remaining
        || entry.status != balance.status
        || entry.date_fully_paid != date_fully_paid;

    entry.amount_remaining = balance.amount_remaining;
    entry.status = balance.status;
    entry.date_fully_paid = date_fully_paid;

    changed
}

/// Service responsible for keeping stored entry balances in step with the ledger
#[derive(Clone)]
pub struct BalanceService<C: Connection> {
    entry_repository: C::EntryRepository,
    payment_repository: C::PaymentRepository,
    clock: Arc<dyn Clock>,
}

impl<C: Connection> BalanceService<C> {
    pub fn new(connection: Arc<C>, clock: Arc<dyn Clock>) -> Self {
        Self {
            entry_repository: connection.create_entry_repository(),
            payment_repository: connection.create_payment_repository(),
            clock,
        }
    }

    /// Re-derive and persist an entry's remaining amount, status and
    /// completion date from its full ledger
    pub async fn refresh_entry(&self, entry_id: &str) -> Result<DomainEntry> {
        let mut entry = self
            .entry_repository
            .get_entry(entry_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Entry", entry_id))?;

        let payments = self.payment_repository.list_payments_for_entry(entry_id).await?;
        let total_paid = total_paid_for_entry(entry_id, &payments).ok_or_else(|| {
            DomainError::validation(format!("Payments on entry {} exceed the supported range", entry_id))
        })?;

        if apply_entry_balance(&mut entry, total_paid, self.clock.now()) {
            entry.updated_at = self.clock.now().to_rfc3339();
            self.entry_repository.update_entry(&entry).await?;
            info!(
                "Entry {} now {:?} with {} remaining (paid {})",
                entry.id, entry.status, entry.amount_remaining, total_paid
            );
        }

        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal_macros::dec;
    use shared::TransactionType;

    fn entry(amount_borrowed: Decimal) -> DomainEntry {
        DomainEntry {
            id: "entry::1".to_string(),
            name: "Rent help".to_string(),
            description: String::new(),
            transaction_type: TransactionType::Straight,
            lender_id: "person::lender".to_string(),
            borrower_id: Some("person::borrower".to_string()),
            borrower_group_id: None,
            amount_borrowed,
            amount_remaining: amount_borrowed,
            status: PaymentStatus::Unpaid,
            date_borrowed: None,
            date_fully_paid: None,
            installment_start_date: None,
            payment_terms: None,
            payment_frequency: None,
            payment_amount_per_term: None,
            split_mode: None,
            notes: String::new(),
            proof_refs: Vec::new(),
            created_at: "2024-01-01T00:00:00+00:00".to_string(),
            updated_at: "2024-01-01T00:00:00+00:00".to_string(),
        }
    }

    fn payment(entry_id: &str, amount: Decimal) -> Payment {
        Payment {
            id: format!("payment::{}", amount),
            entry_id: entry_id.to_string(),
            amount,
            date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            payee_id: "person::lender".to_string(),
            note: String::new(),
            proof_refs: Vec::new(),
            term_id: None,
            allocation_id: None,
            created_at: "2024-01-10T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_derive_entry_balance_thresholds() {
        let unpaid = derive_entry_balance(dec!(100), dec!(0));
        assert_eq!(unpaid.status, PaymentStatus::Unpaid);
        assert_eq!(unpaid.amount_remaining, dec!(100));

        let partial = derive_entry_balance(dec!(100), dec!(40));
        assert_eq!(partial.status, PaymentStatus::PartiallyPaid);
        assert_eq!(partial.amount_remaining, dec!(60));

        let paid = derive_entry_balance(dec!(100), dec!(100));
        assert_eq!(paid.status, PaymentStatus::Paid);
        assert_eq!(paid.amount_remaining, dec!(0));
    }

    #[test]
    fn test_overpayment_clamps_to_zero() {
        let balance = derive_entry_balance(dec!(100), dec!(150.25));
        assert_eq!(balance.amount_remaining, dec!(0));
        assert_eq!(balance.status, PaymentStatus::Paid);
    }

    #[test]
    fn test_derivation_is_order_independent() {
        let forward = vec![payment("entry::1", dec!(10)), payment("entry::1", dec!(25.5))];
        let mut reversed = forward.clone();
        reversed.reverse();

        let a = derive_entry_balance(dec!(50), total_paid_for_entry("entry::1", &forward).unwrap());
        let b = derive_entry_balance(dec!(50), total_paid_for_entry("entry::1", &reversed).unwrap());
        assert_eq!(a, b);
        assert_eq!(a.amount_remaining, dec!(14.5));
    }

    #[test]
    fn test_total_paid_ignores_other_entries() {
        let payments = vec![
            payment("entry::1", dec!(10)),
            payment("entry::2", dec!(99)),
            payment("entry::1", dec!(5)),
        ];
        assert_eq!(total_paid_for_entry("entry::1", &payments), Some(dec!(15)));
        assert_eq!(total_paid_for_entry("entry::missing", &payments), Some(dec!(0)));
    }

    #[test]
    fn test_total_paid_out_of_range_is_none() {
        let half = Decimal::MAX / dec!(2) + dec!(1);
        let payments = vec![payment("entry::1", half), payment("entry::1", half)];
        assert_eq!(total_paid_for_entry("entry::1", &payments), None);
    }

    #[test]
    fn test_date_fully_paid_set_and_cleared() {
        let paid_at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 4, 1, 9, 30, 0).unwrap();
        let mut entry = entry(dec!(100));

        assert!(apply_entry_balance(&mut entry, dec!(100), paid_at));
        assert_eq!(entry.date_fully_paid, Some(paid_at.to_rfc3339()));

        // Still paid: the original completion date is kept
        assert!(!apply_entry_balance(&mut entry, dec!(120), later));
        assert_eq!(entry.date_fully_paid, Some(paid_at.to_rfc3339()));

        // A deletion re-opens the entry
        assert!(apply_entry_balance(&mut entry, dec!(60), later));
        assert_eq!(entry.date_fully_paid, None);
        assert_eq!(entry.status, PaymentStatus::PartiallyPaid);
        assert_eq!(entry.amount_remaining, dec!(40));
    }

    #[test]
    fn test_apply_is_idempotent() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let mut entry = entry(dec!(80));

        apply_entry_balance(&mut entry, dec!(30), now);
        let snapshot = entry.clone();
        assert!(!apply_entry_balance(&mut entry, dec!(30), now));
        assert_eq!(entry, snapshot);
    }
}
