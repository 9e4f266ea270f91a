//! Paid amount and status of each allocation of a GROUP entry.
//!
//! Every allocation is its own mini-ledger: only payments that name the
//! allocation count toward it.

use rust_decimal::Decimal;
use shared::{Payment, PaymentStatus};

use crate::backend::domain::models::DomainAllocation;

pub fn derive_allocation_status(amount: Decimal, amount_paid: Decimal) -> PaymentStatus {
    if amount_paid >= amount {
        PaymentStatus::Paid
    } else if amount_paid > Decimal::ZERO {
        PaymentStatus::PartiallyPaid
    } else {
        PaymentStatus::Unpaid
    }
}

/// Largest single payment the allocation still accepts
pub fn max_payable(amount: Decimal, amount_paid: Decimal) -> Decimal {
    (amount - amount_paid).max(Decimal::ZERO)
}

pub fn amount_paid_for_allocation(allocation_id: &str, payments: &[Payment]) -> Decimal {
    payments
        .iter()
        .filter(|p| p.allocation_id.as_deref() == Some(allocation_id))
        .map(|p| p.amount)
        .sum()
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationView {
    pub allocation: DomainAllocation,
    pub amount_paid: Decimal,
    pub status: PaymentStatus,
    pub max_payable: Decimal,
}

impl AllocationView {
    pub fn derive(allocation: &DomainAllocation, payments: &[Payment]) -> Self {
        let amount_paid = amount_paid_for_allocation(&allocation.id, payments);
        Self {
            allocation: allocation.clone(),
            amount_paid,
            status: derive_allocation_status(allocation.amount, amount_paid),
            max_payable: max_payable(allocation.amount, amount_paid),
        }
    }

    /// "Pay" is offered until the allocation is settled
    pub fn can_pay(&self) -> bool {
        self.status != PaymentStatus::Paid
    }
}

pub fn derive_allocation_views(allocations: &[DomainAllocation], payments: &[Payment]) -> Vec<AllocationView> {
    allocations
        .iter()
        .map(|allocation| AllocationView::derive(allocation, payments))
        .collect()
}
