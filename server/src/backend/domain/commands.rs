//! Domain-level command and result types
//! These structs are used by services inside the domain layer and are **not**
//! exposed over the public API. The REST layer is responsible for mapping the
//! public DTOs defined in the `shared` crate to and from these internal types.

pub mod entries {
    use shared::{PaymentStatus, SplitWarning, TransactionType, Payment};

    use crate::backend::domain::allocation_status::AllocationView;
    use crate::backend::domain::installment_schedule::TermView;
    use crate::backend::domain::models::{DomainAllocation, DomainEntry, DomainTerm};

    /// Filters for listing entries; `None` matches everything.
    #[derive(Debug, Clone, Default)]
    pub struct EntryListQuery {
        pub status: Option<PaymentStatus>,
        pub transaction_type: Option<TransactionType>,
    }

    impl EntryListQuery {
        pub fn matches(&self, entry: &DomainEntry) -> bool {
            self.status.map_or(true, |s| s == entry.status)
                && self
                    .transaction_type
                    .map_or(true, |t| t == entry.transaction_type)
        }
    }

    /// Result of creating an entry.
    #[derive(Debug, Clone)]
    pub struct CreateEntryResult {
        pub entry: DomainEntry,
        pub terms: Vec<DomainTerm>,
        pub allocations: Vec<DomainAllocation>,
        pub warnings: Vec<SplitWarning>,
    }

    /// An entry with its ledger and derived sub-schedules.
    #[derive(Debug, Clone)]
    pub struct EntryDetail {
        pub entry: DomainEntry,
        pub payments: Vec<Payment>,
        pub terms: Vec<TermView>,
        pub allocations: Vec<AllocationView>,
        pub is_locked: bool,
    }

    /// Result of validating an entry draft without storing it.
    #[derive(Debug, Clone)]
    pub struct ValidateEntryResult {
        pub errors: Vec<String>,
        pub warnings: Vec<SplitWarning>,
    }

    /// Result of deleting an entry and everything hanging off it.
    #[derive(Debug, Clone)]
    pub struct DeleteEntryResult {
        pub deleted_payments: u32,
        pub deleted_terms: u32,
        pub deleted_allocations: u32,
    }
}

pub mod payments {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use shared::Payment;

    use crate::backend::domain::models::DomainEntry;

    /// Input for recording a payment against an entry, one of its terms or
    /// one of its allocations.
    #[derive(Debug, Clone)]
    pub struct CreatePaymentCommand {
        pub entry_id: String,
        pub amount: Decimal,
        pub date: Option<NaiveDate>,
        pub payee_id: String,
        pub note: String,
        pub proof_refs: Vec<String>,
        pub term_number: Option<u32>,
        pub allocation_id: Option<String>,
    }

    /// Result of recording a payment.
    #[derive(Debug, Clone)]
    pub struct CreatePaymentResult {
        pub payment: Payment,
        /// Entry after its balance was re-derived
        pub entry: DomainEntry,
    }

    /// Result of deleting a payment.
    #[derive(Debug, Clone)]
    pub struct DeletePaymentResult {
        pub payment: Payment,
        /// None when the parent entry is already gone
        pub entry: Option<DomainEntry>,
    }
}

pub mod installments {
    use crate::backend::domain::installment_schedule::TermView;

    /// Result of skipping a term.
    #[derive(Debug, Clone)]
    pub struct SkipTermResult {
        pub skipped: TermView,
        pub appended: TermView,
    }
}

pub mod allocations {
    use rust_decimal::Decimal;
    use shared::{MemberShareInput, SplitMode, SplitWarning};

    use crate::backend::domain::allocation_splitter::SplitRow;

    /// Input for previewing a split without storing it.
    #[derive(Debug, Clone)]
    pub struct AllocationPreviewCommand {
        pub total: Decimal,
        pub split_mode: SplitMode,
        pub member_ids: Vec<String>,
        pub shares: Vec<MemberShareInput>,
    }

    /// Result of a split preview.
    #[derive(Debug, Clone)]
    pub struct AllocationPreviewResult {
        pub rows: Vec<SplitRow>,
        pub allocated_total: Decimal,
        pub warnings: Vec<SplitWarning>,
    }
}
