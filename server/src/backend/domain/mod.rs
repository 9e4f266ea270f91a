//! # Domain Module
//!
//! Contains all business logic for the loan tracker.
//!
//! This module holds the rules that turn a stream of payments into an entry's
//! remaining balance and status, and the services that apply those rules on
//! top of a storage connection. It knows nothing about HTTP or file formats.
//!
//! ## Module Organization
//!
//! - **balance_service**: entry-level balance and status derivation
//! - **installment_schedule**: term schedule building and term status rules
//! - **allocation_splitter**: equal / percent / amount splits of a group expense
//! - **allocation_status**: paid amount, status and payment cap per allocation
//! - **entry_validation**: creation checks, the field lock and entry form state
//! - **\*_service**: CRUD and workflow services over a [`Connection`]
//!
//! ## Core Concepts
//!
//! - **Entry**: a loan or expense between a lender and a borrower (person or group)
//! - **Ledger**: the payments attributed to an entry, a term or an allocation
//! - **Term**: one scheduled slice of an INSTALLMENT entry
//! - **Allocation**: one member's share of a GROUP entry
//!
//! ## Business Rules
//!
//! - Remaining amount is `max(0, borrowed - paid)` and is always re-derived
//!   from the full ledger, never adjusted incrementally
//! - Term and allocation statuses are derived on read; only the skip flag is stored
//! - Money and schedule fields freeze once any payment exists
//!
//! [`Connection`]: crate::backend::storage::Connection

pub mod allocation_service;
pub mod allocation_splitter;
pub mod allocation_status;
pub mod balance_service;
pub mod clock;
pub mod commands;
pub mod entry_service;
pub mod entry_validation;
pub mod errors;
pub mod group_service;
pub mod installment_schedule;
pub mod installment_service;
pub mod models;
pub mod money;
pub mod payment_service;
pub mod person_service;

pub use allocation_service::AllocationService;
pub use balance_service::BalanceService;
pub use clock::{Clock, FixedClock, SystemClock};
pub use entry_service::EntryService;
pub use errors::DomainError;
pub use group_service::GroupService;
pub use installment_service::InstallmentService;
pub use payment_service::PaymentService;
pub use person_service::PersonService;
