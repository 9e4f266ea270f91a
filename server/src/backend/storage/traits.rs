//! # Storage Traits
//!
//! This module defines the storage abstraction traits that allow the domain
//! layer to work against a data source without knowing how records are kept.
//! Exactly one implementation is selected at startup and injected through a
//! [`Connection`].

use anyhow::Result;
use async_trait::async_trait;
use shared::{Group, Payment, Person};

use crate::backend::domain::models::{DomainAllocation, DomainEntry, DomainTerm};

/// Trait defining the interface for person storage operations
#[async_trait]
pub trait PersonStorage: Send + Sync {
    /// Store a new person
    async fn store_person(&self, person: &Person) -> Result<()>;

    /// Retrieve a specific person by ID
    async fn get_person(&self, person_id: &str) -> Result<Option<Person>>;

    /// List all people ordered by name
    async fn list_people(&self) -> Result<Vec<Person>>;

    /// Update an existing person
    async fn update_person(&self, person: &Person) -> Result<()>;

    /// Delete a person
    /// Returns true if the person was found and deleted, false otherwise
    async fn delete_person(&self, person_id: &str) -> Result<bool>;
}

/// Trait defining the interface for group storage operations
#[async_trait]
pub trait GroupStorage: Send + Sync {
    async fn store_group(&self, group: &Group) -> Result<()>;

    async fn get_group(&self, group_id: &str) -> Result<Option<Group>>;

    /// List all groups ordered by name
    async fn list_groups(&self) -> Result<Vec<Group>>;

    async fn update_group(&self, group: &Group) -> Result<()>;

    async fn delete_group(&self, group_id: &str) -> Result<bool>;
}

/// Trait defining the interface for entry header storage operations
#[async_trait]
pub trait EntryStorage: Send + Sync {
    async fn store_entry(&self, entry: &DomainEntry) -> Result<()>;

    async fn get_entry(&self, entry_id: &str) -> Result<Option<DomainEntry>>;

    /// List every entry, most recently created first
    async fn list_entries(&self) -> Result<Vec<DomainEntry>>;

    async fn update_entry(&self, entry: &DomainEntry) -> Result<()>;

    async fn delete_entry(&self, entry_id: &str) -> Result<bool>;
}

/// Trait defining the interface for the payment ledger
///
/// Payments are never updated in place; a correction is a delete followed
/// by a new payment.
#[async_trait]
pub trait PaymentStorage: Send + Sync {
    async fn store_payment(&self, payment: &Payment) -> Result<()>;

    async fn get_payment(&self, payment_id: &str) -> Result<Option<Payment>>;

    /// All payments attributed to an entry, including those made against
    /// its terms or allocations, in date order
    async fn list_payments_for_entry(&self, entry_id: &str) -> Result<Vec<Payment>>;

    async fn delete_payment(&self, payment_id: &str) -> Result<bool>;

    /// Returns the number of payments actually deleted
    async fn delete_payments_for_entry(&self, entry_id: &str) -> Result<u32>;
}

/// Trait defining the interface for installment term storage operations
#[async_trait]
pub trait TermStorage: Send + Sync {
    async fn store_terms(&self, terms: &[DomainTerm]) -> Result<()>;

    /// Terms of an entry ordered by term number
    async fn list_terms_for_entry(&self, entry_id: &str) -> Result<Vec<DomainTerm>>;

    async fn update_term(&self, term: &DomainTerm) -> Result<()>;

    async fn delete_terms_for_entry(&self, entry_id: &str) -> Result<u32>;
}

/// Trait defining the interface for group allocation storage operations
#[async_trait]
pub trait AllocationStorage: Send + Sync {
    async fn store_allocations(&self, allocations: &[DomainAllocation]) -> Result<()>;

    async fn get_allocation(&self, allocation_id: &str) -> Result<Option<DomainAllocation>>;

    async fn list_allocations_for_entry(&self, entry_id: &str) -> Result<Vec<DomainAllocation>>;

    async fn update_allocation(&self, allocation: &DomainAllocation) -> Result<()>;

    async fn delete_allocations_for_entry(&self, entry_id: &str) -> Result<u32>;
}

/// Trait defining the interface for storage connections
///
/// This trait abstracts away the specific connection type and provides
/// factory methods for creating repositories. The domain services are
/// generic over it, so the data source is chosen once at composition time.
pub trait Connection: Send + Sync + Clone + 'static {
    type PersonRepository: PersonStorage + Clone;
    type GroupRepository: GroupStorage + Clone;
    type EntryRepository: EntryStorage + Clone;
    type PaymentRepository: PaymentStorage + Clone;
    type TermRepository: TermStorage + Clone;
    type AllocationRepository: AllocationStorage + Clone;

    fn create_person_repository(&self) -> Self::PersonRepository;
    fn create_group_repository(&self) -> Self::GroupRepository;
    fn create_entry_repository(&self) -> Self::EntryRepository;
    fn create_payment_repository(&self) -> Self::PaymentRepository;
    fn create_term_repository(&self) -> Self::TermRepository;
    fn create_allocation_repository(&self) -> Self::AllocationRepository;
}
