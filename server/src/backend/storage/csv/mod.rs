//! # CSV Storage
//!
//! File-based implementation of the storage traits. Flat records are kept in
//! CSV files, records with nested lists in YAML, all inside one data
//! directory managed by [`CsvConnection`].

pub mod allocation_repository;
pub mod connection;
pub mod entry_repository;
pub mod group_repository;
pub mod payment_repository;
pub mod person_repository;
pub mod term_repository;

#[cfg(test)]
pub mod test_utils;

pub use allocation_repository::AllocationRepository;
pub use connection::CsvConnection;
pub use entry_repository::EntryRepository;
pub use group_repository::GroupRepository;
pub use payment_repository::PaymentRepository;
pub use person_repository::PersonRepository;
pub use term_repository::TermRepository;
