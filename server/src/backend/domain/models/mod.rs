//! Domain models for the loan tracker.

pub mod allocation;
pub mod entry;
pub mod term;

pub use allocation::DomainAllocation;
pub use entry::DomainEntry;
pub use term::DomainTerm;
