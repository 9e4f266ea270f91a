//! Conversions from domain models and derived views to the shared DTOs.

pub mod allocation_mapper;
pub mod entry_mapper;
pub mod term_mapper;

pub use allocation_mapper::AllocationMapper;
pub use entry_mapper::EntryMapper;
pub use term_mapper::TermMapper;
