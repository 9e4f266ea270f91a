//! # Storage Module
//!
//! Handles all data persistence operations for the loan tracker.
//!
//! The domain layer only sees the traits in [`traits`]; the concrete data
//! source is picked once when the backend is initialized and injected into
//! every service. There is no runtime fallback between implementations.
//!
//! ## Current Implementation
//!
//! - **CSV/YAML files**: one data directory, one file per record type
//! - **Atomic writes**: temp file + rename for every change
//! - **In-process locking**: read-modify-write cycles are serialized; writes
//!   from other processes are not coordinated (last write wins)

pub mod csv;
pub mod traits;

pub use csv::CsvConnection;
pub use traits::*;
