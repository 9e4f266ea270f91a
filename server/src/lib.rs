//! Loan tracker backend: the entry lifecycle and balance engine, its file
//! store and the REST API in front of them.

pub mod backend;
pub mod config;
