//! # IO Module
//!
//! The adapter layer between HTTP clients and the domain services.
//!
//! Requests arrive as shared DTOs, are handed to one domain service, and the
//! domain results are mapped back to DTOs. Domain errors become status codes:
//!
//! - **NotFound** → 404
//! - **Validation** → 400
//! - **FieldLocked / TransactionTypeImmutable** → 409
//! - anything else → 500
//!
//! ## Current Implementation
//!
//! - **Web Framework**: Axum, with services injected through `State<AppState>`
//! - **Serialization**: Serde JSON using the `shared` crate types

pub mod rest;

pub use rest::api_router;
