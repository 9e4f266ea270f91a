//! # REST API Interface Layer
//!
//! Provides the HTTP endpoints of the loan tracker. This layer handles:
//! - JSON request/response serialization
//! - Translating domain errors into status codes and `{ "error": ... }` bodies
//! - Request logging
//!
//! Handlers hold no business rules. Each one logs the request, calls a single
//! service method and maps the result through the DTO mappers.

pub mod allocation_apis;
pub mod entry_apis;
pub mod errors;
pub mod group_apis;
pub mod installment_apis;
pub mod mappers;
pub mod payment_apis;
pub mod person_apis;

use axum::Router;

use crate::backend::AppState;

/// Every API route, relative to the `/api` prefix
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(person_apis::router())
        .merge(group_apis::router())
        .merge(entry_apis::router())
        .merge(payment_apis::router())
        .merge(installment_apis::router())
        .merge(allocation_apis::router())
}
