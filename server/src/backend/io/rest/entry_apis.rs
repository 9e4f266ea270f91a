//! # REST API for Entries
//!
//! Create, inspect, edit and delete loan/expense entries. The detail endpoint
//! returns the entry together with its ledger and the term or allocation
//! views derived for today.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use log::{error, info};

use crate::backend::domain::commands::entries::EntryListQuery;
use crate::backend::io::rest::errors::error_response;
use crate::backend::io::rest::mappers::{AllocationMapper, EntryMapper, TermMapper};
use crate::backend::AppState;
use shared::{
    CreateEntryRequest, CreateEntryResponse, DeleteResponse, EntryDetailResponse, EntryListRequest,
    EntryListResponse, UpdateEntryRequest, ValidateEntryResponse,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/entries", get(list_entries).post(create_entry))
        .route("/entries/validate", post(validate_entry))
        .route("/entries/:id", get(get_entry_detail).put(update_entry).delete(delete_entry))
}

pub async fn list_entries(
    State(state): State<AppState>,
    Query(query): Query<EntryListRequest>,
) -> impl IntoResponse {
    info!("GET /api/entries - query: {:?}", query);

    let query = EntryListQuery {
        status: query.status,
        transaction_type: query.transaction_type,
    };

    match state.entry_service.list_entries(query).await {
        Ok(entries) => {
            let response = EntryListResponse {
                entries: EntryMapper::to_dto_list(entries),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to list entries: {}", e);
            error_response(e)
        }
    }
}

pub async fn create_entry(
    State(state): State<AppState>,
    Json(request): Json<CreateEntryRequest>,
) -> impl IntoResponse {
    info!("POST /api/entries - request: {:?}", request);

    match state.entry_service.create_entry(request).await {
        Ok(result) => {
            let success_message = match (result.terms.len(), result.allocations.len()) {
                (0, 0) => format!("Entry '{}' created", result.entry.name),
                (terms, 0) => format!("Entry '{}' created with {} terms", result.entry.name, terms),
                (_, members) => format!("Entry '{}' split across {} members", result.entry.name, members),
            };
            let response = CreateEntryResponse {
                entry: EntryMapper::to_dto(result.entry),
                warnings: result.warnings,
                success_message,
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to create entry: {}", e);
            error_response(e)
        }
    }
}

/// Check an entry draft without storing it
pub async fn validate_entry(
    State(state): State<AppState>,
    Json(request): Json<CreateEntryRequest>,
) -> impl IntoResponse {
    info!("POST /api/entries/validate - request: {:?}", request);

    match state.entry_service.validate_entry(&request).await {
        Ok(result) => {
            let response = ValidateEntryResponse {
                is_valid: result.errors.is_empty(),
                errors: result.errors,
                warnings: result.warnings,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to validate entry: {}", e);
            error_response(e)
        }
    }
}

pub async fn get_entry_detail(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("GET /api/entries/{}", id);

    match state.entry_service.get_entry_detail(&id).await {
        Ok(detail) => {
            let response = EntryDetailResponse {
                entry: EntryMapper::to_dto(detail.entry),
                payments: detail.payments,
                terms: TermMapper::to_dto_list(detail.terms),
                allocations: AllocationMapper::to_dto_list(detail.allocations),
                is_locked: detail.is_locked,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to get entry {}: {}", id, e);
            error_response(e)
        }
    }
}

pub async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateEntryRequest>,
) -> impl IntoResponse {
    info!("PUT /api/entries/{} - request: {:?}", id, request);

    match state.entry_service.update_entry(&id, request).await {
        Ok(entry) => (StatusCode::OK, Json(EntryMapper::to_dto(entry))).into_response(),
        Err(e) => {
            error!("Failed to update entry {}: {}", id, e);
            error_response(e)
        }
    }
}

pub async fn delete_entry(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/entries/{}", id);

    match state.entry_service.delete_entry(&id).await {
        Ok(result) => {
            let response = DeleteResponse {
                success_message: format!(
                    "Entry deleted with {} payments, {} terms and {} allocations",
                    result.deleted_payments, result.deleted_terms, result.deleted_allocations
                ),
                deleted_id: id,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to delete entry {}: {}", id, e);
            error_response(e)
        }
    }
}
