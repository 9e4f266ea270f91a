//! # REST API for Installment Terms
//!
//! Terms carry a status and the actions a client may offer, both derived
//! for today on every request.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use log::{error, info};

use crate::backend::io::rest::errors::error_response;
use crate::backend::io::rest::mappers::TermMapper;
use crate::backend::AppState;
use shared::{SkipTermResponse, TermListResponse, UpdateTermNotesRequest};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/entries/:id/terms", get(list_terms))
        .route("/entries/:id/terms/:number/skip", post(skip_term))
        .route("/entries/:id/terms/:number/notes", put(update_term_notes))
}

pub async fn list_terms(State(state): State<AppState>, Path(entry_id): Path<String>) -> impl IntoResponse {
    info!("GET /api/entries/{}/terms", entry_id);

    match state.installment_service.list_terms(&entry_id).await {
        Ok(views) => {
            let response = TermListResponse {
                terms: TermMapper::to_dto_list(views),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to list terms for entry {}: {}", entry_id, e);
            error_response(e)
        }
    }
}

pub async fn skip_term(
    State(state): State<AppState>,
    Path((entry_id, term_number)): Path<(String, u32)>,
) -> impl IntoResponse {
    info!("POST /api/entries/{}/terms/{}/skip", entry_id, term_number);

    match state.installment_service.skip_term(&entry_id, term_number).await {
        Ok(result) => {
            let response = SkipTermResponse {
                success_message: format!(
                    "Term {} skipped, term {} added for {}",
                    term_number, result.appended.term.term_number, result.appended.term.due_date
                ),
                skipped_term: TermMapper::to_dto(result.skipped),
                appended_term: TermMapper::to_dto(result.appended),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to skip term {} of entry {}: {}", term_number, entry_id, e);
            error_response(e)
        }
    }
}

pub async fn update_term_notes(
    State(state): State<AppState>,
    Path((entry_id, term_number)): Path<(String, u32)>,
    Json(request): Json<UpdateTermNotesRequest>,
) -> impl IntoResponse {
    info!("PUT /api/entries/{}/terms/{}/notes", entry_id, term_number);

    match state
        .installment_service
        .update_term_notes(&entry_id, term_number, &request.notes)
        .await
    {
        Ok(view) => (StatusCode::OK, Json(TermMapper::to_dto(view))).into_response(),
        Err(e) => {
            error!("Failed to update notes of term {} on entry {}: {}", term_number, entry_id, e);
            error_response(e)
        }
    }
}
