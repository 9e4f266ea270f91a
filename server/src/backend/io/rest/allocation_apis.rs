//! # REST API for Group Allocations
//!
//! Each member's share of a GROUP entry, the split preview used while an
//! entry is being drafted, and regeneration of the share descriptions.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use log::{error, info};

use crate::backend::domain::commands::allocations::AllocationPreviewCommand;
use crate::backend::io::rest::errors::error_response;
use crate::backend::io::rest::mappers::AllocationMapper;
use crate::backend::AppState;
use shared::{AllocationListResponse, AllocationPreviewRequest, AllocationPreviewResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/entries/:id/allocations", get(list_allocations))
        .route("/entries/:id/allocations/recompute-notes", post(recompute_notes))
        .route("/allocations/preview", post(preview_allocation))
}

pub async fn list_allocations(State(state): State<AppState>, Path(entry_id): Path<String>) -> impl IntoResponse {
    info!("GET /api/entries/{}/allocations", entry_id);

    match state.allocation_service.list_allocations(&entry_id).await {
        Ok(views) => {
            let response = AllocationListResponse {
                allocations: AllocationMapper::to_dto_list(views),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to list allocations for entry {}: {}", entry_id, e);
            error_response(e)
        }
    }
}

pub async fn recompute_notes(State(state): State<AppState>, Path(entry_id): Path<String>) -> impl IntoResponse {
    info!("POST /api/entries/{}/allocations/recompute-notes", entry_id);

    match state.allocation_service.recompute_notes(&entry_id).await {
        Ok(views) => {
            let response = AllocationListResponse {
                allocations: AllocationMapper::to_dto_list(views),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to recompute allocation notes for entry {}: {}", entry_id, e);
            error_response(e)
        }
    }
}

/// Run the splitter for a draft; nothing is stored
pub async fn preview_allocation(
    State(state): State<AppState>,
    Json(request): Json<AllocationPreviewRequest>,
) -> impl IntoResponse {
    info!("POST /api/allocations/preview - request: {:?}", request);

    let command = AllocationPreviewCommand {
        total: request.total,
        split_mode: request.split_mode,
        member_ids: request.member_ids,
        shares: request.shares,
    };

    match state.allocation_service.preview(command) {
        Ok(result) => {
            let response = AllocationPreviewResponse {
                shares: AllocationMapper::to_share_list(&result.rows),
                allocated_total: result.allocated_total,
                warnings: result.warnings,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to preview allocation: {}", e);
            error_response(e)
        }
    }
}
