//! # REST API for Groups
//!
//! A group is a named set of people that can borrow together on a GROUP entry.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use log::{error, info};

use crate::backend::io::rest::errors::error_response;
use crate::backend::AppState;
use shared::{CreateGroupRequest, DeleteResponse, GroupListResponse, UpdateGroupRequest};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/groups", get(list_groups).post(create_group))
        .route("/groups/:id", get(get_group).put(update_group).delete(delete_group))
}

pub async fn list_groups(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/groups");

    match state.group_service.list_groups().await {
        Ok(groups) => (StatusCode::OK, Json(GroupListResponse { groups })).into_response(),
        Err(e) => {
            error!("Failed to list groups: {}", e);
            error_response(e)
        }
    }
}

pub async fn create_group(
    State(state): State<AppState>,
    Json(request): Json<CreateGroupRequest>,
) -> impl IntoResponse {
    info!("POST /api/groups - request: {:?}", request);

    match state.group_service.create_group(request).await {
        Ok(group) => (StatusCode::CREATED, Json(group)).into_response(),
        Err(e) => {
            error!("Failed to create group: {}", e);
            error_response(e)
        }
    }
}

pub async fn get_group(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("GET /api/groups/{}", id);

    match state.group_service.get_group(&id).await {
        Ok(group) => (StatusCode::OK, Json(group)).into_response(),
        Err(e) => {
            error!("Failed to get group {}: {}", id, e);
            error_response(e)
        }
    }
}

pub async fn update_group(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateGroupRequest>,
) -> impl IntoResponse {
    info!("PUT /api/groups/{} - request: {:?}", id, request);

    match state.group_service.update_group(&id, request).await {
        Ok(group) => (StatusCode::OK, Json(group)).into_response(),
        Err(e) => {
            error!("Failed to update group {}: {}", id, e);
            error_response(e)
        }
    }
}

pub async fn delete_group(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/groups/{}", id);

    match state.group_service.delete_group(&id).await {
        Ok(()) => {
            let response = DeleteResponse {
                success_message: "Group deleted".to_string(),
                deleted_id: id,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to delete group {}: {}", id, e);
            error_response(e)
        }
    }
}
