//! # REST API for People
//!
//! Endpoints for the people an entry can name as lender, borrower or payee.

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
use shared::{CreatePersonRequest, DeleteResponse, PersonListResponse, UpdatePersonRequest};

/// Create a router for person related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/people", get(list_people).post(create_person))
        .route("/people/:id", get(get_person).put(update_person).delete(delete_person))
}

pub async fn list_people(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/people");

    match state.person_service.list_people().await {
        Ok(people) => (StatusCode::OK, Json(PersonListResponse { people })).into_response(),
        Err(e) => {
            error!("Failed to list people: {}", e);
            error_response(e)
        }
    }
}

pub async fn create_person(
    State(state): State<AppState>,
    Json(request): Json<CreatePersonRequest>,
) -> impl IntoResponse {
    info!("POST /api/people - request: {:?}", request);

    match state.person_service.create_person(request).await {
        Ok(person) => (StatusCode::CREATED, Json(person)).into_response(),
        Err(e) => {
            error!("Failed to create person: {}", e);
            error_response(e)
        }
    }
}

pub async fn get_person(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("GET /api/people/{}", id);

    match state.person_service.get_person(&id).await {
        Ok(person) => (StatusCode::OK, Json(person)).into_response(),
        Err(e) => {
            error!("Failed to get person {}: {}", id, e);
            error_response(e)
        }
    }
}

pub async fn update_person(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdatePersonRequest>,
) -> impl IntoResponse {
    info!("PUT /api/people/{} - request: {:?}", id, request);

    match state.person_service.update_person(&id, request).await {
        Ok(person) => (StatusCode::OK, Json(person)).into_response(),
        Err(e) => {
            error!("Failed to update person {}: {}", id, e);
            error_response(e)
        }
    }
}

pub async fn delete_person(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/people/{}", id);

    match state.person_service.delete_person(&id).await {
        Ok(()) => {
            let response = DeleteResponse {
                success_message: "Person deleted".to_string(),
                deleted_id: id,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to delete person {}: {}", id, e);
            error_response(e)
        }
    }
}
