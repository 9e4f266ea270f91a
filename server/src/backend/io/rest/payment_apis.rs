//! # REST API for Payments
//!
//! Payments are recorded against an entry, optionally targeting one of its
//! installment terms or group allocations. They are never edited; a wrong
//! payment is deleted and recorded again. Every change returns the entry as
//! re-derived from the full ledger.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use log::{error, info};

use crate::backend::domain::commands::payments::CreatePaymentCommand;
use crate::backend::io::rest::errors::error_response;
use crate::backend::io::rest::mappers::EntryMapper;
use crate::backend::AppState;
use shared::{CreatePaymentRequest, DeletePaymentResponse, PaymentListResponse, PaymentResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/entries/:id/payments", get(list_payments).post(create_payment))
        .route("/payments/:id", get(get_payment).delete(delete_payment))
}

pub async fn list_payments(State(state): State<AppState>, Path(entry_id): Path<String>) -> impl IntoResponse {
    info!("GET /api/entries/{}/payments", entry_id);

    match state.payment_service.list_payments(&entry_id).await {
        Ok(payments) => (StatusCode::OK, Json(PaymentListResponse { payments })).into_response(),
        Err(e) => {
            error!("Failed to list payments for entry {}: {}", entry_id, e);
            error_response(e)
        }
    }
}

pub async fn create_payment(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
    Json(request): Json<CreatePaymentRequest>,
) -> impl IntoResponse {
    info!("POST /api/entries/{}/payments - request: {:?}", entry_id, request);

    let command = CreatePaymentCommand {
        entry_id,
        amount: request.amount,
        date: request.date,
        payee_id: request.payee_id,
        note: request.note,
        proof_refs: request.proof_refs,
        term_number: request.term_number,
        allocation_id: request.allocation_id,
    };

    match state.payment_service.create_payment(command).await {
        Ok(result) => {
            let response = PaymentResponse {
                success_message: format!(
                    "Payment of {:.2} recorded, {:.2} remaining",
                    result.payment.amount, result.entry.amount_remaining
                ),
                payment: result.payment,
                entry: EntryMapper::to_dto(result.entry),
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to record payment: {}", e);
            error_response(e)
        }
    }
}

pub async fn get_payment(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("GET /api/payments/{}", id);

    match state.payment_service.get_payment(&id).await {
        Ok(payment) => (StatusCode::OK, Json(payment)).into_response(),
        Err(e) => {
            error!("Failed to get payment {}: {}", id, e);
            error_response(e)
        }
    }
}

pub async fn delete_payment(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/payments/{}", id);

    match state.payment_service.delete_payment(&id).await {
        Ok(result) => {
            let success_message = match &result.entry {
                Some(entry) => format!(
                    "Payment of {:.2} deleted, {:.2} remaining",
                    result.payment.amount, entry.amount_remaining
                ),
                None => format!("Payment of {:.2} deleted", result.payment.amount),
            };
            let response = DeletePaymentResponse {
                entry: result.entry.map(EntryMapper::to_dto),
                success_message,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to delete payment {}: {}", id, e);
            error_response(e)
        }
    }
}
