//! Translation of service errors into HTTP responses.
//!
//! Services return `anyhow::Error`. The handlers look for a [`DomainError`]
//! anywhere in the error chain to choose the status code; anything else is
//! an internal failure.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use shared::ErrorResponse;

use crate::backend::domain::DomainError;

pub fn status_for(error: &anyhow::Error) -> StatusCode {
    match error.chain().find_map(|cause| cause.downcast_ref::<DomainError>()) {
        Some(DomainError::NotFound { .. }) => StatusCode::NOT_FOUND,
        Some(DomainError::Validation(_)) => StatusCode::BAD_REQUEST,
        Some(DomainError::FieldLocked(_)) | Some(DomainError::TransactionTypeImmutable) => StatusCode::CONFLICT,
        None => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Build the `{ "error": message }` response for a failed service call
pub fn error_response(error: anyhow::Error) -> Response {
    let status = status_for(&error);
    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        "Internal server error".to_string()
    } else {
        error.to_string()
    };
    (status, Json(ErrorResponse { error: message })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_domain_errors_pick_status() {
        assert_eq!(
            status_for(&DomainError::not_found("Entry", "entry::1").into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&DomainError::validation("Amount must be positive").into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&DomainError::FieldLocked("amount_borrowed").into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&DomainError::TransactionTypeImmutable.into()),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_context_does_not_hide_domain_error() {
        let error = Err::<(), _>(DomainError::not_found("Payment", "payment::1"))
            .context("Failed to delete payment")
            .unwrap_err();
        assert_eq!(status_for(&error), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_other_errors_are_internal() {
        let error = anyhow::anyhow!("disk full");
        assert_eq!(status_for(&error), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
