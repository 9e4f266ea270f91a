//! Error types shared by the domain services.
//!
//! Services return `anyhow::Result`; these variants are the ones the IO layer
//! recognizes (via downcasting) and turns into specific HTTP status codes.
//! Anything else is treated as an internal failure.

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("{0}")]
    Validation(String),
    #[error("{0} cannot be changed once a payment has been recorded")]
    FieldLocked(&'static str),
    #[error("Transaction type cannot be changed after creation")]
    TransactionTypeImmutable,
}

impl DomainError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        DomainError::NotFound { kind, id: id.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }

    /// Join a list of validation failures into a single error
    pub fn from_validation_errors<E: std::fmt::Display>(errors: &[E]) -> Self {
        let message = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        DomainError::Validation(message)
    }
}
