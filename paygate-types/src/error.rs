//! Error types for the payment gateway.

use crate::domain::{AccountId, Currency, HoldState, Operation, PaymentId};

/// Domain-level errors (business logic violations).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Amount cannot be negative")]
    NegativeAmount,

    #[error("Currency mismatch: expected {expected}, got {got}")]
    CurrencyMismatch { expected: Currency, got: Currency },

    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds { available: i64, requested: i64 },

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Payment not found: {0}")]
    PaymentNotFound(PaymentId),

    #[error("{operation} is not allowed on a {state} hold")]
    InvalidTransition {
        state: HoldState,
        operation: Operation,
    },

    #[error("Amount exceeds remaining: remaining {remaining}, requested {requested}")]
    AmountExceedsRemaining { remaining: i64, requested: i64 },

    #[error("Account still carries funds: {0}")]
    AccountNotEmpty(AccountId),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Repository-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::AccountNotFound(_) | DomainError::PaymentNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            DomainError::ValidationError(msg) => AppError::BadRequest(msg),
            DomainError::NegativeAmount
            | DomainError::CurrencyMismatch { .. }
            | DomainError::AccountNotEmpty(_) => AppError::BadRequest(err.to_string()),
            // The engine checks these before mutating; reaching them means a broken ledger.
            DomainError::InsufficientFunds { .. }
            | DomainError::InvalidTransition { .. }
            | DomainError::AmountExceedsRemaining { .. } => AppError::Internal(err.to_string()),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(e) => e.into(),
            RepoError::NotFound => AppError::NotFound("Resource not found".into()),
            RepoError::Database(e) => AppError::Internal(e),
            RepoError::Transaction(e) => AppError::TransactionFailed(e),
            RepoError::Conflict(e) => AppError::TransactionFailed(e),
        }
    }
}
