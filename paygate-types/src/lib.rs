//! # Paygate Types
//!
//! Domain types and port traits for the card payment gateway.
//! This crate has no IO dependencies: only data structures,
//! business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate is the innermost core of the hexagonal architecture:
//! - `domain/` - Pure domain types (Money, Account, Payment, PaymentHold)
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Data Transfer Objects for API boundaries
//! - `error/` - Domain and application error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    Account, AccountId, AccountUpdate, Card, CardSnapshot, Currency, Disposition, HoldChange,
    HoldKind, HoldState, LedgerCommit, Money, Operation, Payment, PaymentHold, PaymentId,
    PaymentStatus,
};
pub use dto::*;
pub use error::{AppError, DomainError, RepoError};
pub use ports::{AccountLedger, PaymentRepository, PaymentStore};
