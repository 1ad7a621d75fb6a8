//! # Paygate Hex
//!
//! Application service layer and HTTP adapter for the payment gateway.
//!
//! ## Architecture
//!
//! - `service.rs` - Application service (accounts, statements, lookups)
//! - `lifecycle.rs` - Payment lifecycle engine (authorize, capture, refund, cancel)
//! - `cards.rs` - Card issuing for new accounts
//! - `openapi.rs` - OpenAPI document
//! - `inbound/` - HTTP adapter (Axum server, handlers, merchant extractor)
//!
//! The service is generic over `R: PaymentRepository`, allowing
//! different repository implementations to be injected.

pub mod cards;
pub mod inbound;
pub mod lifecycle;
pub mod openapi;
pub mod service;

#[cfg(test)]
mod lifecycle_tests;

pub use service::PaymentService;
