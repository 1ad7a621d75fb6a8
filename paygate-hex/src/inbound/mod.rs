//! HTTP Inbound Adapter
//!
//! Axum-based HTTP server that drives the application layer.

pub mod handlers;
mod merchant;
mod server;

pub use merchant::{MERCHANT_HEADER, Merchant};
pub use server::HttpServer;
