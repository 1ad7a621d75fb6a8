//! Data Transfer Objects (DTOs) for requests and responses.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    Account, AccountId, Card, Currency, Disposition, Operation, Payment, PaymentId, PaymentStatus,
};

// ─────────────────────────────────────────────────────────────────────────────
// Account DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to create a new account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateAccountRequest {
    #[schema(example = "Ivan")]
    pub first_name: String,
    #[schema(example = "Petrov")]
    pub last_name: String,
    #[serde(default = "default_currency")]
    pub currency: Currency,
}

fn default_currency() -> Currency {
    Currency::RUB
}

/// Request to rename an account holder. Empty fields keep the current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateAccountRequest {
    #[serde(default)]
    #[schema(example = "Ivan")]
    pub first_name: String,
    #[serde(default)]
    #[schema(example = "")]
    pub last_name: String,
}

/// Account as returned over the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountResponse {
    /// Unique account identifier
    pub id: AccountId,
    #[schema(example = "Ivan")]
    pub first_name: String,
    #[schema(example = "Petrov")]
    pub last_name: String,
    pub currency: Currency,
    /// Spendable funds in smallest currency unit
    #[schema(example = 10000)]
    pub balance: i64,
    /// Funds earmarked by open authorizations
    #[schema(example = 0)]
    pub held: i64,
    pub card: Card,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            currency: account.currency(),
            balance: account.balance.amount(),
            held: account.held.amount(),
            first_name: account.first_name,
            last_name: account.last_name,
            card: account.card,
        }
    }
}

/// Request to deposit money into an account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DepositRequest {
    /// Target account ID
    pub account_id: AccountId,
    /// Amount to deposit in the account's smallest currency unit
    #[schema(example = 1000)]
    pub amount: i64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Payment DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to authorize a card payment to the calling merchant.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthorizeRequest {
    /// Account that owns the card
    pub payer_id: AccountId,
    #[schema(example = "order-1001")]
    pub order_id: String,
    /// Amount in smallest currency unit
    #[schema(example = 5000)]
    pub amount: i64,
    #[serde(default = "default_currency")]
    pub currency: Currency,
    /// Card credentials presented by the payer
    pub card: Card,
}

/// Request to capture, refund or cancel part of an earlier payment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentActionRequest {
    #[schema(example = "order-1001")]
    pub order_id: String,
    /// Amount in the referenced payment's currency
    #[schema(example = 5000)]
    pub amount: i64,
}

/// Outcome of a lifecycle call.
///
/// Returned with 200 when accepted and 402 when declined.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    pub id: PaymentId,
    pub operation: Operation,
    pub status: PaymentStatus,
    pub disposition: Disposition,
}

impl From<&Payment> for PaymentResponse {
    fn from(payment: &Payment) -> Self {
        Self {
            id: payment.id,
            operation: payment.operation,
            status: payment.status,
            disposition: payment.disposition(),
        }
    }
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self::from(&payment)
    }
}
