//! OpenAPI specification and documentation.

#![allow(dead_code)] // Path functions are only used by utoipa for documentation generation

use paygate_types::{
    AccountId, AccountResponse, AuthorizeRequest, Card, CardSnapshot, CreateAccountRequest,
    Currency, DepositRequest, Disposition, Money, Operation, Payment, PaymentActionRequest,
    PaymentId, PaymentResponse, PaymentStatus, UpdateAccountRequest,
};
use utoipa::OpenApi;

// Dummy functions to generate path documentation
// These are not the actual handlers, just for OpenAPI path generation

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = inline(serde_json::Value), example = json!({"status": "healthy"}))
    )
)]
async fn health() {}

/// Create a new account with a freshly issued card
#[utoipa::path(
    post,
    path = "/api/accounts",
    tag = "accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created successfully", body = AccountResponse),
        (status = 400, description = "Invalid request")
    )
)]
async fn create_account() {}

/// List all accounts
#[utoipa::path(
    get,
    path = "/api/accounts",
    tag = "accounts",
    responses(
        (status = 200, description = "List of accounts", body = Vec<AccountResponse>)
    )
)]
async fn list_accounts() {}

/// Get account by ID
#[utoipa::path(
    get,
    path = "/api/accounts/{id}",
    tag = "accounts",
    params(
        ("id" = AccountId, Path, description = "Account ID (UUID)")
    ),
    responses(
        (status = 200, description = "Account details", body = AccountResponse),
        (status = 404, description = "Account not found")
    )
)]
async fn get_account() {}

/// Rename an account holder
#[utoipa::path(
    put,
    path = "/api/accounts/{id}",
    tag = "accounts",
    request_body = UpdateAccountRequest,
    params(
        ("id" = AccountId, Path, description = "Account ID (UUID)")
    ),
    responses(
        (status = 200, description = "Account updated", body = AccountResponse),
        (status = 404, description = "Account not found")
    )
)]
async fn update_account() {}

/// Delete an account without funds
#[utoipa::path(
    delete,
    path = "/api/accounts/{id}",
    tag = "accounts",
    params(
        ("id" = AccountId, Path, description = "Account ID (UUID)")
    ),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 400, description = "Account still carries funds"),
        (status = 404, description = "Account not found")
    )
)]
async fn delete_account() {}

/// Payments on an account's statement, oldest first
#[utoipa::path(
    get,
    path = "/api/accounts/{id}/statement",
    tag = "accounts",
    params(
        ("id" = AccountId, Path, description = "Account ID (UUID)")
    ),
    responses(
        (status = 200, description = "Statement payments", body = Vec<Payment>),
        (status = 404, description = "Account not found")
    )
)]
async fn statement() {}

/// Deposit money into an account
#[utoipa::path(
    post,
    path = "/api/accounts/deposit",
    tag = "accounts",
    request_body = DepositRequest,
    responses(
        (status = 200, description = "Deposit successful", body = AccountResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Account not found")
    )
)]
async fn deposit() {}

/// Authorize a card payment to the calling merchant
#[utoipa::path(
    post,
    path = "/api/payments/auth",
    tag = "payments",
    request_body = AuthorizeRequest,
    params(
        ("X-Merchant-Id" = AccountId, Header, description = "Payee account ID")
    ),
    responses(
        (status = 200, description = "Approved", body = PaymentResponse),
        (status = 402, description = "Declined", body = PaymentResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Account not found"),
        (status = 503, description = "Transaction failed, safe to retry")
    )
)]
async fn authorize() {}

/// Capture an approved authorization
#[utoipa::path(
    post,
    path = "/api/payments/capture/{id}",
    tag = "payments",
    request_body = PaymentActionRequest,
    params(
        ("id" = PaymentId, Path, description = "Authorization payment ID"),
        ("X-Merchant-Id" = AccountId, Header, description = "Payee account ID")
    ),
    responses(
        (status = 200, description = "Successful payment", body = PaymentResponse),
        (status = 402, description = "Declined", body = PaymentResponse),
        (status = 404, description = "Payment not found"),
        (status = 503, description = "Transaction failed, safe to retry")
    )
)]
async fn capture() {}

/// Refund a successful capture
#[utoipa::path(
    post,
    path = "/api/payments/refund/{id}",
    tag = "payments",
    request_body = PaymentActionRequest,
    params(
        ("id" = PaymentId, Path, description = "Capture payment ID"),
        ("X-Merchant-Id" = AccountId, Header, description = "Payee account ID")
    ),
    responses(
        (status = 200, description = "Successful refund", body = PaymentResponse),
        (status = 402, description = "Declined", body = PaymentResponse),
        (status = 404, description = "Payment not found"),
        (status = 503, description = "Transaction failed, safe to retry")
    )
)]
async fn refund() {}

/// Cancel an uncaptured authorization
#[utoipa::path(
    post,
    path = "/api/payments/cancel/{id}",
    tag = "payments",
    request_body = PaymentActionRequest,
    params(
        ("id" = PaymentId, Path, description = "Authorization payment ID"),
        ("X-Merchant-Id" = AccountId, Header, description = "Payee account ID")
    ),
    responses(
        (status = 200, description = "Successful cancel", body = PaymentResponse),
        (status = 402, description = "Declined", body = PaymentResponse),
        (status = 404, description = "Payment not found"),
        (status = 503, description = "Transaction failed, safe to retry")
    )
)]
async fn cancel() {}

/// Get payment by ID
#[utoipa::path(
    get,
    path = "/api/payments/{id}",
    tag = "payments",
    params(
        ("id" = PaymentId, Path, description = "Payment ID (UUID)")
    ),
    responses(
        (status = 200, description = "Payment details", body = Payment),
        (status = 404, description = "Payment not found")
    )
)]
async fn get_payment() {}

/// OpenAPI documentation for the payment gateway.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Paygate API",
        version = "1.0.0",
        description = "Card payment authorization and settlement.\n\n## Merchants\n\nPayment endpoints act on behalf of the payee account named in the `X-Merchant-Id` header. Declined payments are answered with `402 Payment Required` and the recorded status.",
        license(name = "MIT"),
    ),
    paths(
        health,
        create_account,
        list_accounts,
        get_account,
        update_account,
        delete_account,
        statement,
        deposit,
        authorize,
        capture,
        refund,
        cancel,
        get_payment,
    ),
    components(
        schemas(
            CreateAccountRequest,
            UpdateAccountRequest,
            AccountResponse,
            DepositRequest,
            AuthorizeRequest,
            PaymentActionRequest,
            PaymentResponse,
            Payment,
            PaymentStatus,
            Operation,
            Disposition,
            Card,
            CardSnapshot,
            Money,
            Currency,
            AccountId,
            PaymentId,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "accounts", description = "Account administration and deposits"),
        (name = "payments", description = "Authorize, capture, refund and cancel"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_payment_routes() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        assert!(paths.contains_key("/api/payments/auth"));
        assert!(paths.contains_key("/api/payments/capture/{id}"));
        assert!(paths.contains_key("/api/accounts/{id}/statement"));
    }
}
