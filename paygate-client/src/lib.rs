//! # Paygate Client SDK
//!
//! A typed Rust client for the Paygate API.

use paygate_types::{
    AccountId, AccountResponse, AuthorizeRequest, Card, CreateAccountRequest, Currency,
    DepositRequest, Payment, PaymentActionRequest, PaymentId, PaymentResponse,
    UpdateAccountRequest,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

/// Header naming the payee account on payment calls.
const MERCHANT_HEADER: &str = "X-Merchant-Id";

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No merchant account configured for payment calls")]
    MissingMerchant,
}

/// Paygate API client.
pub struct PaygateClient {
    base_url: String,
    merchant: Option<AccountId>,
    http: Client,
}

impl PaygateClient {
    /// Creates a new client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            merchant: None,
            http: Client::new(),
        }
    }

    /// Sets the payee account used for payment calls.
    pub fn with_merchant(mut self, merchant: AccountId) -> Self {
        self.merchant = Some(merchant);
        self
    }

    /// Checks if the API is healthy.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let resp = self.http.get(self.url("/health")).send().await?;
        Ok(resp.status().is_success())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accounts
    // ─────────────────────────────────────────────────────────────────────────

    /// Creates a new account; the server issues its card.
    pub async fn create_account(
        &self,
        first_name: &str,
        last_name: &str,
        currency: Currency,
    ) -> Result<AccountResponse, ClientError> {
        let req = CreateAccountRequest {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            currency,
        };
        self.send(self.http.post(self.url("/api/accounts")).json(&req))
            .await
    }

    /// Gets an account by ID.
    pub async fn get_account(&self, id: AccountId) -> Result<AccountResponse, ClientError> {
        self.send(self.http.get(self.url(&format!("/api/accounts/{}", id))))
            .await
    }

    /// Lists all accounts.
    pub async fn list_accounts(&self) -> Result<Vec<AccountResponse>, ClientError> {
        self.send(self.http.get(self.url("/api/accounts"))).await
    }

    /// Renames an account holder. Empty names are left unchanged.
    pub async fn update_account(
        &self,
        id: AccountId,
        req: &UpdateAccountRequest,
    ) -> Result<AccountResponse, ClientError> {
        self.send(
            self.http
                .put(self.url(&format!("/api/accounts/{}", id)))
                .json(req),
        )
        .await
    }

    /// Deletes an account without funds.
    pub async fn delete_account(&self, id: AccountId) -> Result<(), ClientError> {
        let resp = self
            .http
            .delete(self.url(&format!("/api/accounts/{}", id)))
            .send()
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(api_error(resp).await)
        }
    }

    /// Deposits money into an account.
    pub async fn deposit(
        &self,
        account_id: AccountId,
        amount: i64,
    ) -> Result<AccountResponse, ClientError> {
        let req = DepositRequest { account_id, amount };
        self.send(self.http.post(self.url("/api/accounts/deposit")).json(&req))
            .await
    }

    /// Payments on an account's statement, oldest first.
    pub async fn statement(&self, account_id: AccountId) -> Result<Vec<Payment>, ClientError> {
        self.send(
            self.http
                .get(self.url(&format!("/api/accounts/{}/statement", account_id))),
        )
        .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Payments
    // ─────────────────────────────────────────────────────────────────────────

    /// Authorizes a payment from `payer_id` to the configured merchant.
    pub async fn authorize(
        &self,
        payer_id: AccountId,
        order_id: &str,
        amount: i64,
        currency: Currency,
        card: Card,
    ) -> Result<PaymentResponse, ClientError> {
        let req = AuthorizeRequest {
            payer_id,
            order_id: order_id.to_string(),
            amount,
            currency,
            card,
        };
        self.lifecycle("/api/payments/auth".to_string(), &req).await
    }

    /// Captures part or all of an authorization.
    pub async fn capture(
        &self,
        payment_id: PaymentId,
        order_id: &str,
        amount: i64,
    ) -> Result<PaymentResponse, ClientError> {
        self.follow_up("capture", payment_id, order_id, amount)
            .await
    }

    /// Refunds part or all of a capture.
    pub async fn refund(
        &self,
        payment_id: PaymentId,
        order_id: &str,
        amount: i64,
    ) -> Result<PaymentResponse, ClientError> {
        self.follow_up("refund", payment_id, order_id, amount)
            .await
    }

    /// Cancels part or all of an uncaptured authorization.
    pub async fn cancel(
        &self,
        payment_id: PaymentId,
        order_id: &str,
        amount: i64,
    ) -> Result<PaymentResponse, ClientError> {
        self.follow_up("cancel", payment_id, order_id, amount)
            .await
    }

    /// Gets a payment by ID.
    pub async fn get_payment(&self, id: PaymentId) -> Result<Payment, ClientError> {
        self.send(self.http.get(self.url(&format!("/api/payments/{}", id))))
            .await
    }

    async fn follow_up(
        &self,
        action: &str,
        payment_id: PaymentId,
        order_id: &str,
        amount: i64,
    ) -> Result<PaymentResponse, ClientError> {
        let req = PaymentActionRequest {
            order_id: order_id.to_string(),
            amount,
        };
        self.lifecycle(format!("/api/payments/{}/{}", action, payment_id), &req)
            .await
    }

    /// Payment calls answer 402 with a regular body when declined.
    async fn lifecycle<B: serde::Serialize>(
        &self,
        path: String,
        body: &B,
    ) -> Result<PaymentResponse, ClientError> {
        let merchant = self.merchant.ok_or(ClientError::MissingMerchant)?;
        let resp = self
            .http
            .post(self.url(&path))
            .header(MERCHANT_HEADER, merchant.to_string())
            .json(body)
            .send()
            .await?;

        if is_payment_answer(resp.status()) {
            let body = resp.text().await?;
            Ok(serde_json::from_str(&body)?)
        } else {
            Err(api_error(resp).await)
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let resp = req.send().await?;
        if resp.status().is_success() {
            let body = resp.text().await?;
            Ok(serde_json::from_str(&body)?)
        } else {
            Err(api_error(resp).await)
        }
    }
}

fn is_payment_answer(status: StatusCode) -> bool {
    status == StatusCode::OK || status == StatusCode::PAYMENT_REQUIRED
}

async fn api_error(resp: reqwest::Response) -> ClientError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or(body);
    ClientError::Api {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = PaygateClient::new("http://localhost:3000");
        assert_eq!(client.base_url, "http://localhost:3000");
        assert!(client.merchant.is_none());
    }

    #[test]
    fn test_client_with_trailing_slash() {
        let client = PaygateClient::new("http://localhost:3000/");
        assert_eq!(client.url("/health"), "http://localhost:3000/health");
    }

    #[test]
    fn test_client_with_merchant() {
        let merchant = AccountId::new();
        let client = PaygateClient::new("http://localhost:3000").with_merchant(merchant);
        assert_eq!(client.merchant, Some(merchant));
    }

    #[test]
    fn test_declines_are_payment_answers() {
        assert!(is_payment_answer(StatusCode::OK));
        assert!(is_payment_answer(StatusCode::PAYMENT_REQUIRED));
        assert!(!is_payment_answer(StatusCode::NOT_FOUND));
        assert!(!is_payment_answer(StatusCode::SERVICE_UNAVAILABLE));
    }

    #[tokio::test]
    async fn test_payment_call_without_merchant() {
        let client = PaygateClient::new("http://localhost:3000");

        let result = client.capture(PaymentId::new(), "order-1", 10).await;

        assert!(matches!(result, Err(ClientError::MissingMerchant)));
    }
}
