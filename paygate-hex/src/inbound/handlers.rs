//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use paygate_types::{
    AccountId, AccountResponse, AppError, AuthorizeRequest, CreateAccountRequest, DepositRequest,
    Disposition, Payment, PaymentActionRequest, PaymentId, PaymentRepository, PaymentResponse,
    UpdateAccountRequest,
};

use super::merchant::Merchant;
use crate::PaymentService;

/// Application state shared across handlers.
pub struct AppState<R: PaymentRepository> {
    pub service: PaymentService<R>,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::TransactionFailed(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
        };

        let body = serde_json::json!({
            "error": message,
            "code": status.as_u16()
        });

        (status, Json(body)).into_response()
    }
}

/// Encodes a lifecycle outcome: 200 when accepted, 402 when declined.
fn payment_outcome(payment: Payment) -> Response {
    let status = match payment.disposition() {
        Disposition::Accepted => StatusCode::OK,
        Disposition::Declined => StatusCode::PAYMENT_REQUIRED,
    };
    (status, Json(PaymentResponse::from(payment))).into_response()
}

fn parse_account_id(id: &str) -> Result<AccountId, AppError> {
    id.parse()
        .map_err(|_| AppError::BadRequest("Invalid account ID".into()))
}

fn parse_payment_id(id: &str) -> Result<PaymentId, AppError> {
    id.parse()
        .map_err(|_| AppError::BadRequest("Invalid payment ID".into()))
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Accounts
// ─────────────────────────────────────────────────────────────────────────────

/// Create a new account.
#[tracing::instrument(skip(state), fields(first_name = %req.first_name, currency = %req.currency))]
pub async fn create_account<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    Json(req): Json<CreateAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state.service.create_account(req).await?;
    Ok((StatusCode::CREATED, Json(AccountResponse::from(account))))
}

/// List all accounts.
#[tracing::instrument(skip(state))]
pub async fn list_accounts<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
) -> Result<impl IntoResponse, ApiError> {
    let accounts = state.service.list_accounts().await?;
    let body: Vec<AccountResponse> = accounts.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

/// Get account by ID.
#[tracing::instrument(skip(state), fields(account_id = %id))]
pub async fn get_account<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let account_id = parse_account_id(&id)?;
    let account = state.service.get_account(account_id).await?;
    Ok(Json(AccountResponse::from(account)))
}

/// Rename an account holder.
#[tracing::instrument(skip(state, req), fields(account_id = %id))]
pub async fn update_account<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account_id = parse_account_id(&id)?;
    let account = state.service.update_account(account_id, req).await?;
    Ok(Json(AccountResponse::from(account)))
}

/// Delete an account without funds.
#[tracing::instrument(skip(state), fields(account_id = %id))]
pub async fn delete_account<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let account_id = parse_account_id(&id)?;
    state.service.delete_account(account_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Payments on an account's statement.
#[tracing::instrument(skip(state), fields(account_id = %id))]
pub async fn statement<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let account_id = parse_account_id(&id)?;
    let payments = state.service.statement(account_id).await?;
    Ok(Json(payments))
}

/// Deposit money into an account.
#[tracing::instrument(skip(state), fields(account_id = %req.account_id, amount = req.amount))]
pub async fn deposit<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    Json(req): Json<DepositRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state.service.deposit(req).await?;
    Ok(Json(AccountResponse::from(account)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Payments
// ─────────────────────────────────────────────────────────────────────────────

/// Authorize a card payment to the calling merchant.
#[tracing::instrument(skip(state, req), fields(merchant = %merchant.0, payer_id = %req.payer_id, amount = req.amount))]
pub async fn authorize<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    merchant: Merchant,
    Json(req): Json<AuthorizeRequest>,
) -> Result<Response, ApiError> {
    let payment = state.service.authorize(merchant.0, req).await?;
    Ok(payment_outcome(payment))
}

/// Capture an approved authorization.
#[tracing::instrument(skip(state, req), fields(merchant = %merchant.0, payment_id = %id, amount = req.amount))]
pub async fn capture<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    merchant: Merchant,
    Path(id): Path<String>,
    Json(req): Json<PaymentActionRequest>,
) -> Result<Response, ApiError> {
    let payment_id = parse_payment_id(&id)?;
    let payment = state.service.capture(merchant.0, payment_id, req).await?;
    Ok(payment_outcome(payment))
}

/// Refund a successful capture.
#[tracing::instrument(skip(state, req), fields(merchant = %merchant.0, payment_id = %id, amount = req.amount))]
pub async fn refund<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    merchant: Merchant,
    Path(id): Path<String>,
    Json(req): Json<PaymentActionRequest>,
) -> Result<Response, ApiError> {
    let payment_id = parse_payment_id(&id)?;
    let payment = state.service.refund(merchant.0, payment_id, req).await?;
    Ok(payment_outcome(payment))
}

/// Cancel an uncaptured authorization.
#[tracing::instrument(skip(state, req), fields(merchant = %merchant.0, payment_id = %id, amount = req.amount))]
pub async fn cancel<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    merchant: Merchant,
    Path(id): Path<String>,
    Json(req): Json<PaymentActionRequest>,
) -> Result<Response, ApiError> {
    let payment_id = parse_payment_id(&id)?;
    let payment = state.service.cancel(merchant.0, payment_id, req).await?;
    Ok(payment_outcome(payment))
}

/// Get payment by ID.
#[tracing::instrument(skip(state), fields(payment_id = %id))]
pub async fn get_payment<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let payment_id = parse_payment_id(&id)?;
    let payment = state.service.get_payment(payment_id).await?;
    Ok(Json(payment))
}

/// Serves the generated OpenAPI document.
pub async fn openapi_json() -> impl IntoResponse {
    use utoipa::OpenApi;
    Json(crate::openapi::ApiDoc::openapi())
}
