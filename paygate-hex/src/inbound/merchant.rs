//! Merchant identification for payment endpoints.

use axum::{extract::FromRequestParts, http::request::Parts};

use paygate_types::{AccountId, AppError};

use super::handlers::ApiError;

/// Header carrying the payee (merchant) account id.
pub const MERCHANT_HEADER: &str = "X-Merchant-Id";

/// The calling merchant, read from the `X-Merchant-Id` header.
#[derive(Debug, Clone, Copy)]
pub struct Merchant(pub AccountId);

fn merchant_id(value: Option<&str>) -> Result<AccountId, AppError> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("Missing {} header", MERCHANT_HEADER)))?;

    value
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid {} header", MERCHANT_HEADER)))
}

impl<S: Send + Sync> FromRequestParts<S> for Merchant {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(MERCHANT_HEADER)
            .and_then(|v| v.to_str().ok());

        Ok(Merchant(merchant_id(header)?))
    }
}
