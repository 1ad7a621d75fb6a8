//! Payment domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::account::{AccountId, CardSnapshot};
use super::money::Money;

/// Unique identifier for a Payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct PaymentId(Uuid);

impl PaymentId {
    /// Creates a new random PaymentId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a PaymentId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the UUID value.
    pub fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for PaymentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PaymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PaymentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// The lifecycle step a payment record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Operation {
    Authorization,
    Capture,
    Refund,
    Cancel,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Authorization => "Authorization",
            Operation::Capture => "Capture",
            Operation::Refund => "Refund",
            Operation::Cancel => "Cancel",
        }
    }

    /// The status written when this operation goes through.
    pub fn success_status(&self) -> PaymentStatus {
        match self {
            Operation::Authorization => PaymentStatus::Approved,
            Operation::Capture => PaymentStatus::SuccessfulPayment,
            Operation::Refund => PaymentStatus::SuccessfulRefund,
            Operation::Cancel => PaymentStatus::SuccessfulCancel,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Authorization" => Ok(Operation::Authorization),
            "Capture" => Ok(Operation::Capture),
            "Refund" => Ok(Operation::Refund),
            "Cancel" => Ok(Operation::Cancel),
            other => Err(format!("Unknown operation: {}", other)),
        }
    }
}

/// Outcome recorded on a payment.
///
/// Serialized as the human-readable status string clients already match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum PaymentStatus {
    #[serde(rename = "Approved")]
    Approved,
    #[serde(rename = "wrong payment request")]
    WrongPaymentRequest,
    #[serde(rename = "Insufficient funds")]
    InsufficientFunds,
    #[serde(rename = "Successful payment")]
    SuccessfulPayment,
    #[serde(rename = "Successful refund")]
    SuccessfulRefund,
    #[serde(rename = "Successful cancel")]
    SuccessfulCancel,
    #[serde(rename = "Invalid amount")]
    InvalidAmount,
    #[serde(rename = "Invalid transaction")]
    InvalidTransaction,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Approved => "Approved",
            PaymentStatus::WrongPaymentRequest => "wrong payment request",
            PaymentStatus::InsufficientFunds => "Insufficient funds",
            PaymentStatus::SuccessfulPayment => "Successful payment",
            PaymentStatus::SuccessfulRefund => "Successful refund",
            PaymentStatus::SuccessfulCancel => "Successful cancel",
            PaymentStatus::InvalidAmount => "Invalid amount",
            PaymentStatus::InvalidTransaction => "Invalid transaction",
        }
    }

    /// Whether the call went through or was declined for a business reason.
    pub fn disposition(&self) -> Disposition {
        match self {
            PaymentStatus::Approved
            | PaymentStatus::SuccessfulPayment
            | PaymentStatus::SuccessfulRefund
            | PaymentStatus::SuccessfulCancel => Disposition::Accepted,
            PaymentStatus::WrongPaymentRequest
            | PaymentStatus::InsufficientFunds
            | PaymentStatus::InvalidAmount
            | PaymentStatus::InvalidTransaction => Disposition::Declined,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Approved" => Ok(PaymentStatus::Approved),
            "wrong payment request" => Ok(PaymentStatus::WrongPaymentRequest),
            "Insufficient funds" => Ok(PaymentStatus::InsufficientFunds),
            "Successful payment" => Ok(PaymentStatus::SuccessfulPayment),
            "Successful refund" => Ok(PaymentStatus::SuccessfulRefund),
            "Successful cancel" => Ok(PaymentStatus::SuccessfulCancel),
            "Invalid amount" => Ok(PaymentStatus::InvalidAmount),
            "Invalid transaction" => Ok(PaymentStatus::InvalidTransaction),
            other => Err(format!("Unknown payment status: {}", other)),
        }
    }
}

/// Response marker separating successful outcomes from business declines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Disposition {
    Accepted,
    Declined,
}

/// A recorded payment event.
///
/// Payments are immutable once created; the remaining amount of an
/// authorization or capture is tracked on its [`PaymentHold`](super::PaymentHold).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Payment {
    /// Unique identifier
    pub id: PaymentId,
    /// Merchant account receiving the funds
    pub payee_id: AccountId,
    #[schema(example = "order-1001")]
    pub order_id: String,
    pub operation: Operation,
    pub amount: Money,
    pub status: PaymentStatus,
    /// Payer card fields captured at authorization time
    pub card: CardSnapshot,
    /// The payment this one acts upon (None for authorizations)
    pub reference_id: Option<PaymentId>,
    /// When the payment was recorded
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Creates an authorization attempt against the payer's card.
    pub fn authorization(
        payee_id: AccountId,
        order_id: String,
        amount: Money,
        card: CardSnapshot,
        status: PaymentStatus,
    ) -> Self {
        Self {
            id: PaymentId::new(),
            payee_id,
            order_id,
            operation: Operation::Authorization,
            amount,
            status,
            card,
            reference_id: None,
            created_at: Utc::now(),
        }
    }

    /// Creates a capture, refund or cancel record acting on `reference`.
    pub fn follow_up(
        reference: &Payment,
        operation: Operation,
        order_id: String,
        amount: Money,
        status: PaymentStatus,
    ) -> Self {
        Self {
            id: PaymentId::new(),
            payee_id: reference.payee_id,
            order_id,
            operation,
            amount,
            status,
            card: reference.card.clone(),
            reference_id: Some(reference.id),
            created_at: Utc::now(),
        }
    }

    /// Terminal answer for an operation attempted from the wrong prior state.
    ///
    /// Never persisted; it carries the id of the payment that was referenced.
    pub fn invalid_transaction(
        reference: &Payment,
        operation: Operation,
        order_id: String,
        amount: Money,
    ) -> Self {
        let status = PaymentStatus::InvalidTransaction;
        Self {
            id: reference.id,
            ..Self::follow_up(reference, operation, order_id, amount, status)
        }
    }

    /// Reconstructs a payment from database fields.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: PaymentId,
        payee_id: AccountId,
        order_id: String,
        operation: Operation,
        amount: Money,
        status: PaymentStatus,
        card: CardSnapshot,
        reference_id: Option<PaymentId>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            payee_id,
            order_id,
            operation,
            amount,
            status,
            card,
            reference_id,
            created_at,
        }
    }

    pub fn disposition(&self) -> Disposition {
        self.status.disposition()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Currency;

    fn snapshot() -> CardSnapshot {
        CardSnapshot {
            number: "411111111".into(),
            expiry_month: 7,
            expiry_year: 25,
        }
    }

    #[test]
    fn test_status_wire_strings() {
        let json = serde_json::to_string(&PaymentStatus::WrongPaymentRequest).unwrap();
        assert_eq!(json, "\"wrong payment request\"");

        let parsed: PaymentStatus = "Invalid amount".parse().unwrap();
        assert_eq!(parsed, PaymentStatus::InvalidAmount);
        assert_eq!(parsed.to_string(), "Invalid amount");
    }

    #[test]
    fn test_dispositions() {
        assert_eq!(PaymentStatus::Approved.disposition(), Disposition::Accepted);
        assert_eq!(
            PaymentStatus::SuccessfulRefund.disposition(),
            Disposition::Accepted
        );
        assert_eq!(
            PaymentStatus::InsufficientFunds.disposition(),
            Disposition::Declined
        );
        assert_eq!(
            PaymentStatus::InvalidTransaction.disposition(),
            Disposition::Declined
        );
    }

    #[test]
    fn test_follow_up_inherits_payee_and_card() {
        let payee = AccountId::new();
        let amount = Money::new(500, Currency::RUB).unwrap();
        let auth = Payment::authorization(
            payee,
            "order-1".into(),
            amount,
            snapshot(),
            PaymentStatus::Approved,
        );

        let capture = Payment::follow_up(
            &auth,
            Operation::Capture,
            "order-1".into(),
            amount,
            PaymentStatus::SuccessfulPayment,
        );

        assert_ne!(capture.id, auth.id);
        assert_eq!(capture.payee_id, payee);
        assert_eq!(capture.card, auth.card);
        assert_eq!(capture.reference_id, Some(auth.id));
    }

    #[test]
    fn test_invalid_transaction_reuses_reference_id() {
        let amount = Money::new(500, Currency::RUB).unwrap();
        let auth = Payment::authorization(
            AccountId::new(),
            "order-1".into(),
            amount,
            snapshot(),
            PaymentStatus::InsufficientFunds,
        );

        let invalid =
            Payment::invalid_transaction(&auth, Operation::Capture, "order-1".into(), amount);

        assert_eq!(invalid.id, auth.id);
        assert_eq!(invalid.status, PaymentStatus::InvalidTransaction);
        assert_eq!(invalid.operation, Operation::Capture);
    }
}
