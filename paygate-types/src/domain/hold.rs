//! Remaining-amount aggregate for authorizations and captures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::money::Money;
use super::payment::{Operation, Payment, PaymentId};
use crate::error::DomainError;

/// Which kind of payment a hold tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HoldKind {
    /// Funds earmarked by an approved authorization.
    Authorization,
    /// Funds settled by a successful capture, still refundable.
    Settlement,
}

impl AsRef<str> for HoldKind {
    fn as_ref(&self) -> &str {
        match self {
            Self::Authorization => "AUTHORIZATION",
            Self::Settlement => "SETTLEMENT",
        }
    }
}

impl std::fmt::Display for HoldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(AsRef::<str>::as_ref(self))
    }
}

impl std::str::FromStr for HoldKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AUTHORIZATION" => Ok(Self::Authorization),
            "SETTLEMENT" => Ok(Self::Settlement),
            other => Err(format!("Unknown hold kind: {}", other)),
        }
    }
}

/// Lifecycle state of a hold.
///
/// Authorization holds go `Held -> Captured | Cancelled`, settlement holds go
/// `Captured -> Refunded`. A hold leaves its open state once nothing remains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HoldState {
    Held,
    Captured,
    Refunded,
    Cancelled,
}

impl AsRef<str> for HoldState {
    fn as_ref(&self) -> &str {
        match self {
            Self::Held => "HELD",
            Self::Captured => "CAPTURED",
            Self::Refunded => "REFUNDED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for HoldState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(AsRef::<str>::as_ref(self))
    }
}

impl std::str::FromStr for HoldState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HELD" => Ok(Self::Held),
            "CAPTURED" => Ok(Self::Captured),
            "REFUNDED" => Ok(Self::Refunded),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(format!("Unknown hold state: {}", other)),
        }
    }
}

/// Mutable counter of what is left to capture, cancel or refund on one payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaymentHold {
    /// The authorization or capture this hold belongs to
    pub payment_id: PaymentId,
    pub kind: HoldKind,
    pub state: HoldState,
    pub remaining: Money,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl PaymentHold {
    /// Opens the hold created by an approved authorization.
    pub fn for_authorization(payment: &Payment) -> Self {
        Self::open(payment, HoldKind::Authorization, HoldState::Held)
    }

    /// Opens the refundable balance created by a successful capture.
    pub fn for_settlement(capture: &Payment) -> Self {
        Self::open(capture, HoldKind::Settlement, HoldState::Captured)
    }

    fn open(payment: &Payment, kind: HoldKind, state: HoldState) -> Self {
        Self {
            payment_id: payment.id,
            kind,
            state,
            remaining: payment.amount,
            version: 0,
            updated_at: Utc::now(),
        }
    }

    /// Whether `operation` may act on this hold in its current state.
    pub fn permits(&self, operation: Operation) -> bool {
        matches!(
            (self.kind, self.state, operation),
            (
                HoldKind::Authorization,
                HoldState::Held,
                Operation::Capture | Operation::Cancel
            ) | (HoldKind::Settlement, HoldState::Captured, Operation::Refund)
        )
    }

    /// Whether the remaining amount covers `amount`.
    pub fn covers(&self, amount: &Money) -> bool {
        self.remaining.gte(amount)
    }

    /// Returns the hold after `operation` consumed `amount` from it.
    ///
    /// The returned hold carries the next version; `self.version` is the one the
    /// store must still see when the update is applied.
    pub fn consume(&self, operation: Operation, amount: Money) -> Result<Self, DomainError> {
        if !self.permits(operation) {
            return Err(DomainError::InvalidTransition {
                state: self.state,
                operation,
            });
        }
        if !self.covers(&amount) {
            return Err(DomainError::AmountExceedsRemaining {
                remaining: self.remaining.amount(),
                requested: amount.amount(),
            });
        }

        let remaining = self.remaining.checked_sub(amount)?;
        let state = if remaining.is_zero() {
            match operation {
                Operation::Capture => HoldState::Captured,
                Operation::Cancel => HoldState::Cancelled,
                Operation::Refund => HoldState::Refunded,
                Operation::Authorization => self.state,
            }
        } else {
            self.state
        };

        Ok(Self {
            payment_id: self.payment_id,
            kind: self.kind,
            state,
            remaining,
            version: self.version + 1,
            updated_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountId, CardSnapshot, Currency, PaymentStatus};

    fn rub(amount: i64) -> Money {
        Money::new(amount, Currency::RUB).unwrap()
    }

    fn approved(amount: i64) -> Payment {
        Payment::authorization(
            AccountId::new(),
            "order-7".into(),
            rub(amount),
            CardSnapshot {
                number: "411111111".into(),
                expiry_month: 1,
                expiry_year: 24,
            },
            PaymentStatus::Approved,
        )
    }

    #[test]
    fn test_authorization_hold_permits_capture_and_cancel_only() {
        let hold = PaymentHold::for_authorization(&approved(100));
        assert_eq!(hold.state, HoldState::Held);
        assert!(hold.permits(Operation::Capture));
        assert!(hold.permits(Operation::Cancel));
        assert!(!hold.permits(Operation::Refund));
        assert!(!hold.permits(Operation::Authorization));
    }

    #[test]
    fn test_partial_capture_keeps_hold_open() {
        let hold = PaymentHold::for_authorization(&approved(100));
        let next = hold.consume(Operation::Capture, rub(40)).unwrap();

        assert_eq!(next.remaining.amount(), 60);
        assert_eq!(next.state, HoldState::Held);
        assert_eq!(next.version, hold.version + 1);
        assert!(next.permits(Operation::Cancel));
    }

    #[test]
    fn test_full_cancel_closes_hold() {
        let hold = PaymentHold::for_authorization(&approved(100));
        let next = hold.consume(Operation::Cancel, rub(100)).unwrap();

        assert_eq!(next.state, HoldState::Cancelled);
        assert!(!next.permits(Operation::Capture));
        assert!(!next.permits(Operation::Cancel));
    }

    #[test]
    fn test_settlement_hold_refunds() {
        let auth = approved(80);
        let capture = Payment::follow_up(
            &auth,
            Operation::Capture,
            "order-7".into(),
            rub(80),
            PaymentStatus::SuccessfulPayment,
        );
        let hold = PaymentHold::for_settlement(&capture);
        assert!(hold.permits(Operation::Refund));
        assert!(!hold.permits(Operation::Capture));

        let next = hold.consume(Operation::Refund, rub(80)).unwrap();
        assert_eq!(next.state, HoldState::Refunded);
        assert!(!next.permits(Operation::Refund));
    }

    #[test]
    fn test_consume_over_remaining_fails() {
        let hold = PaymentHold::for_authorization(&approved(50));
        let result = hold.consume(Operation::Capture, rub(80));
        assert!(matches!(
            result,
            Err(DomainError::AmountExceedsRemaining {
                remaining: 50,
                requested: 80
            })
        ));
    }

    #[test]
    fn test_consume_from_wrong_state_fails() {
        let hold = PaymentHold::for_authorization(&approved(50));
        let result = hold.consume(Operation::Refund, rub(10));
        assert!(matches!(result, Err(DomainError::InvalidTransition { .. })));
    }

    #[test]
    fn test_state_codes_round_trip() {
        for state in [
            HoldState::Held,
            HoldState::Captured,
            HoldState::Refunded,
            HoldState::Cancelled,
        ] {
            assert_eq!(state.to_string().parse::<HoldState>().unwrap(), state);
        }
    }
}
