//! The set of writes one lifecycle operation applies atomically.

use super::account::{Account, AccountId};
use super::hold::{HoldState, PaymentHold};
use super::money::Money;
use super::payment::{Payment, PaymentId};

/// New balance/held pair for one account, guarded by the version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountUpdate {
    pub account_id: AccountId,
    pub balance: Money,
    pub held: Money,
    pub expected_version: i64,
}

impl AccountUpdate {
    /// Captures `after` as the state to write over the row read as `before`.
    pub fn from_change(before: &Account, after: &Account) -> Self {
        Self {
            account_id: after.id,
            balance: after.balance,
            held: after.held,
            expected_version: before.version,
        }
    }
}

/// A write against the hold table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HoldChange {
    /// Insert a new hold.
    Open(PaymentHold),
    /// Store a consumed hold over the row read at `expected_version`.
    Consume {
        payment_id: PaymentId,
        remaining: Money,
        state: HoldState,
        expected_version: i64,
    },
}

impl HoldChange {
    /// Builds the update that moves `before` to `after`.
    pub fn consume(before: &PaymentHold, after: &PaymentHold) -> Self {
        Self::Consume {
            payment_id: after.payment_id,
            remaining: after.remaining,
            state: after.state,
            expected_version: before.version,
        }
    }
}

/// Everything one lifecycle operation writes. Applied all-or-nothing.
#[derive(Debug, Clone)]
pub struct LedgerCommit {
    /// The new payment record
    pub payment: Payment,
    /// Balance/held writes, at most one per account
    pub accounts: Vec<AccountUpdate>,
    /// Accounts whose statement gets `payment.id` appended, in order
    pub statements: Vec<AccountId>,
    pub holds: Vec<HoldChange>,
}

impl LedgerCommit {
    /// A recorded outcome that only lands on the listed statements.
    pub fn record_only(payment: Payment, statements: Vec<AccountId>) -> Self {
        Self {
            payment,
            accounts: Vec::new(),
            statements,
            holds: Vec::new(),
        }
    }
}
