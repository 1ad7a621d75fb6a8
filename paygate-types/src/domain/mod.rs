//! Domain models for the payment gateway.

pub mod account;
pub mod hold;
pub mod ledger;
pub mod money;
pub mod payment;

pub use account::{Account, AccountId, Card, CardSnapshot};
pub use hold::{HoldKind, HoldState, PaymentHold};
pub use ledger::{AccountUpdate, HoldChange, LedgerCommit};
pub use money::{Currency, Money};
pub use payment::{Disposition, Operation, Payment, PaymentId, PaymentStatus};
