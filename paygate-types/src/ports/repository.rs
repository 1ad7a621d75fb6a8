//! Repository port traits.
//!
//! The ledger and the payment store are separate ports; the engine needs both
//! plus an atomic commit, which `PaymentRepository` bundles.

use crate::domain::{Account, AccountId, LedgerCommit, Payment, PaymentHold, PaymentId};
use crate::error::RepoError;

/// Account storage.
#[async_trait::async_trait]
pub trait AccountLedger: Send + Sync + 'static {
    /// Stores a freshly created account.
    async fn create_account(&self, account: Account) -> Result<Account, RepoError>;

    /// Gets an account by ID.
    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, RepoError>;

    /// Gets the account whose current card carries `number`.
    async fn get_account_by_card(&self, number: &str) -> Result<Option<Account>, RepoError>;

    /// Lists all accounts.
    async fn list_accounts(&self) -> Result<Vec<Account>, RepoError>;

    /// Writes the holder names of an existing account.
    async fn update_account(&self, account: &Account) -> Result<Account, RepoError>;

    /// Removes an account. Returns false when it did not exist.
    async fn delete_account(&self, id: AccountId) -> Result<bool, RepoError>;

    /// Adds `amount` to the balance unconditionally.
    async fn deposit(&self, id: AccountId, amount: i64) -> Result<Account, RepoError>;
}

/// Payment and hold storage.
#[async_trait::async_trait]
pub trait PaymentStore: Send + Sync + 'static {
    /// Gets a payment by ID.
    async fn get_payment(&self, id: PaymentId) -> Result<Option<Payment>, RepoError>;

    /// Gets the hold tracking `payment_id`, if one was opened.
    async fn get_hold(&self, payment_id: PaymentId) -> Result<Option<PaymentHold>, RepoError>;

    /// Payments on the account's statement, oldest first.
    async fn list_payments_for_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Payment>, RepoError>;
}

/// Everything the payment service needs from storage.
///
/// `commit` MUST apply every write of the unit in one database transaction
/// and fail with [`RepoError::Conflict`] when a guarded row changed version.
#[async_trait::async_trait]
pub trait PaymentRepository: AccountLedger + PaymentStore {
    /// Applies a lifecycle operation's writes atomically.
    async fn commit(&self, changes: LedgerCommit) -> Result<Payment, RepoError>;
}
