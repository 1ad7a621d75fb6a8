//! Payment Application Service
//!
//! Orchestrates domain operations through the repository ports.
//! Contains NO infrastructure logic - pure business orchestration.
//! The payment lifecycle (authorize, capture, refund, cancel) lives in
//! [`crate::lifecycle`].

use paygate_types::{
    Account, AccountId, AppError, CreateAccountRequest, DepositRequest, DomainError, Payment,
    PaymentId, PaymentRepository, RepoError, UpdateAccountRequest,
};

use crate::cards::issue_card;

/// Attempts at drawing an unused card number before giving up.
const MAX_CARD_ATTEMPTS: usize = 5;

/// Application service for the payment gateway.
///
/// Generic over `R: PaymentRepository` - the adapter is injected at compile time.
/// This enables:
/// - Swapping repositories without code changes
/// - Testing with in-memory repo
/// - Compile-time checks for port implementation
pub struct PaymentService<R: PaymentRepository> {
    pub(crate) repo: R,
}

impl<R: PaymentRepository> PaymentService<R> {
    /// Creates a new payment service with the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns a reference to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Account Operations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Creates a new account with a freshly issued card.
    pub async fn create_account(&self, req: CreateAccountRequest) -> Result<Account, AppError> {
        let mut card = None;
        for _ in 0..MAX_CARD_ATTEMPTS {
            let candidate = issue_card();
            if self
                .repo
                .get_account_by_card(&candidate.number)
                .await?
                .is_none()
            {
                card = Some(candidate);
                break;
            }
        }
        let card = card.ok_or_else(|| AppError::Internal("Could not issue a unique card".into()))?;

        let account = Account::new(req.first_name, req.last_name, req.currency, card)?;
        let account = self.repo.create_account(account).await?;

        tracing::info!(account_id = %account.id, currency = %account.currency(), "account created");
        Ok(account)
    }

    /// Gets an account by ID.
    pub async fn get_account(&self, id: AccountId) -> Result<Account, AppError> {
        self.repo
            .get_account(id)
            .await
            .map_err(Into::into)
            .and_then(|opt| opt.ok_or_else(|| AppError::NotFound(format!("Account {}", id))))
    }

    /// Lists all accounts.
    pub async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        self.repo.list_accounts().await.map_err(Into::into)
    }

    /// Replaces the holder names that are non-empty in `req`.
    pub async fn update_account(
        &self,
        id: AccountId,
        req: UpdateAccountRequest,
    ) -> Result<Account, AppError> {
        let mut account = self.get_account(id).await?;

        if !req.first_name.trim().is_empty() {
            account.first_name = req.first_name;
        }
        if !req.last_name.trim().is_empty() {
            account.last_name = req.last_name;
        }

        self.repo.update_account(&account).await.map_err(Into::into)
    }

    /// Deletes an account that no longer carries any funds.
    pub async fn delete_account(&self, id: AccountId) -> Result<(), AppError> {
        let account = self.get_account(id).await?;
        if account.carries_funds() {
            return Err(DomainError::AccountNotEmpty(id).into());
        }

        if !self.repo.delete_account(id).await? {
            // Funded or removed between the read and the delete.
            return Err(RepoError::Conflict(format!("Account {} changed while deleting", id)).into());
        }

        tracing::info!(account_id = %id, "account deleted");
        Ok(())
    }

    /// Deposits money into an account.
    pub async fn deposit(&self, req: DepositRequest) -> Result<Account, AppError> {
        // Business validation
        if req.amount <= 0 {
            return Err(AppError::BadRequest("Amount must be positive".into()));
        }

        match self.repo.deposit(req.account_id, req.amount).await {
            Ok(account) => Ok(account),
            Err(RepoError::NotFound) => Err(AppError::NotFound(format!(
                "Account {}",
                req.account_id
            ))),
            Err(e) => Err(e.into()),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Payment History
    // ─────────────────────────────────────────────────────────────────────────────

    /// Gets a payment by ID.
    pub async fn get_payment(&self, id: PaymentId) -> Result<Payment, AppError> {
        self.repo
            .get_payment(id)
            .await
            .map_err(Into::into)
            .and_then(|opt| opt.ok_or_else(|| AppError::NotFound(format!("Payment {}", id))))
    }

    /// Lists the payments on an account's statement, oldest first.
    pub async fn statement(&self, account_id: AccountId) -> Result<Vec<Payment>, AppError> {
        // Verify account exists first
        let _ = self.get_account(account_id).await?;

        self.repo
            .list_payments_for_account(account_id)
            .await
            .map_err(Into::into)
    }
}
