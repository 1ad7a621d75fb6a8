//! SQLite repository adapter.
#![allow(clippy::collapsible_if)]

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{SqliteConnection, SqlitePool};
use std::str::FromStr;

use paygate_types::{
    Account, AccountId, AccountLedger, AccountUpdate, DomainError, HoldChange, HoldState,
    LedgerCommit, Money, Payment, PaymentHold, PaymentId, PaymentRepository, PaymentStore,
    RepoError,
};

use crate::types::{DbAccount, DbHold, DbPayment, DbStatementEntry, abort_unit};

const ACCOUNT_COLUMNS: &str = "id, first_name, last_name, currency, balance, held, card_number, \
     card_expiry_month, card_expiry_year, card_security_code, version, created_at";

const PAYMENT_COLUMNS: &str = "p.id, p.payee_id, p.order_id, p.operation, p.amount, p.currency, \
     p.status, p.card_number, p.card_expiry_month, p.card_expiry_year, p.reference_id, p.created_at";

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite repository implementation.
pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    /// Creates a new SQLite repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // An in-memory database dies with its last connection; keep exactly one open.
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(10)
        }
        .connect_with(options)
        .await?;

        let ddl = include_str!("../migrations/0001_create_tables.sql");
        sqlx::query(ddl).execute(&pool).await?;

        Ok(Self { pool })
    }

    async fn load_statement(&self, account_id: &str) -> Result<Vec<PaymentId>, RepoError> {
        let rows: Vec<DbStatementEntry> = sqlx::query_as(
            r#"SELECT payment_id FROM statement_entries WHERE account_id = ? ORDER BY seq"#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbStatementEntry::into_domain).collect()
    }

    async fn hydrate(&self, row: DbAccount) -> Result<Account, RepoError> {
        let statement = self.load_statement(&row.id).await?;
        row.into_domain(statement)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Ledger writes (run inside the caller's transaction)
// ─────────────────────────────────────────────────────────────────────────────

async fn insert_payment(conn: &mut SqliteConnection, payment: &Payment) -> Result<(), RepoError> {
    sqlx::query(
        r#"INSERT INTO payments (id, payee_id, order_id, operation, amount, currency, status,
               card_number, card_expiry_month, card_expiry_year, reference_id, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(payment.id.to_string())
    .bind(payment.payee_id.to_string())
    .bind(&payment.order_id)
    .bind(payment.operation.as_str())
    .bind(payment.amount.amount())
    .bind(payment.amount.currency().to_string())
    .bind(payment.status.as_str())
    .bind(&payment.card.number)
    .bind(payment.card.expiry_month)
    .bind(payment.card.expiry_year)
    .bind(payment.reference_id.map(|id| id.to_string()))
    .bind(payment.created_at.to_rfc3339())
    .execute(conn)
    .await
    .map_err(|e| RepoError::Database(e.to_string()))?;

    Ok(())
}

async fn set_balance_and_held(
    conn: &mut SqliteConnection,
    update: &AccountUpdate,
) -> Result<(), RepoError> {
    let result = sqlx::query(
        r#"UPDATE accounts SET balance = ?, held = ?, version = version + 1
           WHERE id = ? AND version = ?"#,
    )
    .bind(update.balance.amount())
    .bind(update.held.amount())
    .bind(update.account_id.to_string())
    .bind(update.expected_version)
    .execute(conn)
    .await
    .map_err(|e| RepoError::Database(e.to_string()))?;

    if result.rows_affected() == 0 {
        return Err(RepoError::Conflict(format!(
            "Account {} changed since it was read",
            update.account_id
        )));
    }
    Ok(())
}

async fn open_hold(conn: &mut SqliteConnection, hold: &PaymentHold) -> Result<(), RepoError> {
    sqlx::query(
        r#"INSERT INTO payment_holds (payment_id, kind, state, remaining, currency, version, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(hold.payment_id.to_string())
    .bind(hold.kind.to_string())
    .bind(hold.state.to_string())
    .bind(hold.remaining.amount())
    .bind(hold.remaining.currency().to_string())
    .bind(hold.version)
    .bind(hold.updated_at.to_rfc3339())
    .execute(conn)
    .await
    .map_err(|e| RepoError::Database(e.to_string()))?;

    Ok(())
}

async fn update_remaining(
    conn: &mut SqliteConnection,
    payment_id: PaymentId,
    remaining: Money,
    state: HoldState,
    expected_version: i64,
) -> Result<(), RepoError> {
    let result = sqlx::query(
        r#"UPDATE payment_holds SET remaining = ?, state = ?, version = version + 1, updated_at = ?
           WHERE payment_id = ? AND version = ?"#,
    )
    .bind(remaining.amount())
    .bind(state.to_string())
    .bind(chrono::Utc::now().to_rfc3339())
    .bind(payment_id.to_string())
    .bind(expected_version)
    .execute(conn)
    .await
    .map_err(|e| RepoError::Database(e.to_string()))?;

    if result.rows_affected() == 0 {
        return Err(RepoError::Conflict(format!(
            "Hold for payment {} changed since it was read",
            payment_id
        )));
    }
    Ok(())
}

async fn append_to_statement(
    conn: &mut SqliteConnection,
    account_id: AccountId,
    payment_id: PaymentId,
) -> Result<(), RepoError> {
    sqlx::query(r#"INSERT INTO statement_entries (account_id, payment_id) VALUES (?, ?)"#)
        .bind(account_id.to_string())
        .bind(payment_id.to_string())
        .execute(conn)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

    Ok(())
}

/// Applies every write of one ledger commit on an open transaction.
async fn apply_commit(
    conn: &mut SqliteConnection,
    changes: &LedgerCommit,
) -> Result<(), RepoError> {
    insert_payment(&mut *conn, &changes.payment).await?;

    for update in &changes.accounts {
        set_balance_and_held(&mut *conn, update).await?;
    }

    for change in &changes.holds {
        match change {
            HoldChange::Open(hold) => open_hold(&mut *conn, hold).await?,
            HoldChange::Consume {
                payment_id,
                remaining,
                state,
                expected_version,
            } => {
                update_remaining(
                    &mut *conn,
                    *payment_id,
                    *remaining,
                    *state,
                    *expected_version,
                )
                .await?
            }
        }
    }

    for account_id in &changes.statements {
        append_to_statement(&mut *conn, *account_id, changes.payment.id).await?;
    }

    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl AccountLedger for SqliteRepo {
    async fn create_account(&self, account: Account) -> Result<Account, RepoError> {
        sqlx::query(
            r#"INSERT INTO accounts (id, first_name, last_name, currency, balance, held,
                   card_number, card_expiry_month, card_expiry_year, card_security_code,
                   version, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(account.id.to_string())
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(account.currency().to_string())
        .bind(account.balance.amount())
        .bind(account.held.amount())
        .bind(&account.card.number)
        .bind(account.card.expiry_month)
        .bind(account.card.expiry_year)
        .bind(&account.card.security_code)
        .bind(account.version)
        .bind(account.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(account)
    }

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, RepoError> {
        let row: Option<DbAccount> = sqlx::query_as(&format!(
            "SELECT {} FROM accounts WHERE id = ?",
            ACCOUNT_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        match row {
            Some(row) => self.hydrate(row).await.map(Some),
            None => Ok(None),
        }
    }

    async fn get_account_by_card(&self, number: &str) -> Result<Option<Account>, RepoError> {
        let row: Option<DbAccount> = sqlx::query_as(&format!(
            "SELECT {} FROM accounts WHERE card_number = ?",
            ACCOUNT_COLUMNS
        ))
        .bind(number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        match row {
            Some(row) => self.hydrate(row).await.map(Some),
            None => Ok(None),
        }
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, RepoError> {
        let rows: Vec<DbAccount> = sqlx::query_as(&format!(
            "SELECT {} FROM accounts ORDER BY created_at DESC",
            ACCOUNT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        let mut accounts = Vec::with_capacity(rows.len());
        for row in rows {
            accounts.push(self.hydrate(row).await?);
        }
        Ok(accounts)
    }

    async fn update_account(&self, account: &Account) -> Result<Account, RepoError> {
        let result = sqlx::query(r#"UPDATE accounts SET first_name = ?, last_name = ? WHERE id = ?"#)
            .bind(&account.first_name)
            .bind(&account.last_name)
            .bind(account.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(account.clone())
    }

    async fn delete_account(&self, id: AccountId) -> Result<bool, RepoError> {
        let result =
            sqlx::query(r#"DELETE FROM accounts WHERE id = ? AND balance = 0 AND held = 0"#)
                .bind(id.to_string())
                .execute(&self.pool)
                .await
                .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn deposit(&self, id: AccountId, amount: i64) -> Result<Account, RepoError> {
        let result = sqlx::query(
            r#"UPDATE accounts SET balance = balance + ?, version = version + 1
               WHERE id = ? AND balance <= 9223372036854775807 - ?"#,
        )
        .bind(amount)
        .bind(id.to_string())
        .bind(amount)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            // Either the account is gone or the sum would leave the BIGINT range.
            return match self.get_account(id).await? {
                Some(_) => Err(DomainError::ValidationError(
                    "Deposit would overflow the account balance".into(),
                )
                .into()),
                None => Err(RepoError::NotFound),
            };
        }

        self.get_account(id).await?.ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PaymentStore for SqliteRepo {
    async fn get_payment(&self, id: PaymentId) -> Result<Option<Payment>, RepoError> {
        let row: Option<DbPayment> = sqlx::query_as(&format!(
            "SELECT {} FROM payments p WHERE p.id = ?",
            PAYMENT_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbPayment::into_domain).transpose()
    }

    async fn get_hold(&self, payment_id: PaymentId) -> Result<Option<PaymentHold>, RepoError> {
        let row: Option<DbHold> = sqlx::query_as(
            r#"SELECT payment_id, kind, state, remaining, currency, version, updated_at
               FROM payment_holds WHERE payment_id = ?"#,
        )
        .bind(payment_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbHold::into_domain).transpose()
    }

    async fn list_payments_for_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Payment>, RepoError> {
        let rows: Vec<DbPayment> = sqlx::query_as(&format!(
            "SELECT {} FROM statement_entries s JOIN payments p ON p.id = s.payment_id
             WHERE s.account_id = ? ORDER BY s.seq",
            PAYMENT_COLUMNS
        ))
        .bind(account_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbPayment::into_domain).collect()
    }
}

#[async_trait]
impl PaymentRepository for SqliteRepo {
    async fn commit(&self, changes: LedgerCommit) -> Result<Payment, RepoError> {
        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        apply_commit(&mut *db_tx, &changes)
            .await
            .map_err(abort_unit)?;

        db_tx
            .commit()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        tracing::debug!(
            payment_id = %changes.payment.id,
            accounts = changes.accounts.len(),
            holds = changes.holds.len(),
            "ledger commit applied"
        );

        Ok(changes.payment)
    }
}
