//! PostgreSQL repository adapter.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgConnection, PgPool};

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
// PostgreSQL Repository
// ─────────────────────────────────────────────────────────────────────────────

/// PostgreSQL repository with version-guarded ledger writes.
pub struct PostgresRepo {
    pool: PgPool,
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &PgPool, sql: &str, name: &str) -> Result<(), anyhow::Error> {
    for statement in sql.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration {} failed: {}", name, e))?;
        }
    }
    Ok(())
}

/// Runs all database migrations.
async fn run_migrations(pool: &PgPool) -> Result<(), anyhow::Error> {
    execute_migration(
        pool,
        include_str!("../migrations/0001_create_tables_pg.sql"),
        "0001",
    )
    .await
}

impl PostgresRepo {
    /// Creates a new PostgreSQL repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    async fn hydrate(&self, row: DbAccount) -> Result<Account, RepoError> {
        let rows: Vec<DbStatementEntry> = sqlx::query_as(
            r#"SELECT payment_id FROM statement_entries WHERE account_id = $1 ORDER BY seq"#,
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        let statement = rows
            .into_iter()
            .map(DbStatementEntry::into_domain)
            .collect::<Result<Vec<_>, _>>()?;
        row.into_domain(statement)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Ledger writes (run inside the caller's transaction)
// ─────────────────────────────────────────────────────────────────────────────

async fn insert_payment(conn: &mut PgConnection, payment: &Payment) -> Result<(), RepoError> {
    sqlx::query(
        r#"INSERT INTO payments (id, payee_id, order_id, operation, amount, currency, status,
               card_number, card_expiry_month, card_expiry_year, reference_id, created_at)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"#,
    )
    .bind(payment.id.into_uuid())
    .bind(payment.payee_id.into_uuid())
    .bind(&payment.order_id)
    .bind(payment.operation.as_str())
    .bind(payment.amount.amount())
    .bind(payment.amount.currency().to_string())
    .bind(payment.status.as_str())
    .bind(&payment.card.number)
    .bind(payment.card.expiry_month)
    .bind(payment.card.expiry_year)
    .bind(payment.reference_id.map(PaymentId::into_uuid))
    .bind(payment.created_at)
    .execute(conn)
    .await
    .map_err(|e| RepoError::Database(e.to_string()))?;

    Ok(())
}

async fn set_balance_and_held(
    conn: &mut PgConnection,
    update: &AccountUpdate,
) -> Result<(), RepoError> {
    let result = sqlx::query(
        r#"UPDATE accounts SET balance = $1, held = $2, version = version + 1
           WHERE id = $3 AND version = $4"#,
    )
    .bind(update.balance.amount())
    .bind(update.held.amount())
    .bind(update.account_id.into_uuid())
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

async fn open_hold(conn: &mut PgConnection, hold: &PaymentHold) -> Result<(), RepoError> {
    sqlx::query(
        r#"INSERT INTO payment_holds (payment_id, kind, state, remaining, currency, version, updated_at)
           VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
    )
    .bind(hold.payment_id.into_uuid())
    .bind(hold.kind.to_string())
    .bind(hold.state.to_string())
    .bind(hold.remaining.amount())
    .bind(hold.remaining.currency().to_string())
    .bind(hold.version)
    .bind(hold.updated_at)
    .execute(conn)
    .await
    .map_err(|e| RepoError::Database(e.to_string()))?;

    Ok(())
}

async fn update_remaining(
    conn: &mut PgConnection,
    payment_id: PaymentId,
    remaining: Money,
    state: HoldState,
    expected_version: i64,
) -> Result<(), RepoError> {
    let result = sqlx::query(
        r#"UPDATE payment_holds SET remaining = $1, state = $2, version = version + 1, updated_at = $3
           WHERE payment_id = $4 AND version = $5"#,
    )
    .bind(remaining.amount())
    .bind(state.to_string())
    .bind(Utc::now())
    .bind(payment_id.into_uuid())
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
    conn: &mut PgConnection,
    account_id: AccountId,
    payment_id: PaymentId,
) -> Result<(), RepoError> {
    sqlx::query(r#"INSERT INTO statement_entries (account_id, payment_id) VALUES ($1, $2)"#)
        .bind(account_id.into_uuid())
        .bind(payment_id.into_uuid())
        .execute(conn)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

    Ok(())
}

/// Applies every write of one ledger commit on an open transaction.
async fn apply_commit(
    conn: &mut PgConnection,
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
impl AccountLedger for PostgresRepo {
    async fn create_account(&self, account: Account) -> Result<Account, RepoError> {
        sqlx::query(
            r#"INSERT INTO accounts (id, first_name, last_name, currency, balance, held,
                   card_number, card_expiry_month, card_expiry_year, card_security_code,
                   version, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"#,
        )
        .bind(account.id.into_uuid())
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
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(account)
    }

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, RepoError> {
        let row: Option<DbAccount> = sqlx::query_as(&format!(
            "SELECT {} FROM accounts WHERE id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(id.into_uuid())
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
            "SELECT {} FROM accounts WHERE card_number = $1",
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
        let result =
            sqlx::query(r#"UPDATE accounts SET first_name = $1, last_name = $2 WHERE id = $3"#)
                .bind(&account.first_name)
                .bind(&account.last_name)
                .bind(account.id.into_uuid())
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
            sqlx::query(r#"DELETE FROM accounts WHERE id = $1 AND balance = 0 AND held = 0"#)
                .bind(id.into_uuid())
                .execute(&self.pool)
                .await
                .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn deposit(&self, id: AccountId, amount: i64) -> Result<Account, RepoError> {
        let result = sqlx::query(
            r#"UPDATE accounts SET balance = balance + $1, version = version + 1
               WHERE id = $2 AND balance <= 9223372036854775807 - $1"#,
        )
        .bind(amount)
        .bind(id.into_uuid())
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
impl PaymentStore for PostgresRepo {
    async fn get_payment(&self, id: PaymentId) -> Result<Option<Payment>, RepoError> {
        let row: Option<DbPayment> = sqlx::query_as(&format!(
            "SELECT {} FROM payments p WHERE p.id = $1",
            PAYMENT_COLUMNS
        ))
        .bind(id.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbPayment::into_domain).transpose()
    }

    async fn get_hold(&self, payment_id: PaymentId) -> Result<Option<PaymentHold>, RepoError> {
        let row: Option<DbHold> = sqlx::query_as(
            r#"SELECT payment_id, kind, state, remaining, currency, version, updated_at
               FROM payment_holds WHERE payment_id = $1"#,
        )
        .bind(payment_id.into_uuid())
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
             WHERE s.account_id = $1 ORDER BY s.seq",
            PAYMENT_COLUMNS
        ))
        .bind(account_id.into_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbPayment::into_domain).collect()
    }
}

#[async_trait]
impl PaymentRepository for PostgresRepo {
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
