//! Shared database types with feature-gated fields for SQLite and PostgreSQL.

use sqlx::FromRow;

use paygate_types::{
    Account, AccountId, Card, CardSnapshot, Currency, Money, Payment, PaymentHold, PaymentId,
    RepoError,
};

// ─────────────────────────────────────────────────────────────────────────────
// Feature-gated imports
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(not(feature = "sqlite"))]
use chrono::{DateTime, Utc};
#[cfg(not(feature = "sqlite"))]
use uuid::Uuid;

// ─────────────────────────────────────────────────────────────────────────────
// Database row structs (derive FromRow for automatic mapping)
// ─────────────────────────────────────────────────────────────────────────────

/// Account row from database.
#[derive(FromRow)]
pub struct DbAccount {
    #[cfg(not(feature = "sqlite"))]
    pub id: Uuid,
    #[cfg(feature = "sqlite")]
    pub id: String,

    pub first_name: String,
    pub last_name: String,
    pub currency: String,
    pub balance: i64,
    pub held: i64,
    pub card_number: String,
    pub card_expiry_month: i32,
    pub card_expiry_year: i32,
    pub card_security_code: String,
    pub version: i64,

    #[cfg(not(feature = "sqlite"))]
    pub created_at: DateTime<Utc>,
    #[cfg(feature = "sqlite")]
    pub created_at: String,
}

/// Payment row from database.
#[derive(FromRow)]
pub struct DbPayment {
    #[cfg(not(feature = "sqlite"))]
    pub id: Uuid,
    #[cfg(feature = "sqlite")]
    pub id: String,

    #[cfg(not(feature = "sqlite"))]
    pub payee_id: Uuid,
    #[cfg(feature = "sqlite")]
    pub payee_id: String,

    pub order_id: String,
    pub operation: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub card_number: String,
    pub card_expiry_month: i32,
    pub card_expiry_year: i32,

    #[cfg(not(feature = "sqlite"))]
    pub reference_id: Option<Uuid>,
    #[cfg(feature = "sqlite")]
    pub reference_id: Option<String>,

    #[cfg(not(feature = "sqlite"))]
    pub created_at: DateTime<Utc>,
    #[cfg(feature = "sqlite")]
    pub created_at: String,
}

/// Hold row from database.
#[derive(FromRow)]
pub struct DbHold {
    #[cfg(not(feature = "sqlite"))]
    pub payment_id: Uuid,
    #[cfg(feature = "sqlite")]
    pub payment_id: String,

    pub kind: String,
    pub state: String,
    pub remaining: i64,
    pub currency: String,
    pub version: i64,

    #[cfg(not(feature = "sqlite"))]
    pub updated_at: DateTime<Utc>,
    #[cfg(feature = "sqlite")]
    pub updated_at: String,
}

/// Statement entry row (payment id only).
#[derive(FromRow)]
pub struct DbStatementEntry {
    #[cfg(not(feature = "sqlite"))]
    pub payment_id: Uuid,
    #[cfg(feature = "sqlite")]
    pub payment_id: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing helpers
// ─────────────────────────────────────────────────────────────────────────────

pub fn parse_currency(s: &str) -> Result<Currency, RepoError> {
    s.parse()
        .map_err(|_| RepoError::Database(format!("Unknown currency: {}", s)))
}

fn parse_code<T: std::str::FromStr<Err = String>>(s: &str) -> Result<T, RepoError> {
    s.parse().map_err(RepoError::Database)
}

fn money(amount: i64, currency: Currency) -> Result<Money, RepoError> {
    Money::new(amount, currency).map_err(RepoError::Domain)
}

#[cfg(feature = "sqlite")]
pub fn parse_uuid(s: &str) -> Result<uuid::Uuid, RepoError> {
    uuid::Uuid::parse_str(s).map_err(|e| RepoError::Database(e.to_string()))
}

#[cfg(feature = "sqlite")]
pub fn parse_timestamp(s: &str) -> Result<chrono::DateTime<chrono::Utc>, RepoError> {
    Ok(chrono::DateTime::parse_from_rfc3339(s)
        .map_err(|e| RepoError::Database(e.to_string()))?
        .with_timezone(&chrono::Utc))
}

// ─────────────────────────────────────────────────────────────────────────────
// Domain conversion (feature-gated implementations)
// ─────────────────────────────────────────────────────────────────────────────

impl DbAccount {
    /// Convert database row to domain Account, attaching its statement.
    pub fn into_domain(self, statement: Vec<PaymentId>) -> Result<Account, RepoError> {
        let currency = parse_currency(&self.currency)?;
        let balance = money(self.balance, currency)?;
        let held = money(self.held, currency)?;
        let card = Card {
            number: self.card_number,
            expiry_month: self.card_expiry_month,
            expiry_year: self.card_expiry_year,
            security_code: self.card_security_code,
        };

        #[cfg(not(feature = "sqlite"))]
        let (id, created_at) = (AccountId::from_uuid(self.id), self.created_at);

        #[cfg(feature = "sqlite")]
        let (id, created_at) = (
            AccountId::from_uuid(parse_uuid(&self.id)?),
            parse_timestamp(&self.created_at)?,
        );

        Ok(Account::from_parts(
            id,
            self.first_name,
            self.last_name,
            card,
            balance,
            held,
            statement,
            self.version,
            created_at,
        ))
    }
}

impl DbPayment {
    /// Convert database row to domain Payment.
    pub fn into_domain(self) -> Result<Payment, RepoError> {
        let currency = parse_currency(&self.currency)?;
        let amount = money(self.amount, currency)?;
        let operation = parse_code(&self.operation)?;
        let status = parse_code(&self.status)?;
        let card = CardSnapshot {
            number: self.card_number,
            expiry_month: self.card_expiry_month,
            expiry_year: self.card_expiry_year,
        };

        #[cfg(not(feature = "sqlite"))]
        let (id, payee_id, reference_id, created_at) = (
            PaymentId::from_uuid(self.id),
            AccountId::from_uuid(self.payee_id),
            self.reference_id.map(PaymentId::from_uuid),
            self.created_at,
        );

        #[cfg(feature = "sqlite")]
        let (id, payee_id, reference_id, created_at) = (
            PaymentId::from_uuid(parse_uuid(&self.id)?),
            AccountId::from_uuid(parse_uuid(&self.payee_id)?),
            self.reference_id
                .as_deref()
                .map(parse_uuid)
                .transpose()?
                .map(PaymentId::from_uuid),
            parse_timestamp(&self.created_at)?,
        );

        Ok(Payment::from_parts(
            id,
            payee_id,
            self.order_id,
            operation,
            amount,
            status,
            card,
            reference_id,
            created_at,
        ))
    }
}

impl DbHold {
    /// Convert database row to domain PaymentHold.
    pub fn into_domain(self) -> Result<PaymentHold, RepoError> {
        let currency = parse_currency(&self.currency)?;

        #[cfg(not(feature = "sqlite"))]
        let (payment_id, updated_at) = (PaymentId::from_uuid(self.payment_id), self.updated_at);

        #[cfg(feature = "sqlite")]
        let (payment_id, updated_at) = (
            PaymentId::from_uuid(parse_uuid(&self.payment_id)?),
            parse_timestamp(&self.updated_at)?,
        );

        Ok(PaymentHold {
            payment_id,
            kind: parse_code(&self.kind)?,
            state: parse_code(&self.state)?,
            remaining: money(self.remaining, currency)?,
            version: self.version,
            updated_at,
        })
    }
}

impl DbStatementEntry {
    pub fn into_domain(self) -> Result<PaymentId, RepoError> {
        #[cfg(not(feature = "sqlite"))]
        let id = PaymentId::from_uuid(self.payment_id);

        #[cfg(feature = "sqlite")]
        let id = PaymentId::from_uuid(parse_uuid(&self.payment_id)?);

        Ok(id)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Error mapping
// ─────────────────────────────────────────────────────────────────────────────

/// Maps a statement failure inside a ledger commit to a transaction failure.
///
/// Version conflicts keep their own variant; the caller may retry either way.
pub fn abort_unit(err: RepoError) -> RepoError {
    match err {
        RepoError::Database(e) => RepoError::Transaction(e),
        other => other,
    }
}
