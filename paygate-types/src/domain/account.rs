//! Account domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::money::{Currency, Money};
use super::payment::PaymentId;
use crate::error::DomainError;

/// Unique identifier for an Account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Creates a new random AccountId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an AccountId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the UUID value.
    pub fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AccountId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Card credentials issued to an account.
///
/// The number doubles as a secondary lookup key for the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Card {
    #[schema(example = "411111111")]
    pub number: String,
    #[schema(example = 7)]
    pub expiry_month: i32,
    #[schema(example = 25)]
    pub expiry_year: i32,
    #[schema(example = "123")]
    pub security_code: String,
}

impl Card {
    /// Creates card credentials after checking their shape.
    pub fn new(
        number: impl Into<String>,
        expiry_month: i32,
        expiry_year: i32,
        security_code: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let card = Self {
            number: number.into(),
            expiry_month,
            expiry_year,
            security_code: security_code.into(),
        };
        card.validate()?;
        Ok(card)
    }

    /// Checks that the fields are well formed.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.number.is_empty() || !self.number.chars().all(|c| c.is_ascii_digit()) {
            return Err(DomainError::ValidationError(
                "Card number must contain only digits".into(),
            ));
        }
        if !(1..=12).contains(&self.expiry_month) {
            return Err(DomainError::ValidationError(
                "Card expiry month must be between 1 and 12".into(),
            ));
        }
        if self.expiry_year < 0 {
            return Err(DomainError::ValidationError(
                "Card expiry year cannot be negative".into(),
            ));
        }
        if !(3..=4).contains(&self.security_code.len())
            || !self.security_code.chars().all(|c| c.is_ascii_digit())
        {
            return Err(DomainError::ValidationError(
                "Card security code must be 3 or 4 digits".into(),
            ));
        }
        Ok(())
    }

    /// The card fields recorded on a payment (the security code is never stored there).
    pub fn snapshot(&self) -> CardSnapshot {
        CardSnapshot {
            number: self.number.clone(),
            expiry_month: self.expiry_month,
            expiry_year: self.expiry_year,
        }
    }
}

/// Copy of the payer's card fields taken when a payment is authorized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CardSnapshot {
    pub number: String,
    pub expiry_month: i32,
    pub expiry_year: i32,
}

/// A ledger account holding spendable and held funds.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Account {
    /// Unique identifier
    pub id: AccountId,
    #[schema(example = "Ivan")]
    pub first_name: String,
    #[schema(example = "Petrov")]
    pub last_name: String,
    pub card: Card,
    /// Spendable funds
    pub balance: Money,
    /// Funds earmarked by open authorizations
    pub held: Money,
    /// Payment ids in the order they touched this account
    pub statement: Vec<PaymentId>,
    /// Bumped on every balance write
    pub version: i64,
    /// When the account was created
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Creates a new account with zero balance and no holds.
    ///
    /// # Validation
    /// - Names cannot be empty
    pub fn new(
        first_name: String,
        last_name: String,
        currency: Currency,
        card: Card,
    ) -> Result<Self, DomainError> {
        if first_name.trim().is_empty() || last_name.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Account holder names cannot be empty".into(),
            ));
        }

        Ok(Self {
            id: AccountId::new(),
            first_name,
            last_name,
            card,
            balance: Money::zero(currency),
            held: Money::zero(currency),
            statement: Vec::new(),
            version: 0,
            created_at: Utc::now(),
        })
    }

    /// Creates an account with all fields specified (for database reconstruction).
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: AccountId,
        first_name: String,
        last_name: String,
        card: Card,
        balance: Money,
        held: Money,
        statement: Vec<PaymentId>,
        version: i64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            first_name,
            last_name,
            card,
            balance,
            held,
            statement,
            version,
            created_at,
        }
    }

    /// Returns the currency of this account.
    pub fn currency(&self) -> Currency {
        self.balance.currency()
    }

    /// True when the presented credentials equal the card on file.
    pub fn matches_card(&self, card: &Card) -> bool {
        self.card == *card
    }

    /// Checks if the account has sufficient spendable funds.
    pub fn has_sufficient_funds(&self, amount: &Money) -> bool {
        self.balance.gte(amount)
    }

    /// True while the account still has a balance or open holds.
    pub fn carries_funds(&self) -> bool {
        !self.balance.is_zero() || !self.held.is_zero()
    }

    /// Balance plus held funds.
    pub fn total(&self) -> Result<Money, DomainError> {
        self.balance.checked_add(self.held)
    }

    /// Credits (adds) money to the spendable balance.
    pub fn credit(&mut self, amount: Money) -> Result<(), DomainError> {
        self.balance = self.balance.checked_add(amount)?;
        Ok(())
    }

    /// Debits (subtracts) money from the spendable balance.
    pub fn debit(&mut self, amount: Money) -> Result<(), DomainError> {
        self.balance = self.balance.checked_sub(amount)?;
        Ok(())
    }

    /// Moves money from the balance into held funds.
    pub fn place_hold(&mut self, amount: Money) -> Result<(), DomainError> {
        let balance = self.balance.checked_sub(amount)?;
        let held = self.held.checked_add(amount)?;
        self.balance = balance;
        self.held = held;
        Ok(())
    }

    /// Earmarks incoming money without touching the balance.
    pub fn add_hold(&mut self, amount: Money) -> Result<(), DomainError> {
        self.held = self.held.checked_add(amount)?;
        Ok(())
    }

    /// Drops held money without returning it to the balance.
    pub fn remove_hold(&mut self, amount: Money) -> Result<(), DomainError> {
        self.held = self.held.checked_sub(amount)?;
        Ok(())
    }

    /// Moves held money back into the balance.
    pub fn release_hold(&mut self, amount: Money) -> Result<(), DomainError> {
        let held = self.held.checked_sub(amount)?;
        let balance = self.balance.checked_add(amount)?;
        self.held = held;
        self.balance = balance;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> Card {
        Card::new("411111111", 7, 25, "123").unwrap()
    }

    fn funded(amount: i64) -> Account {
        let mut account =
            Account::new("Ivan".into(), "Petrov".into(), Currency::RUB, card()).unwrap();
        account
            .credit(Money::new(amount, Currency::RUB).unwrap())
            .unwrap();
        account
    }

    fn rub(amount: i64) -> Money {
        Money::new(amount, Currency::RUB).unwrap()
    }

    #[test]
    fn test_account_creation() {
        let account = Account::new("Ivan".into(), "Petrov".into(), Currency::RUB, card()).unwrap();
        assert_eq!(account.balance.amount(), 0);
        assert_eq!(account.held.amount(), 0);
        assert!(account.statement.is_empty());
        assert_eq!(account.currency(), Currency::RUB);
    }

    #[test]
    fn test_empty_name_fails() {
        let result = Account::new("".into(), "Petrov".into(), Currency::RUB, card());
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }

    #[test]
    fn test_card_validation() {
        assert!(Card::new("41a1", 7, 25, "123").is_err());
        assert!(Card::new("4111", 13, 25, "123").is_err());
        assert!(Card::new("4111", 12, 25, "12").is_err());
        assert!(Card::new("4111", 12, 25, "0123").is_ok());
    }

    #[test]
    fn test_matches_card_requires_every_field() {
        let account = funded(0);
        assert!(account.matches_card(&card()));

        let mut wrong_code = card();
        wrong_code.security_code = "999".into();
        assert!(!account.matches_card(&wrong_code));

        let mut wrong_expiry = card();
        wrong_expiry.expiry_year = 26;
        assert!(!account.matches_card(&wrong_expiry));
    }

    #[test]
    fn test_place_and_release_hold() {
        let mut account = funded(100);
        account.place_hold(rub(60)).unwrap();
        assert_eq!(account.balance.amount(), 40);
        assert_eq!(account.held.amount(), 60);

        account.release_hold(rub(60)).unwrap();
        assert_eq!(account.balance.amount(), 100);
        assert_eq!(account.held.amount(), 0);
    }

    #[test]
    fn test_place_hold_insufficient_funds_leaves_account_untouched() {
        let mut account = funded(30);
        let result = account.place_hold(rub(50));
        assert!(matches!(result, Err(DomainError::InsufficientFunds { .. })));
        assert_eq!(account.balance.amount(), 30);
        assert_eq!(account.held.amount(), 0);
    }

    #[test]
    fn test_remove_hold_below_zero_fails() {
        let mut account = funded(0);
        account.add_hold(rub(10)).unwrap();
        assert!(account.remove_hold(rub(11)).is_err());
        assert_eq!(account.held.amount(), 10);
    }

    #[test]
    fn test_carries_funds() {
        let mut account = funded(0);
        assert!(!account.carries_funds());
        account.add_hold(rub(1)).unwrap();
        assert!(account.carries_funds());
    }
}
