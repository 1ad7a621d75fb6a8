//! Card issuance for new accounts.

use rand::Rng;

use paygate_types::Card;

/// Issues random card credentials.
///
/// Numbers are nine digits starting at 233333333; uniqueness is checked by the caller.
pub fn issue_card() -> Card {
    let mut rng = rand::rng();

    Card {
        number: rng.random_range(233_333_333..999_999_999u32).to_string(),
        expiry_month: rng.random_range(1..=12),
        expiry_year: rng.random_range(2..=25),
        security_code: rng.random_range(100..=998u32).to_string(),
    }
}
