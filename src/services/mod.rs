// Shop onboarding
pub mod organizations;
pub mod registration;

// Inventory
pub mod categories;
pub mod consignors;
pub mod items;

// Money
pub mod payouts;
pub mod statements;
pub mod transactions;

// Public and third-party surfaces
pub mod storefront;
pub mod subscriptions;

use rand::Rng;
use rust_decimal::{Decimal, RoundingStrategy};

/// Largest page size any list endpoint will serve.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Rounds a money amount to cents, halves away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Clamps 1-based `page`/`limit` into a zero-based page index and a sane size.
pub(crate) fn page_window(page: u64, limit: u64) -> (u64, u64) {
    (page.max(1) - 1, limit.clamp(1, MAX_PAGE_SIZE))
}

/// Validates a consignor split expressed in percent.
pub(crate) fn validate_split(split: Decimal) -> Result<(), crate::errors::ServiceError> {
    if split < Decimal::ZERO || split > Decimal::ONE_HUNDRED {
        return Err(crate::errors::ServiceError::ValidationError(
            "Split percentage must be between 0 and 100".to_string(),
        ));
    }
    Ok(())
}

/// Random code of `len` characters drawn from `alphabet`.
pub(crate) fn random_code(alphabet: &[u8], len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn round_money_rounds_halves_away_from_zero() {
        assert_eq!(round_money(dec!(2.345)), dec!(2.35));
        assert_eq!(round_money(dec!(2.335)), dec!(2.34));
        assert_eq!(round_money(dec!(-2.345)), dec!(-2.35));
        assert_eq!(round_money(dec!(10)), dec!(10));
    }

    #[test]
    fn page_window_clamps_inputs() {
        assert_eq!(page_window(0, 0), (0, 1));
        assert_eq!(page_window(3, 20), (2, 20));
        assert_eq!(page_window(1, 10_000), (0, MAX_PAGE_SIZE));
    }

    #[test]
    fn split_must_be_a_percentage() {
        assert!(validate_split(dec!(0)).is_ok());
        assert!(validate_split(dec!(100)).is_ok());
        assert!(validate_split(dec!(100.01)).is_err());
        assert!(validate_split(dec!(-1)).is_err());
    }

    #[test]
    fn random_code_uses_alphabet() {
        let code = random_code(b"AB", 12);
        assert_eq!(code.len(), 12);
        assert!(code.chars().all(|c| c == 'A' || c == 'B'));
    }
}
