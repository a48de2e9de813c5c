//! Arbitrary-precision token amount helpers
//!
//! Balances, stakes and fees are `BigUint` everywhere in memory. Genesis
//! documents and big-integer governance parameters carry amounts as decimal
//! strings, so the same value survives JSON round trips on every node.

use crate::error::{CoreError, CoreResult};
use num_bigint::BigUint;

/// Render an amount as a decimal string
pub fn amount_to_string(amount: &BigUint) -> String {
    amount.to_str_radix(10)
}

/// Parse a decimal-string amount
pub fn amount_from_string(s: &str) -> CoreResult<BigUint> {
    if s.is_empty() {
        return Err(CoreError::validation("empty amount string"));
    }
    BigUint::parse_bytes(s.as_bytes(), 10)
        .ok_or_else(|| CoreError::validation(format!("invalid amount string: {s:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_roundtrip() {
        let amount = amount_from_string("15000000000").unwrap();
        assert_eq!(amount_to_string(&amount), "15000000000");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(amount_from_string("").is_err());
        assert!(amount_from_string("-5").is_err());
        assert!(amount_from_string("10 tokens").is_err());
    }

    #[test]
    fn test_larger_than_u64() {
        let amount = amount_from_string("340282366920938463463374607431768211456").unwrap();
        assert_eq!(
            amount_to_string(&amount),
            "340282366920938463463374607431768211456"
        );
    }
}
