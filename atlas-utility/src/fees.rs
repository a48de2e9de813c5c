//! Fee & reward distribution
//!
//! At end-block the accumulated fee pool splits into the proposer's reward
//! and a burned remainder. The split is integer arithmetic over `BigUint`
//! with truncation toward zero; no intermediate floating point, so every
//! node computes the identical reward.

use atlas_common::prelude::*;
use atlas_persistence::{params::names, Account, GovParams, PersistenceRwContext};
use num_bigint::BigUint;
use num_traits::Zero;
use tracing::info;

/// Split a fee pool: `reward = floor(pool * cut / 100)`, remainder burned
pub fn split_fee_pool(pool: &BigUint, cut_percentage: u64) -> (BigUint, BigUint) {
    let reward = (pool * cut_percentage) / 100u64;
    let remainder = pool - &reward;
    (reward, remainder)
}

/// Credit the proposer's share of `fee_pool` and burn the remainder.
/// Returns the burned amount.
pub fn distribute(
    ctx: &mut PersistenceRwContext,
    proposer: &Address,
    fee_pool: &BigUint,
) -> CoreResult<BigUint> {
    if fee_pool.is_zero() {
        return Ok(BigUint::zero());
    }

    let cut = GovParams::new(ctx).int(names::PROPOSER_PERCENTAGE_OF_FEES)?;
    let (reward, burned) = split_fee_pool(fee_pool, cut);

    let mut account = ctx
        .get_account(proposer)?
        .unwrap_or_else(|| Account::empty(*proposer));
    account.balance += &reward;
    ctx.set_account(&account)?;

    info!(
        proposer = %CryptoUtils::address_to_hex(proposer),
        reward = %reward,
        burned = %burned,
        "distributed block fees"
    );
    Ok(burned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_exact_percentage() {
        let (reward, remainder) = split_fee_pool(&BigUint::from(10000u64), 10);
        assert_eq!(reward, BigUint::from(1000u64));
        assert_eq!(remainder, BigUint::from(9000u64));
    }

    #[test]
    fn test_split_truncates_toward_zero() {
        let (reward, remainder) = split_fee_pool(&BigUint::from(1u64), 50);
        assert_eq!(reward, BigUint::zero());
        assert_eq!(remainder, BigUint::from(1u64));

        let (reward, remainder) = split_fee_pool(&BigUint::from(1u64), 33);
        assert_eq!(reward, BigUint::zero());
        assert_eq!(remainder, BigUint::from(1u64));

        // 999 * 33 / 100 = 329.67 -> 329
        let (reward, _) = split_fee_pool(&BigUint::from(999u64), 33);
        assert_eq!(reward, BigUint::from(329u64));
    }

    #[test]
    fn test_split_boundaries() {
        let pool = BigUint::from(12345u64);
        let (reward, remainder) = split_fee_pool(&pool, 0);
        assert_eq!(reward, BigUint::zero());
        assert_eq!(remainder, pool);

        let (reward, remainder) = split_fee_pool(&pool, 100);
        assert_eq!(reward, pool);
        assert_eq!(remainder, BigUint::zero());
    }

    #[test]
    fn test_split_conserves_pool() {
        for pool in [1u64, 7, 99, 10000, 123456789] {
            for cut in [0u64, 1, 10, 33, 50, 99, 100] {
                let pool = BigUint::from(pool);
                let (reward, remainder) = split_fee_pool(&pool, cut);
                assert_eq!(reward + remainder, pool);
            }
        }
    }
}
