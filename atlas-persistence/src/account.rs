//! Account records
//!
//! Accounts are never destroyed; a zero balance is a valid state distinct
//! from non-existence.

use atlas_common::prelude::*;
use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub address: Address,
    pub balance: BigUint,
    /// Number of transactions this account has signed; the next
    /// transaction must carry exactly this value as its nonce
    pub nonce: u64,
}

impl Account {
    pub fn new(address: Address, balance: BigUint) -> Self {
        Self {
            address,
            balance,
            nonce: 0,
        }
    }

    /// A fresh account with zero balance
    pub fn empty(address: Address) -> Self {
        Self::new(address, BigUint::zero())
    }
}

impl AtlasSerialize for Account {}
