//! Staked actor records
//!
//! Validators, applications, fishermen and service nodes share one record
//! shape; the rules that differ between them (minimum stake, chain limits,
//! pause windows, message fees) are dispatched through per-kind parameter
//! names rather than separate types.

use atlas_common::prelude::*;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

/// The staked actor families
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActorKind {
    Validator,
    Application,
    Fisherman,
    ServiceNode,
}

impl ActorKind {
    pub const ALL: [ActorKind; 4] = [
        ActorKind::Validator,
        ActorKind::Application,
        ActorKind::Fisherman,
        ActorKind::ServiceNode,
    ];

    /// Stable byte used in the state-key layout
    pub fn key_byte(&self) -> u8 {
        match self {
            ActorKind::Application => b'a',
            ActorKind::Fisherman => b'f',
            ActorKind::ServiceNode => b'n',
            ActorKind::Validator => b'v',
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActorKind::Validator => "validator",
            ActorKind::Application => "application",
            ActorKind::Fisherman => "fisherman",
            ActorKind::ServiceNode => "service_node",
        }
    }

    /// Governance parameter holding the minimum stake for this kind
    pub fn minimum_stake_param(&self) -> &'static str {
        match self {
            ActorKind::Validator => "validator_minimum_stake",
            ActorKind::Application => "app_minimum_stake",
            ActorKind::Fisherman => "fisherman_minimum_stake",
            ActorKind::ServiceNode => "service_node_minimum_stake",
        }
    }

    /// Governance parameter limiting relay chains. Validators do not
    /// service chains, so they have no such parameter.
    pub fn max_chains_param(&self) -> Option<&'static str> {
        match self {
            ActorKind::Validator => None,
            ActorKind::Application => Some("app_max_chains"),
            ActorKind::Fisherman => Some("fisherman_max_chains"),
            ActorKind::ServiceNode => Some("service_node_max_chains"),
        }
    }

    /// Governance parameter for the unbonding period in blocks
    pub fn unstaking_blocks_param(&self) -> &'static str {
        match self {
            ActorKind::Validator => "validator_unstaking_blocks",
            ActorKind::Application => "app_unstaking_blocks",
            ActorKind::Fisherman => "fisherman_unstaking_blocks",
            ActorKind::ServiceNode => "service_node_unstaking_blocks",
        }
    }

    /// Governance parameter for the minimum blocks an actor must stay paused
    pub fn minimum_pause_blocks_param(&self) -> &'static str {
        match self {
            ActorKind::Validator => "validator_minimum_pause_blocks",
            ActorKind::Application => "app_minimum_pause_blocks",
            ActorKind::Fisherman => "fisherman_minimum_pause_blocks",
            ActorKind::ServiceNode => "service_node_minimum_pause_blocks",
        }
    }

    /// Governance parameter for the maximum blocks an actor may stay paused
    pub fn max_pause_blocks_param(&self) -> &'static str {
        match self {
            ActorKind::Validator => "validator_max_pause_blocks",
            ActorKind::Application => "app_max_pause_blocks",
            ActorKind::Fisherman => "fisherman_max_pause_blocks",
            ActorKind::ServiceNode => "service_node_max_pause_blocks",
        }
    }

    /// Per-kind fee parameter for a staking message name
    pub fn message_fee_param(&self, message: StakingMessageKind) -> &'static str {
        match (self, message) {
            (ActorKind::Validator, StakingMessageKind::Stake) => "message_stake_validator_fee",
            (ActorKind::Validator, StakingMessageKind::EditStake) => {
                "message_edit_stake_validator_fee"
            }
            (ActorKind::Validator, StakingMessageKind::Unstake) => "message_unstake_validator_fee",
            (ActorKind::Validator, StakingMessageKind::Pause) => "message_pause_validator_fee",
            (ActorKind::Validator, StakingMessageKind::Unpause) => "message_unpause_validator_fee",
            (ActorKind::Application, StakingMessageKind::Stake) => "message_stake_app_fee",
            (ActorKind::Application, StakingMessageKind::EditStake) => {
                "message_edit_stake_app_fee"
            }
            (ActorKind::Application, StakingMessageKind::Unstake) => "message_unstake_app_fee",
            (ActorKind::Application, StakingMessageKind::Pause) => "message_pause_app_fee",
            (ActorKind::Application, StakingMessageKind::Unpause) => "message_unpause_app_fee",
            (ActorKind::Fisherman, StakingMessageKind::Stake) => "message_stake_fisherman_fee",
            (ActorKind::Fisherman, StakingMessageKind::EditStake) => {
                "message_edit_stake_fisherman_fee"
            }
            (ActorKind::Fisherman, StakingMessageKind::Unstake) => "message_unstake_fisherman_fee",
            (ActorKind::Fisherman, StakingMessageKind::Pause) => "message_pause_fisherman_fee",
            (ActorKind::Fisherman, StakingMessageKind::Unpause) => "message_unpause_fisherman_fee",
            (ActorKind::ServiceNode, StakingMessageKind::Stake) => {
                "message_stake_service_node_fee"
            }
            (ActorKind::ServiceNode, StakingMessageKind::EditStake) => {
                "message_edit_stake_service_node_fee"
            }
            (ActorKind::ServiceNode, StakingMessageKind::Unstake) => {
                "message_unstake_service_node_fee"
            }
            (ActorKind::ServiceNode, StakingMessageKind::Pause) => {
                "message_pause_service_node_fee"
            }
            (ActorKind::ServiceNode, StakingMessageKind::Unpause) => {
                "message_unpause_service_node_fee"
            }
        }
    }
}

/// The staking message families whose fees differ per actor kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StakingMessageKind {
    Stake,
    EditStake,
    Unstake,
    Pause,
    Unpause,
}

/// Lifecycle of a staked actor. Records are only logically removed:
/// unstaking matures into `Unstaked`, the record stays.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActorStatus {
    Staked,
    Unstaking,
    Unstaked,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub kind: ActorKind,
    pub address: Address,
    pub public_key: PublicKey,
    pub staked_amount: BigUint,
    pub chains: Vec<String>,
    pub status: ActorStatus,
    /// Height at which the actor was paused, if currently paused
    pub paused_height: Option<BlockHeight>,
    /// Height at which unbonding completes, once unstaking began
    pub unstaking_height: Option<BlockHeight>,
    /// Account credited when the stake is returned
    pub output_address: Address,
}

impl Actor {
    pub fn is_paused(&self) -> bool {
        self.paused_height.is_some()
    }
}

impl AtlasSerialize for Actor {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_bytes_are_unique() {
        let mut bytes: Vec<u8> = ActorKind::ALL.iter().map(|k| k.key_byte()).collect();
        bytes.sort_unstable();
        bytes.dedup();
        assert_eq!(bytes.len(), ActorKind::ALL.len());
    }

    #[test]
    fn test_validators_have_no_chain_limit() {
        assert!(ActorKind::Validator.max_chains_param().is_none());
        for kind in [
            ActorKind::Application,
            ActorKind::Fisherman,
            ActorKind::ServiceNode,
        ] {
            assert!(kind.max_chains_param().is_some());
        }
    }
}
