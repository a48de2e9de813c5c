//! Genesis document loading
//!
//! A genesis document is a static JSON file carrying the initial accounts,
//! the initial staked actors per kind, and the governance parameter table
//! with per-parameter owners. It seeds a fresh context exactly once at
//! process start; afterwards parameters change only through
//! `ChangeParameter` transactions.

use atlas_common::{amount, prelude::*};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::account::Account;
use crate::actor::{Actor, ActorKind, ActorStatus};
use crate::context::PersistenceRwContext;
use crate::params::{names, Param, ParamValue};

/// An initial account balance
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GenesisAccount {
    /// Hex-encoded 20-byte address
    pub address: String,
    /// Decimal-string amount
    pub amount: String,
}

/// An initial staked actor
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GenesisActor {
    pub address: String,
    pub public_key: String,
    pub staked_amount: String,
    #[serde(default)]
    pub chains: Vec<String>,
    pub output_address: String,
}

/// A genesis governance parameter value, JSON-friendly
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum GenesisParamValue {
    Int(u64),
    BigInt(String),
    Address(String),
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GenesisParam {
    pub name: String,
    #[serde(flatten)]
    pub value: GenesisParamValue,
    pub owner: String,
}

/// The genesis document
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct GenesisState {
    #[serde(default)]
    pub accounts: Vec<GenesisAccount>,
    #[serde(default)]
    pub validators: Vec<GenesisActor>,
    #[serde(default)]
    pub applications: Vec<GenesisActor>,
    #[serde(default)]
    pub fishermen: Vec<GenesisActor>,
    #[serde(default)]
    pub service_nodes: Vec<GenesisActor>,
    #[serde(default)]
    pub params: Vec<GenesisParam>,
}

impl GenesisState {
    /// Parse a genesis document
    pub fn from_json(json: &str) -> CoreResult<Self> {
        serde_json::from_str(json).map_err(|e| CoreError::genesis(format!("parse failure: {e}")))
    }

    /// Seed a fresh context with the document's content
    pub fn seed(&self, ctx: &mut PersistenceRwContext) -> CoreResult<()> {
        for account in &self.accounts {
            let address = CryptoUtils::hex_to_address(&account.address)
                .map_err(|e| CoreError::genesis(format!("account address: {e}")))?;
            let balance = amount::amount_from_string(&account.amount)
                .map_err(|e| CoreError::genesis(format!("account amount: {e}")))?;
            ctx.set_account(&Account::new(address, balance))?;
        }

        for (kind, actors) in [
            (ActorKind::Validator, &self.validators),
            (ActorKind::Application, &self.applications),
            (ActorKind::Fisherman, &self.fishermen),
            (ActorKind::ServiceNode, &self.service_nodes),
        ] {
            for actor in actors {
                ctx.set_actor(&Self::build_actor(kind, actor)?)?;
            }
        }

        for param in &self.params {
            let owner = CryptoUtils::hex_to_address(&param.owner)
                .map_err(|e| CoreError::genesis(format!("param owner: {e}")))?;
            let value = match &param.value {
                GenesisParamValue::Int(v) => ParamValue::Int(*v),
                GenesisParamValue::BigInt(s) => ParamValue::BigInt(
                    amount::amount_from_string(s)
                        .map_err(|e| CoreError::genesis(format!("param {}: {e}", param.name)))?,
                ),
                GenesisParamValue::Address(s) => ParamValue::Address(
                    CryptoUtils::hex_to_address(s)
                        .map_err(|e| CoreError::genesis(format!("param {}: {e}", param.name)))?,
                ),
            };
            ctx.set_param(&param.name, Param { value, owner })?;
        }

        info!(
            accounts = self.accounts.len(),
            validators = self.validators.len(),
            params = self.params.len(),
            "seeded genesis state"
        );
        Ok(())
    }

    fn build_actor(kind: ActorKind, genesis: &GenesisActor) -> CoreResult<Actor> {
        Ok(Actor {
            kind,
            address: CryptoUtils::hex_to_address(&genesis.address)
                .map_err(|e| CoreError::genesis(format!("actor address: {e}")))?,
            public_key: CryptoUtils::hex_to_public_key(&genesis.public_key)
                .map_err(|e| CoreError::genesis(format!("actor public key: {e}")))?,
            staked_amount: amount::amount_from_string(&genesis.staked_amount)
                .map_err(|e| CoreError::genesis(format!("actor stake: {e}")))?,
            chains: genesis.chains.clone(),
            status: ActorStatus::Staked,
            paused_height: None,
            unstaking_height: None,
            output_address: CryptoUtils::hex_to_address(&genesis.output_address)
                .map_err(|e| CoreError::genesis(format!("actor output address: {e}")))?,
        })
    }
}

/// The default governance parameter table, every entry owned by `owner`.
/// Values follow the original network defaults: 15000000000 minimum stake,
/// 15 chains, 2016 unstaking blocks, 4/672 pause windows, 10 percent
/// proposer cut, 10000 fee per message.
pub fn default_params(owner: Address) -> Vec<(String, Param)> {
    let mut table: Vec<(String, Param)> = Vec::new();
    let push_int = |table: &mut Vec<(String, Param)>, name: &str, v: u64| {
        table.push((
            name.to_string(),
            Param {
                value: ParamValue::Int(v),
                owner,
            },
        ));
    };
    let push_big = |table: &mut Vec<(String, Param)>, name: &str, v: u64| {
        table.push((
            name.to_string(),
            Param {
                value: ParamValue::BigInt(BigUint::from(v)),
                owner,
            },
        ));
    };

    push_int(&mut table, names::PROPOSER_PERCENTAGE_OF_FEES, 10);
    push_big(&mut table, names::MESSAGE_SEND_FEE, 10000);
    push_big(&mut table, names::MESSAGE_CHANGE_PARAMETER_FEE, 10000);

    for kind in ActorKind::ALL {
        push_big(&mut table, kind.minimum_stake_param(), 15000000000);
        if let Some(max_chains) = kind.max_chains_param() {
            push_int(&mut table, max_chains, 15);
        }
        push_int(&mut table, kind.unstaking_blocks_param(), 2016);
        push_int(&mut table, kind.minimum_pause_blocks_param(), 4);
        push_int(&mut table, kind.max_pause_blocks_param(), 672);

        use crate::actor::StakingMessageKind::*;
        for message in [Stake, EditStake, Unstake, Pause, Unpause] {
            push_big(&mut table, kind.message_fee_param(message), 10000);
        }
    }

    table
}

/// Seed a context with default parameters plus the document content
pub fn seed_with_defaults(
    ctx: &mut PersistenceRwContext,
    genesis: &GenesisState,
    params_owner: Address,
) -> CoreResult<()> {
    for (name, param) in default_params(params_owner) {
        ctx.set_param(&name, param)?;
    }
    genesis.seed(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::GovParams;

    const DOC: &str = r#"{
        "accounts": [
            {"address": "0101010101010101010101010101010101010101", "amount": "1000000"}
        ],
        "validators": [
            {
                "address": "0202020202020202020202020202020202020202",
                "public_key": "0303030303030303030303030303030303030303030303030303030303030303",
                "staked_amount": "15000000000",
                "output_address": "0202020202020202020202020202020202020202"
            }
        ],
        "params": [
            {"name": "proposer_percentage_of_fees", "type": "int", "value": 25,
             "owner": "0404040404040404040404040404040404040404"}
        ]
    }"#;

    #[test]
    fn test_parse_and_seed() {
        let genesis = GenesisState::from_json(DOC).unwrap();
        let mut ctx = PersistenceRwContext::new();
        genesis.seed(&mut ctx).unwrap();

        let balance = ctx.account_balance(&[1u8; 20]).unwrap();
        assert_eq!(balance, BigUint::from(1000000u64));

        let validator = ctx
            .get_actor(ActorKind::Validator, &[2u8; 20])
            .unwrap()
            .unwrap();
        assert_eq!(validator.status, ActorStatus::Staked);
        assert_eq!(validator.staked_amount, BigUint::from(15000000000u64));

        let params = GovParams::new(&ctx);
        assert_eq!(params.int(names::PROPOSER_PERCENTAGE_OF_FEES).unwrap(), 25);
        assert_eq!(
            params.owner(names::PROPOSER_PERCENTAGE_OF_FEES).unwrap(),
            [4u8; 20]
        );
    }

    #[test]
    fn test_defaults_cover_every_kind() {
        let mut ctx = PersistenceRwContext::new();
        for (name, param) in default_params([9u8; 20]) {
            ctx.set_param(&name, param).unwrap();
        }
        let params = GovParams::new(&ctx);
        for kind in ActorKind::ALL {
            assert_eq!(
                params.big_int(kind.minimum_stake_param()).unwrap(),
                BigUint::from(15000000000u64)
            );
            assert_eq!(params.int(kind.unstaking_blocks_param()).unwrap(), 2016);
        }
        // Validators have no chain limit, so no parameter is registered
        assert!(ctx.get_param("validator_max_chains").unwrap().is_none());
    }

    #[test]
    fn test_rejects_bad_documents() {
        assert!(GenesisState::from_json("not json").is_err());

        let bad_address = r#"{"accounts": [{"address": "xyz", "amount": "1"}]}"#;
        let genesis = GenesisState::from_json(bad_address).unwrap();
        let mut ctx = PersistenceRwContext::new();
        assert!(genesis.seed(&mut ctx).is_err());
    }
}
