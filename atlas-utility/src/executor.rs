//! Transaction execution
//!
//! The executor validates one raw transaction and applies its message to
//! the context: decode, signature check, nonce check, fee and balance
//! checks, the message-specific mutation, then the fee debit into the
//! block's fee pool. The message effect runs inside a per-transaction
//! savepoint, so a rejected transaction never leaves a partial debit or
//! credit behind. Each applied transaction advances its signer's nonce,
//! so the same signed bytes can never apply twice.

use atlas_common::{amount, prelude::*};
use atlas_persistence::{
    Account, Actor, ActorKind, ActorStatus, GovParams, Param, ParamValue, PersistenceRwContext,
};
use num_bigint::BigUint;
use num_traits::Zero;
use tracing::debug;

use crate::transaction::{Message, Transaction};

/// Validate and apply one raw transaction at `height`, accruing its fee
/// into `fee_pool`. Returns the transaction hash on success.
pub fn execute_transaction(
    ctx: &mut PersistenceRwContext,
    height: BlockHeight,
    raw: &[u8],
    fee_pool: &mut BigUint,
) -> CoreResult<Hash> {
    let tx = Transaction::from_bytes(raw)?;
    tx.verify()?;

    let signer = tx.signer_address();
    let tx_hash = tx.hash()?;

    // Replay protection: the nonce must be exactly the signer's next one
    let expected_nonce = ctx.account_nonce(&signer)?;
    if tx.nonce != expected_nonce {
        return Err(CoreError::validation(format!(
            "invalid nonce for {}: expected {}, got {}",
            CryptoUtils::address_to_hex(&signer),
            expected_nonce,
            tx.nonce
        )));
    }

    // Fee and balance checks read state before any mutation
    {
        let params = GovParams::new(ctx);
        let minimum_fee = params.big_int(tx.message.fee_param())?;
        if tx.fee < minimum_fee {
            return Err(CoreError::validation(format!(
                "fee {} below minimum {} for {}",
                tx.fee,
                minimum_fee,
                tx.message.name()
            )));
        }
    }

    let balance = ctx.account_balance(&signer)?;
    let value_moved = tx
        .message
        .value_moved()
        .cloned()
        .unwrap_or_else(BigUint::zero);
    let needed = &value_moved + &tx.fee;
    if balance < needed {
        return Err(CoreError::InsufficientFunds {
            address: CryptoUtils::address_to_hex(&signer),
            needed: amount::amount_to_string(&needed),
            available: amount::amount_to_string(&balance),
        });
    }

    // The message effect is multi-step; wrap it so a late failure undoes
    // the earlier steps of this transaction only.
    let save_point = ctx.new_save_point(format!("tx-{}", hex::encode(&tx_hash[..8])));
    let result = apply_message(ctx, height, &signer, &tx).and_then(|_| {
        debit(ctx, &signer, &tx.fee)?;
        advance_nonce(ctx, &signer)?;
        *fee_pool += &tx.fee;
        Ok(())
    });

    if let Err(err) = result {
        ctx.rollback_to_save_point(&save_point)?;
        return Err(err);
    }

    debug!(
        tx = %hex::encode(&tx_hash[..8]),
        message = tx.message.name(),
        "executed transaction"
    );
    Ok(tx_hash)
}

fn apply_message(
    ctx: &mut PersistenceRwContext,
    height: BlockHeight,
    signer: &Address,
    tx: &Transaction,
) -> CoreResult<()> {
    match &tx.message {
        Message::Send { to, amount } => send(ctx, signer, to, amount),
        Message::Stake {
            kind,
            amount,
            chains,
            output_address,
        } => stake(ctx, signer, &tx.public_key, *kind, amount, chains, output_address),
        Message::EditStake {
            kind,
            amount,
            chains,
        } => edit_stake(ctx, signer, *kind, amount, chains),
        Message::Unstake { kind } => unstake(ctx, height, signer, *kind),
        Message::Pause { kind } => pause(ctx, height, signer, *kind),
        Message::Unpause { kind } => unpause(ctx, height, signer, *kind),
        Message::ChangeParameter { name, value } => change_parameter(ctx, signer, name, value),
    }
}

fn debit(ctx: &mut PersistenceRwContext, address: &Address, amount: &BigUint) -> CoreResult<()> {
    let mut account = ctx.get_account(address)?.ok_or_else(|| {
        CoreError::InsufficientFunds {
            address: CryptoUtils::address_to_hex(address),
            needed: amount::amount_to_string(amount),
            available: "0".to_string(),
        }
    })?;
    if account.balance < *amount {
        return Err(CoreError::InsufficientFunds {
            address: CryptoUtils::address_to_hex(address),
            needed: amount::amount_to_string(amount),
            available: amount::amount_to_string(&account.balance),
        });
    }
    account.balance -= amount;
    ctx.set_account(&account)
}

fn advance_nonce(ctx: &mut PersistenceRwContext, address: &Address) -> CoreResult<()> {
    let mut account = ctx
        .get_account(address)?
        .ok_or_else(|| CoreError::internal("signer account missing after fee debit"))?;
    account.nonce += 1;
    ctx.set_account(&account)
}

fn credit(ctx: &mut PersistenceRwContext, address: &Address, amount: &BigUint) -> CoreResult<()> {
    let mut account = ctx
        .get_account(address)?
        .unwrap_or_else(|| Account::empty(*address));
    account.balance += amount;
    ctx.set_account(&account)
}

fn send(
    ctx: &mut PersistenceRwContext,
    signer: &Address,
    to: &Address,
    amount: &BigUint,
) -> CoreResult<()> {
    debit(ctx, signer, amount)?;
    credit(ctx, to, amount)
}

#[allow(clippy::too_many_arguments)]
fn stake(
    ctx: &mut PersistenceRwContext,
    signer: &Address,
    public_key: &PublicKey,
    kind: ActorKind,
    amount: &BigUint,
    chains: &[String],
    output_address: &Address,
) -> CoreResult<()> {
    if ctx.get_actor(kind, signer)?.is_some() {
        return Err(CoreError::validation(format!(
            "{} already staked: {}",
            kind.name(),
            CryptoUtils::address_to_hex(signer)
        )));
    }

    check_stake_rules(ctx, kind, amount, chains)?;
    debit(ctx, signer, amount)?;
    ctx.set_actor(&Actor {
        kind,
        address: *signer,
        public_key: *public_key,
        staked_amount: amount.clone(),
        chains: chains.to_vec(),
        status: ActorStatus::Staked,
        paused_height: None,
        unstaking_height: None,
        output_address: *output_address,
    })
}

fn edit_stake(
    ctx: &mut PersistenceRwContext,
    signer: &Address,
    kind: ActorKind,
    amount: &BigUint,
    chains: &[String],
) -> CoreResult<()> {
    let mut actor = staked_actor(ctx, kind, signer)?;

    // Stake may only grow; the difference comes out of the signer account
    if *amount < actor.staked_amount {
        return Err(CoreError::validation(format!(
            "stake may not decrease: {} < {}",
            amount, actor.staked_amount
        )));
    }
    check_stake_rules(ctx, kind, amount, chains)?;

    let difference = amount - &actor.staked_amount;
    if !difference.is_zero() {
        debit(ctx, signer, &difference)?;
    }
    actor.staked_amount = amount.clone();
    actor.chains = chains.to_vec();
    ctx.set_actor(&actor)
}

fn check_stake_rules(
    ctx: &PersistenceRwContext,
    kind: ActorKind,
    amount: &BigUint,
    chains: &[String],
) -> CoreResult<()> {
    let params = GovParams::new(ctx);
    let minimum_stake = params.big_int(kind.minimum_stake_param())?;
    if *amount < minimum_stake {
        return Err(CoreError::validation(format!(
            "stake {} below {} minimum {}",
            amount,
            kind.name(),
            minimum_stake
        )));
    }
    match kind.max_chains_param() {
        Some(param) => {
            let max_chains = params.int(param)?;
            if chains.len() as u64 > max_chains {
                return Err(CoreError::validation(format!(
                    "{} chains exceed {} maximum {}",
                    chains.len(),
                    kind.name(),
                    max_chains
                )));
            }
        }
        None => {
            if !chains.is_empty() {
                return Err(CoreError::validation(format!(
                    "{} does not service chains",
                    kind.name()
                )));
            }
        }
    }
    Ok(())
}

fn unstake(
    ctx: &mut PersistenceRwContext,
    height: BlockHeight,
    signer: &Address,
    kind: ActorKind,
) -> CoreResult<()> {
    let mut actor = staked_actor(ctx, kind, signer)?;
    let unstaking_blocks = GovParams::new(ctx).int(kind.unstaking_blocks_param())?;
    actor.status = ActorStatus::Unstaking;
    actor.unstaking_height = Some(height + unstaking_blocks);
    ctx.set_actor(&actor)
}

fn pause(
    ctx: &mut PersistenceRwContext,
    height: BlockHeight,
    signer: &Address,
    kind: ActorKind,
) -> CoreResult<()> {
    let mut actor = staked_actor(ctx, kind, signer)?;
    if actor.is_paused() {
        return Err(CoreError::validation(format!(
            "{} already paused",
            kind.name()
        )));
    }
    actor.paused_height = Some(height);
    ctx.set_actor(&actor)
}

fn unpause(
    ctx: &mut PersistenceRwContext,
    height: BlockHeight,
    signer: &Address,
    kind: ActorKind,
) -> CoreResult<()> {
    let mut actor = staked_actor(ctx, kind, signer)?;
    let paused_height = actor.paused_height.ok_or_else(|| {
        CoreError::validation(format!("{} is not paused", kind.name()))
    })?;
    let minimum_pause = GovParams::new(ctx).int(kind.minimum_pause_blocks_param())?;
    if height < paused_height + minimum_pause {
        return Err(CoreError::validation(format!(
            "must stay paused until height {}, current {}",
            paused_height + minimum_pause,
            height
        )));
    }
    actor.paused_height = None;
    ctx.set_actor(&actor)
}

fn change_parameter(
    ctx: &mut PersistenceRwContext,
    signer: &Address,
    name: &str,
    value: &ParamValue,
) -> CoreResult<()> {
    let current = ctx
        .get_param(name)?
        .ok_or_else(|| CoreError::ParameterNotFound(name.to_string()))?;

    if current.owner != *signer {
        return Err(CoreError::unauthorized(format!(
            "{} is not the owner of parameter {}",
            CryptoUtils::address_to_hex(signer),
            name
        )));
    }
    if !current.value.same_type(value) {
        return Err(CoreError::TypeMismatch {
            name: name.to_string(),
            expected: current.value.type_name(),
        });
    }

    ctx.set_param(
        name,
        Param {
            value: value.clone(),
            owner: current.owner,
        },
    )
}

/// Fetch the signer's actor record, requiring `Staked` status. The signer
/// is the only address allowed to operate its own actor.
fn staked_actor(
    ctx: &PersistenceRwContext,
    kind: ActorKind,
    signer: &Address,
) -> CoreResult<Actor> {
    let actor = ctx.get_actor(kind, signer)?.ok_or_else(|| {
        CoreError::not_found(format!(
            "no {} staked at {}",
            kind.name(),
            CryptoUtils::address_to_hex(signer)
        ))
    })?;
    if actor.status != ActorStatus::Staked {
        return Err(CoreError::validation(format!(
            "{} is not in staked status",
            kind.name()
        )));
    }
    Ok(actor)
}
