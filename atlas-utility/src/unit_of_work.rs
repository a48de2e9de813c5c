//! The block unit of work
//!
//! One `UnitOfWork` owns one block's apply/rollback lifecycle over its own
//! persistence context. A proposal is staged with `set_proposal_block` and
//! consumed by exactly one `apply_block` call, which either transitions the
//! whole block's effects into the context and returns the new state hash,
//! or rolls back to the pre-block savepoint and reports the first error.
//! Transactions run strictly in staged order; later transactions observe
//! earlier ones' effects.

use atlas_common::prelude::*;
use atlas_persistence::{ActorStatus, GovParams, PersistenceRwContext, StorageBackend};
use num_bigint::BigUint;
use num_traits::Zero;
use tracing::{info, warn};

use crate::executor::execute_transaction;
use crate::fees;

/// Whether `set_proposal_block` should verify the staged block's hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalHashCheck {
    /// Accept the proposal without a hash comparison
    Ignore,
    /// Require the staged content to hash to this value
    Require(Hash),
}

/// A staged block proposal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalBlock {
    pub proposer: Address,
    pub transactions: Vec<Vec<u8>>,
}

impl ProposalBlock {
    /// Digest of the proposal content: proposer plus transaction bytes
    pub fn content_hash(&self) -> Hash {
        let mut chunks: Vec<&[u8]> = vec![&self.proposer];
        for tx in &self.transactions {
            chunks.push(tx);
        }
        CryptoUtils::hash_multiple(&chunks)
    }
}

/// Lifecycle of a unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UowState {
    /// Initial state, and re-entered after a rollback once restaged
    Idle,
    ProposalStaged,
    Applying,
    /// Terminal success for this block
    Applied,
    /// Terminal failure for this attempt; restaging returns to work
    RolledBack,
}

/// Orchestrates one block's application against one persistence context
pub struct UnitOfWork {
    ctx: PersistenceRwContext,
    height: BlockHeight,
    proposal: Option<ProposalBlock>,
    state: UowState,
    state_hash: Option<Hash>,
}

impl UnitOfWork {
    /// A unit of work applying the block at `height` over `ctx`
    pub fn new(ctx: PersistenceRwContext, height: BlockHeight) -> Self {
        Self {
            ctx,
            height,
            proposal: None,
            state: UowState::Idle,
            state_hash: None,
        }
    }

    pub fn height(&self) -> BlockHeight {
        self.height
    }

    pub fn state(&self) -> UowState {
        self.state
    }

    /// Read access to the underlying context (queries, tests)
    pub fn context(&self) -> &PersistenceRwContext {
        &self.ctx
    }

    /// Consume the unit of work, releasing its context for the next block
    pub fn into_context(self) -> PersistenceRwContext {
        self.ctx
    }

    /// Stage a proposal. Staging is atomic: a rejected proposal leaves any
    /// previously staged block untouched; an accepted one overwrites it.
    pub fn set_proposal_block(
        &mut self,
        check: ProposalHashCheck,
        proposer: Address,
        transactions: Vec<Vec<u8>>,
    ) -> CoreResult<()> {
        if transactions.is_empty() {
            return Err(CoreError::invalid_proposal("empty transaction list"));
        }
        if AddressExt::is_zero(&proposer) {
            return Err(CoreError::invalid_proposal("malformed proposer address"));
        }

        let proposal = ProposalBlock {
            proposer,
            transactions,
        };
        if let ProposalHashCheck::Require(expected) = check {
            let actual = proposal.content_hash();
            if actual != expected {
                return Err(CoreError::invalid_proposal(format!(
                    "content hash mismatch: expected {}, got {}",
                    CryptoUtils::hash_to_hex(&expected),
                    CryptoUtils::hash_to_hex(&actual)
                )));
            }
        }

        self.proposal = Some(proposal);
        self.state = UowState::ProposalStaged;
        Ok(())
    }

    /// Apply the staged block: begin-block hooks, sequential transaction
    /// execution, end-block fee distribution and unbonding, then the new
    /// state hash. Any error rolls the context back to the pre-block
    /// savepoint and surfaces unswallowed.
    pub fn apply_block(&mut self) -> CoreResult<Hash> {
        if self.state != UowState::ProposalStaged {
            return Err(CoreError::ProposalNotSet);
        }
        let proposal = self.proposal.take().ok_or(CoreError::ProposalNotSet)?;

        self.state = UowState::Applying;
        let save_point = self.ctx.new_save_point(format!("block-{}", self.height));

        match self.apply_block_inner(&proposal) {
            Ok(hash) => {
                self.state = UowState::Applied;
                self.state_hash = Some(hash);
                info!(
                    height = self.height,
                    transactions = proposal.transactions.len(),
                    hash = %CryptoUtils::hash_to_hex(&hash),
                    "applied block"
                );
                Ok(hash)
            }
            Err(err) => {
                warn!(height = self.height, error = %err, "block application failed, rolling back");
                self.ctx.rollback_to_save_point(&save_point)?;
                self.state = UowState::RolledBack;
                Err(err)
            }
        }
    }

    fn apply_block_inner(&mut self, proposal: &ProposalBlock) -> CoreResult<Hash> {
        self.begin_block()?;

        let mut fee_pool = BigUint::zero();
        for raw in &proposal.transactions {
            execute_transaction(&mut self.ctx, self.height, raw, &mut fee_pool)?;
        }

        self.end_block(&proposal.proposer, &fee_pool)?;
        Ok(self.ctx.compute_state_hash())
    }

    /// Pre-transaction bookkeeping: actors paused past the per-kind
    /// maximum pause window begin unstaking.
    fn begin_block(&mut self) -> CoreResult<()> {
        for kind in atlas_persistence::ActorKind::ALL {
            let (max_pause, unstaking_blocks) = {
                let params = GovParams::new(&self.ctx);
                (
                    params.int(kind.max_pause_blocks_param())?,
                    params.int(kind.unstaking_blocks_param())?,
                )
            };

            for mut actor in self.ctx.actors_by_kind(kind)? {
                if actor.status != ActorStatus::Staked {
                    continue;
                }
                if let Some(paused_height) = actor.paused_height {
                    if self.height > paused_height + max_pause {
                        actor.status = ActorStatus::Unstaking;
                        actor.unstaking_height = Some(self.height + unstaking_blocks);
                        info!(
                            kind = kind.name(),
                            address = %CryptoUtils::address_to_hex(&actor.address),
                            "max pause exceeded, began unstaking"
                        );
                        self.ctx.set_actor(&actor)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Post-transaction bookkeeping: distribute the fee pool and mature
    /// any unbonding actor whose waiting period elapsed.
    fn end_block(&mut self, proposer: &Address, fee_pool: &BigUint) -> CoreResult<()> {
        fees::distribute(&mut self.ctx, proposer, fee_pool)?;
        self.unstake_matured_actors()
    }

    fn unstake_matured_actors(&mut self) -> CoreResult<()> {
        for kind in atlas_persistence::ActorKind::ALL {
            for mut actor in self.ctx.actors_by_kind(kind)? {
                if actor.status != ActorStatus::Unstaking {
                    continue;
                }
                let ready = actor
                    .unstaking_height
                    .map(|h| h <= self.height)
                    .unwrap_or(false);
                if !ready {
                    continue;
                }

                let stake = std::mem::take(&mut actor.staked_amount);
                let output = actor.output_address;
                actor.status = ActorStatus::Unstaked;
                actor.unstaking_height = None;
                self.ctx.set_actor(&actor)?;

                let mut account = self
                    .ctx
                    .get_account(&output)?
                    .unwrap_or_else(|| atlas_persistence::Account::empty(output));
                account.balance += stake;
                self.ctx.set_account(&account)?;
                info!(
                    kind = kind.name(),
                    address = %CryptoUtils::address_to_hex(&actor.address),
                    "unbonding matured, stake returned"
                );
            }
        }
        Ok(())
    }

    /// The last computed state hash; `None` before the first successful
    /// `apply_block`
    pub fn state_hash(&self) -> Option<Hash> {
        self.state_hash
    }

    /// Persist the applied block's effects to the backend
    pub async fn commit(&mut self, backend: &dyn StorageBackend) -> CoreResult<()> {
        if self.state != UowState::Applied {
            return Err(CoreError::validation(
                "commit requires a successfully applied block",
            ));
        }
        self.ctx.commit(backend).await
    }
}
