//! The persistence read-write context
//!
//! One context is one transactional view of the world state. The full
//! logical keyspace is resident in an ordered map; mutations are visible to
//! later reads in the same context and reach the storage backend only on
//! `commit`. Savepoints record undo entries per write, so rolling back a
//! failed block replays a bounded log instead of copying the keyspace.

use std::collections::{BTreeMap, BTreeSet};

use atlas_common::prelude::*;
use num_bigint::BigUint;
use num_traits::Zero;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::account::Account;
use crate::actor::{Actor, ActorKind};
use crate::keys;
use crate::params::Param;
use crate::store::{ScanDirection, StorageBackend};

/// Opaque savepoint handle. Rolling back to a handle restores the context
/// to its state when the handle was taken; handles above it are discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavePoint {
    id: u64,
    label: String,
}

impl SavePoint {
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// One undo record: the logical value a key held before a write
struct UndoRecord {
    key: Vec<u8>,
    previous: Option<Vec<u8>>,
}

struct SavePointFrame {
    id: u64,
    label: String,
    undo: Vec<UndoRecord>,
}

/// Transactional, checkpointable view of the world state
pub struct PersistenceRwContext {
    /// Logical keyspace; `BTreeMap` ordering drives the state hash
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
    /// Keys whose logical value may differ from the backend
    dirty: BTreeSet<Vec<u8>>,
    /// Open savepoints, oldest first
    frames: Vec<SavePointFrame>,
    next_savepoint_id: u64,
}

impl PersistenceRwContext {
    /// An empty context, to be seeded from genesis
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            dirty: BTreeSet::new(),
            frames: Vec::new(),
            next_savepoint_id: 0,
        }
    }

    /// Load the full keyspace from a backend snapshot
    pub async fn load(backend: &dyn StorageBackend) -> CoreResult<Self> {
        let pairs = backend.scan_prefix(&[], ScanDirection::Ascending).await?;
        let mut entries = BTreeMap::new();
        for (key, value) in pairs {
            entries.insert(key, value);
        }
        debug!(entries = entries.len(), "loaded persistence context");
        Ok(Self {
            entries,
            dirty: BTreeSet::new(),
            frames: Vec::new(),
            next_savepoint_id: 0,
        })
    }

    // ---- raw keyspace operations ----

    pub(crate) fn get_raw(&self, key: &[u8]) -> Option<&Vec<u8>> {
        self.entries.get(key)
    }

    pub(crate) fn set_raw(&mut self, key: Vec<u8>, value: Vec<u8>) {
        let previous = self.entries.insert(key.clone(), value);
        self.record_undo(key.clone(), previous);
        self.dirty.insert(key);
    }

    pub(crate) fn delete_raw(&mut self, key: &[u8]) {
        let previous = self.entries.remove(key);
        if previous.is_some() {
            self.record_undo(key.to_vec(), previous);
        }
        self.dirty.insert(key.to_vec());
    }

    fn record_undo(&mut self, key: Vec<u8>, previous: Option<Vec<u8>>) {
        if let Some(frame) = self.frames.last_mut() {
            frame.undo.push(UndoRecord { key, previous });
        }
    }

    // ---- savepoints ----

    /// Take a savepoint. O(1): no keyspace copy, only a new undo frame.
    pub fn new_save_point(&mut self, label: impl Into<String>) -> SavePoint {
        let id = self.next_savepoint_id;
        self.next_savepoint_id += 1;
        let label = label.into();
        self.frames.push(SavePointFrame {
            id,
            label: label.clone(),
            undo: Vec::new(),
        });
        SavePoint { id, label }
    }

    /// Discard all writes made since `save_point` was taken. Fails with
    /// `NotFound` if the handle is unknown or already superseded; invoking
    /// it again at the same marker is a no-op.
    pub fn rollback_to_save_point(&mut self, save_point: &SavePoint) -> CoreResult<()> {
        let index = self
            .frames
            .iter()
            .position(|frame| frame.id == save_point.id)
            .ok_or_else(|| {
                CoreError::not_found(format!(
                    "savepoint {:?} is unknown or superseded",
                    save_point.label
                ))
            })?;

        let mut undone = 0usize;
        while self.frames.len() > index {
            let mut frame = self
                .frames
                .pop()
                .ok_or_else(|| CoreError::internal("savepoint stack underflow"))?;
            for record in frame.undo.drain(..).rev() {
                match record.previous {
                    Some(value) => self.entries.insert(record.key.clone(), value),
                    None => self.entries.remove(&record.key),
                };
                self.dirty.insert(record.key);
                undone += 1;
            }
        }

        // Reopen the marker so the handle stays valid and a repeated
        // rollback to it is idempotent.
        self.frames.push(SavePointFrame {
            id: save_point.id,
            label: save_point.label.clone(),
            undo: Vec::new(),
        });

        debug!(label = %save_point.label, undone, "rolled back to savepoint");
        Ok(())
    }

    // ---- state hash ----

    /// Deterministic digest over the full ordered keyspace. Pure function
    /// of logical content: write order and map internals never affect it.
    pub fn compute_state_hash(&self) -> Hash {
        let mut hasher = Sha256::new();
        for (key, value) in &self.entries {
            hasher.update((key.len() as u32).to_be_bytes());
            hasher.update(key);
            hasher.update((value.len() as u32).to_be_bytes());
            hasher.update(value);
        }
        hasher.finalize().into()
    }

    // ---- commit ----

    /// Persist accumulated writes to the backend and release savepoint
    /// history. The only suspension point in the core.
    pub async fn commit(&mut self, backend: &dyn StorageBackend) -> CoreResult<()> {
        let dirty = std::mem::take(&mut self.dirty);
        let written = dirty.len();
        for key in dirty {
            match self.entries.get(&key) {
                Some(value) => backend.set(&key, value).await?,
                None => backend.delete(&key).await?,
            }
        }
        self.frames.clear();
        debug!(written, "committed persistence context");
        Ok(())
    }

    // ---- typed accessors ----

    /// Account lookup; `None` when the account does not exist
    pub fn get_account(&self, address: &Address) -> CoreResult<Option<Account>> {
        self.get_raw(&keys::account_key(address))
            .map(|bytes| Account::decode(bytes))
            .transpose()
    }

    /// Balance lookup treating a missing account as zero
    pub fn account_balance(&self, address: &Address) -> CoreResult<BigUint> {
        Ok(self
            .get_account(address)?
            .map(|a| a.balance)
            .unwrap_or_else(BigUint::zero))
    }

    /// Next expected transaction nonce, treating a missing account as zero
    pub fn account_nonce(&self, address: &Address) -> CoreResult<u64> {
        Ok(self.get_account(address)?.map(|a| a.nonce).unwrap_or(0))
    }

    pub fn set_account(&mut self, account: &Account) -> CoreResult<()> {
        let bytes = account.encode()?;
        self.set_raw(keys::account_key(&account.address), bytes);
        Ok(())
    }

    /// Actor lookup by kind and address
    pub fn get_actor(&self, kind: ActorKind, address: &Address) -> CoreResult<Option<Actor>> {
        self.get_raw(&keys::actor_key(kind, address))
            .map(|bytes| Actor::decode(bytes))
            .transpose()
    }

    pub fn set_actor(&mut self, actor: &Actor) -> CoreResult<()> {
        let bytes = actor.encode()?;
        self.set_raw(keys::actor_key(actor.kind, &actor.address), bytes);
        Ok(())
    }

    /// Every actor of one kind, in address order
    pub fn actors_by_kind(&self, kind: ActorKind) -> CoreResult<Vec<Actor>> {
        let prefix = keys::actor_kind_prefix(kind);
        let mut actors = Vec::new();
        for (key, value) in self.entries.range(prefix.clone()..) {
            if !key.starts_with(&prefix) {
                break;
            }
            actors.push(Actor::decode(value)?);
        }
        Ok(actors)
    }

    /// Governance parameter lookup
    pub fn get_param(&self, name: &str) -> CoreResult<Option<Param>> {
        self.get_raw(&keys::param_key(name))
            .map(|bytes| Param::decode(bytes))
            .transpose()
    }

    pub fn set_param(&mut self, name: &str, param: Param) -> CoreResult<()> {
        let bytes = param.encode()?;
        self.set_raw(keys::param_key(name), bytes);
        Ok(())
    }

    /// Sum of every account balance; used by conservation checks
    pub fn total_account_balance(&self) -> CoreResult<BigUint> {
        let mut total = BigUint::zero();
        for (key, value) in self.entries.range(keys::ACCOUNT_PREFIX.to_vec()..) {
            if !key.starts_with(keys::ACCOUNT_PREFIX) {
                break;
            }
            total += Account::decode(value)?.balance;
        }
        Ok(total)
    }
}

impl Default for PersistenceRwContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBackend;

    fn account(n: u8, balance: u64) -> Account {
        Account::new([n; 20], BigUint::from(balance))
    }

    #[test]
    fn test_reads_see_writes_in_same_context() {
        let mut ctx = PersistenceRwContext::new();
        ctx.set_account(&account(1, 500)).unwrap();
        let loaded = ctx.get_account(&[1u8; 20]).unwrap().unwrap();
        assert_eq!(loaded.balance, BigUint::from(500u64));
        assert_eq!(ctx.get_account(&[2u8; 20]).unwrap(), None);
    }

    #[test]
    fn test_rollback_law() {
        let mut ctx = PersistenceRwContext::new();
        ctx.set_account(&account(1, 500)).unwrap();
        let h0 = ctx.compute_state_hash();

        let sp = ctx.new_save_point("block");
        ctx.set_account(&account(1, 9)).unwrap();
        ctx.set_account(&account(2, 100)).unwrap();
        assert_ne!(ctx.compute_state_hash(), h0);

        ctx.rollback_to_save_point(&sp).unwrap();
        assert_eq!(ctx.compute_state_hash(), h0);

        // Idempotent at the marker
        ctx.rollback_to_save_point(&sp).unwrap();
        assert_eq!(ctx.compute_state_hash(), h0);
    }

    #[test]
    fn test_rollback_discards_nested_savepoints() {
        let mut ctx = PersistenceRwContext::new();
        let outer = ctx.new_save_point("outer");
        ctx.set_account(&account(1, 1)).unwrap();
        let inner = ctx.new_save_point("inner");
        ctx.set_account(&account(2, 2)).unwrap();

        ctx.rollback_to_save_point(&outer).unwrap();
        assert_eq!(ctx.get_account(&[1u8; 20]).unwrap(), None);
        assert_eq!(ctx.get_account(&[2u8; 20]).unwrap(), None);

        // The inner handle was superseded by the rollback
        assert!(matches!(
            ctx.rollback_to_save_point(&inner),
            Err(CoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_rollback_restores_deletes() {
        let mut ctx = PersistenceRwContext::new();
        ctx.set_account(&account(3, 30)).unwrap();
        let h0 = ctx.compute_state_hash();

        let sp = ctx.new_save_point("sp");
        ctx.delete_raw(&keys::account_key(&[3u8; 20]));
        assert_eq!(ctx.get_account(&[3u8; 20]).unwrap(), None);

        ctx.rollback_to_save_point(&sp).unwrap();
        assert_eq!(ctx.compute_state_hash(), h0);
    }

    #[test]
    fn test_hash_independent_of_write_order() {
        let mut a = PersistenceRwContext::new();
        a.set_account(&account(1, 10)).unwrap();
        a.set_account(&account(2, 20)).unwrap();

        let mut b = PersistenceRwContext::new();
        b.set_account(&account(2, 20)).unwrap();
        b.set_account(&account(1, 10)).unwrap();

        assert_eq!(a.compute_state_hash(), b.compute_state_hash());
    }

    #[test]
    fn test_zero_balance_differs_from_absence() {
        let mut with_zero = PersistenceRwContext::new();
        with_zero.set_account(&account(1, 0)).unwrap();
        let empty = PersistenceRwContext::new();
        assert_ne!(with_zero.compute_state_hash(), empty.compute_state_hash());
    }

    #[tokio::test]
    async fn test_commit_then_reload() {
        let backend = MemoryBackend::new();
        let mut ctx = PersistenceRwContext::new();
        ctx.set_account(&account(1, 77)).unwrap();
        let hash = ctx.compute_state_hash();
        ctx.commit(&backend).await.unwrap();

        let reloaded = PersistenceRwContext::load(&backend).await.unwrap();
        assert_eq!(reloaded.compute_state_hash(), hash);
        assert_eq!(
            reloaded.get_account(&[1u8; 20]).unwrap().unwrap().balance,
            BigUint::from(77u64)
        );
    }

    #[tokio::test]
    async fn test_uncommitted_writes_invisible_to_backend() {
        let backend = MemoryBackend::new();
        let mut ctx = PersistenceRwContext::load(&backend).await.unwrap();
        ctx.set_account(&account(1, 77)).unwrap();

        let other = PersistenceRwContext::load(&backend).await.unwrap();
        assert_eq!(other.get_account(&[1u8; 20]).unwrap(), None);
    }

    #[tokio::test]
    async fn test_commit_persists_deletes() {
        let backend = MemoryBackend::new();
        let mut ctx = PersistenceRwContext::new();
        ctx.set_account(&account(4, 40)).unwrap();
        ctx.commit(&backend).await.unwrap();

        ctx.delete_raw(&keys::account_key(&[4u8; 20]));
        ctx.commit(&backend).await.unwrap();

        let reloaded = PersistenceRwContext::load(&backend).await.unwrap();
        assert_eq!(reloaded.get_account(&[4u8; 20]).unwrap(), None);
    }
}
