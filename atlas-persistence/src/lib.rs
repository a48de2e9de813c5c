//! # Atlas Persistence
//!
//! World-state management for the Atlas state-transition core.
//!
//! ## Architecture Overview
//!
//! ### [`PersistenceRwContext`] - Transactional State View
//! - Full logical keyspace resident in an ordered map
//! - Savepoint/rollback via per-write undo records (no keyspace copies)
//! - Deterministic SHA-256 state hash over the sorted keyspace
//! - Writes reach the backend only on `commit`
//!
//! ### [`StorageBackend`] - Storage Collaborator Contract
//! - Byte-string key-value store with ordered prefix scans
//! - [`RocksBackend`] for production, [`MemoryBackend`] for tests and
//!   speculative validation
//! - Failures surface as `StorageUnavailable`, never retried here
//!
//! ### World-State Entities
//! - [`Account`]: address plus arbitrary-precision balance
//! - [`Actor`]: staked participant (validator, application, fisherman,
//!   service node) with a shared record shape and per-kind parameter rules
//! - [`Param`]/[`GovParams`]: owner-controlled governance parameters with a
//!   typed read path
//!
//! ### Genesis
//! - JSON document seeding accounts, actors and the parameter table once

pub mod account;
pub mod actor;
pub mod context;
pub mod genesis;
pub mod keys;
pub mod params;
pub mod store;

pub use account::Account;
pub use actor::{Actor, ActorKind, ActorStatus, StakingMessageKind};
pub use context::{PersistenceRwContext, SavePoint};
pub use genesis::{default_params, seed_with_defaults, GenesisState};
pub use params::{GovParams, Param, ParamValue};
pub use store::{MemoryBackend, RocksBackend, ScanDirection, StorageBackend};
