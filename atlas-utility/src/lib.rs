//! Atlas utility layer: transactions, execution and the block unit of work
//!
//! This crate turns raw transaction bytes into state transitions. The
//! [`UnitOfWork`] drives a block through staging, application and commit;
//! the executor applies one validated message at a time; the fee module
//! splits each block's fee pool between the proposer and the burn.

pub mod executor;
pub mod fees;
pub mod transaction;
pub mod unit_of_work;

pub use executor::execute_transaction;
pub use fees::{distribute, split_fee_pool};
pub use transaction::{Message, Transaction};
pub use unit_of_work::{ProposalBlock, ProposalHashCheck, UnitOfWork, UowState};
