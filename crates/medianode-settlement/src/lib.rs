//! # medianode-settlement
//!
//! **Settlement plane**: the per-block hook that turns prepaid lease escrow
//! into owner income and returns deposits of closed nodes.
//!
//! ## Architecture
//!
//! [`SettlementEngine::begin_block`] runs once per block and:
//! 1. Guards against settling the same height twice
//! 2. **Phase A**: settles whole accrued hours of every lease, in key order
//! 3. **Phase B**: releases deposits of closed resources past their lock
//! 4. Returns a [`SettlementReport`] with counts and isolated failures
//!
//! ## Fault Isolation
//!
//! Each lease and each release runs in its own keeper branch. A failing
//! record is rolled back, logged, evented, reported and retried next block;
//! it never blocks the records after it and never aborts the block.

pub mod engine;
pub mod release_lock;
pub mod report;

pub use engine::SettlementEngine;
pub use release_lock::DepositLock;
pub use report::{SettlementFailure, SettlementPhase, SettlementReport};
