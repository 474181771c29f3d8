//! # medianode-keeper
//!
//! **State plane** of the medianode module: storage, the lease lifecycle
//! state machine, read-only queries, and genesis import/export.
//!
//! ## Architecture
//!
//! 1. **KvStore**: ordered byte store with prefix iteration
//! 2. **Registry**: typed Resource/Lease records, secondary indexes, id counter, params
//! 3. **Keeper**: message handlers (register, deposit, lease, extend, cancel, close, params)
//! 4. **Queries**: paginated and indexed reads
//! 5. **Genesis**: validated import/export of the full module state
//! 6. **Invariants**: lease/flag consistency and escrow solvency checks
//!
//! ## Message Flow
//!
//! ```text
//! Msg → validate_basic() → Keeper::branch(handler) → Registry + Ledger → Event
//!                                  └─ on error: store, ledger, events restored
//! ```
//!
//! The settlement engine (`medianode-settlement`) drives the per-block
//! primitives [`Keeper::settle_lease`] and [`Keeper::release_deposits`].

pub mod genesis;
pub mod invariants;
pub mod keeper;
pub mod msg_server;
pub mod query;
pub mod registry;
pub mod store;

pub use keeper::{Keeper, KeeperConfig, SettleOutcome};
pub use query::{Page, PageRequest, Querier};
pub use registry::Registry;
pub use store::KvStore;
