//! # medianode-types
//!
//! Shared types, errors, and parameters for the **medianode** leasing engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`AccountId`], [`ResourceId`]
//! - **Amounts**: [`Coin`]
//! - **Resource model**: [`Resource`], [`ResourceStatus`], [`Deposit`], [`ResourceInfo`], [`HardwareSpecs`]
//! - **Lease model**: [`Lease`], [`Accrual`]
//! - **Parameters**: [`Params`], [`CommissionDistribution`]
//! - **Messages**: [`MsgRegisterResource`], [`MsgLeaseResource`], ... with stateless `validate_basic`
//! - **Events**: [`Event`], [`EventType`]
//! - **Genesis**: [`GenesisState`]
//! - **Block context**: [`Context`]
//! - **Errors**: [`MedianodeError`] with `MN_ERR_` prefix codes
//! - **Constants**: defaults and limits

pub mod coin;
pub mod constants;
pub mod context;
pub mod error;
pub mod event;
pub mod genesis;
pub mod ids;
pub mod lease;
pub mod msg;
pub mod params;
pub mod resource;

// Re-export all primary types at crate root for ergonomic imports:
//   use medianode_types::{Resource, Lease, Coin, Params, ...};

pub use coin::*;
pub use context::*;
pub use error::*;
pub use event::*;
pub use genesis::*;
pub use ids::*;
pub use lease::*;
pub use msg::*;
pub use params::*;
pub use resource::*;

// Constants are accessed via `medianode_types::constants::FOO`
// (not re-exported to avoid name collisions).
