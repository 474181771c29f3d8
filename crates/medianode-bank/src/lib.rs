//! # medianode-bank
//!
//! The **Ledger Keeper** seam of the medianode module.
//!
//! The leasing engine never moves tokens itself; it asks a [`Ledger`] to
//! transfer between accounts. A transfer is atomic and all-or-nothing, and
//! fails only when the sender's balance is insufficient.
//!
//! - [`Ledger`]: the trait the keeper is generic over
//! - [`Bank`]: in-memory implementation used by hosts and tests
//! - [`SupplyConservation`]: mint/burn bookkeeping that proves transfers
//!   never create or destroy tokens

pub mod bank;
pub mod ledger;
pub mod supply_conservation;

pub use bank::Bank;
pub use ledger::Ledger;
pub use supply_conservation::SupplyConservation;
