//! The ledger trait the medianode keeper transfers through.

use medianode_types::{AccountId, Coin, Result};

/// An account ledger with atomic transfers and nested checkpoints.
///
/// The keeper opens a checkpoint before each message or settlement step and
/// reverts it if the step fails, so no partial transfer sequence is ever
/// observable. Implementations journal only what changes under a checkpoint.
pub trait Ledger {
    /// Spendable balance of `account` in `denom`.
    fn balance(&self, account: &AccountId, denom: &str) -> Coin;

    /// Move `amount` from `from` to `to`. Either the whole amount moves or
    /// nothing changes.
    ///
    /// # Errors
    /// Returns `InsufficientFunds` if `from` holds less than `amount`.
    fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: &Coin) -> Result<()>;

    /// Open a checkpoint nested in the current one, if any.
    fn checkpoint(&mut self);

    /// Keep every change since the innermost checkpoint. Inside an outer
    /// checkpoint the changes still revert with it.
    fn commit(&mut self);

    /// Undo every change since the innermost checkpoint.
    fn revert(&mut self);
}
