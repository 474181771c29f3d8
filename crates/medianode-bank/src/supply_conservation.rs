//! Supply conservation invariant checker.
//!
//! Mathematical invariant enforced by the bank:
//! ```text
//! ∀ denom: Σ balances == Σ(minted) - Σ(burned)
//! ```
//!
//! Transfers only move tokens between accounts, so the leasing engine can
//! escrow, settle and refund as much as it likes without ever changing
//! the total. If this invariant breaks, something has gone
//! catastrophically wrong.

use std::collections::{BTreeSet, HashMap};

use medianode_types::{MedianodeError, Result};
use rust_decimal::Decimal;

/// Tracks per-denom mint/burn totals and validates conservation.
#[derive(Debug, Clone, Default)]
pub struct SupplyConservation {
    minted: HashMap<String, Decimal>,
    burned: HashMap<String, Decimal>,
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_mint(&mut self, denom: &str, amount: Decimal) {
        *self.minted.entry(denom.to_string()).or_insert(Decimal::ZERO) += amount;
    }

    pub fn record_burn(&mut self, denom: &str, amount: Decimal) {
        *self.burned.entry(denom.to_string()).or_insert(Decimal::ZERO) += amount;
    }

    /// Expected total supply of a denom: minted - burned.
    #[must_use]
    pub fn expected_supply(&self, denom: &str) -> Decimal {
        self.total_minted(denom) - self.total_burned(denom)
    }

    /// Compare the actual sum of balances against the expected supply.
    ///
    /// # Errors
    /// Returns [`MedianodeError::SupplyInvariantViolation`] if they differ.
    pub fn verify(&self, denom: &str, actual_supply: Decimal) -> Result<()> {
        let expected = self.expected_supply(denom);
        if actual_supply != expected {
            return Err(MedianodeError::SupplyInvariantViolation {
                reason: format!(
                    "denom {denom}: actual supply {actual_supply} != expected {expected} \
                     (minted={}, burned={})",
                    self.total_minted(denom),
                    self.total_burned(denom),
                ),
            });
        }
        Ok(())
    }

    /// Every denom ever minted or burned, sorted.
    #[must_use]
    pub fn tracked_denoms(&self) -> Vec<String> {
        let denoms: BTreeSet<&String> = self.minted.keys().chain(self.burned.keys()).collect();
        denoms.into_iter().cloned().collect()
    }

    #[must_use]
    pub fn total_minted(&self, denom: &str) -> Decimal {
        self.minted.get(denom).copied().unwrap_or(Decimal::ZERO)
    }

    #[must_use]
    pub fn total_burned(&self, denom: &str) -> Decimal {
        self.burned.get(denom).copied().unwrap_or(Decimal::ZERO)
    }
}
