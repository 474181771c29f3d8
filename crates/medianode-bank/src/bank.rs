//! In-memory bank implementing [`Ledger`].
//!
//! Tracks per-(account, denom) balances. All mutations are atomic: either
//! the full operation succeeds or the balances are unchanged. Minting and
//! burning are recorded so supply conservation can be verified at any time.
//!
//! Checkpoints journal the prior value of every balance they touch, so a
//! revert costs as much as the work it undoes, not the size of the book.

use std::collections::BTreeMap;

use medianode_types::{AccountId, Coin, MedianodeError, Result};
use rust_decimal::Decimal;

use crate::{Ledger, SupplyConservation};

type BalanceKey = (AccountId, String);

/// Prior state of one thing a checkpoint touched.
#[derive(Debug, Clone)]
enum Undo {
    Balance(BalanceKey, Option<Decimal>),
    Supply(SupplyConservation),
}

/// Balance book keyed by `(account, denom)`. Ordered so that iteration,
/// and therefore any derived hash or report, is deterministic.
#[derive(Debug, Clone, Default)]
pub struct Bank {
    balances: BTreeMap<BalanceKey, Decimal>,
    supply: SupplyConservation,
    /// Open checkpoints, innermost last.
    checkpoints: Vec<Vec<Undo>>,
}

impl Bank {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create tokens in `account` (genesis funding, faucets in tests).
    ///
    /// # Errors
    /// Returns `InvalidAmount` if the coin is malformed or the denom's
    /// total supply would overflow.
    pub fn mint(&mut self, account: &AccountId, coin: &Coin) -> Result<()> {
        coin.validate()?;
        // Every balance is bounded by the minted total, so once this fits
        // no credit of this denom can overflow.
        if self
            .supply
            .total_minted(&coin.denom)
            .checked_add(coin.amount)
            .is_none()
        {
            return Err(MedianodeError::InvalidAmount {
                reason: format!("minting {coin} overflows the {} supply", coin.denom),
            });
        }
        let key = (account.clone(), coin.denom.clone());
        let balance = self.amount(&key) + coin.amount;
        self.journal_supply();
        self.supply.record_mint(&coin.denom, coin.amount);
        self.write(key, balance);
        Ok(())
    }

    /// Destroy tokens held by `account`.
    ///
    /// # Errors
    /// Returns `InsufficientFunds` if the account holds less than `coin`.
    pub fn burn(&mut self, account: &AccountId, coin: &Coin) -> Result<()> {
        coin.validate()?;
        let key = (account.clone(), coin.denom.clone());
        let remaining = self.remaining_after_debit(&key, coin)?;
        self.journal_supply();
        self.supply.record_burn(&coin.denom, coin.amount);
        self.write(key, remaining);
        Ok(())
    }

    /// Sum of all balances of `denom`.
    #[must_use]
    pub fn total_supply(&self, denom: &str) -> Decimal {
        self.balances
            .iter()
            .filter(|((_, d), _)| d == denom)
            .map(|(_, amount)| *amount)
            .sum()
    }

    /// Verify supply conservation for every denom ever minted.
    ///
    /// # Errors
    /// Returns `SupplyInvariantViolation` for the first imbalanced denom.
    pub fn verify_supply(&self) -> Result<()> {
        for denom in self.supply.tracked_denoms() {
            self.supply.verify(&denom, self.total_supply(&denom))?;
        }
        Ok(())
    }

    fn amount(&self, key: &BalanceKey) -> Decimal {
        self.balances.get(key).copied().unwrap_or(Decimal::ZERO)
    }

    fn remaining_after_debit(&self, key: &BalanceKey, coin: &Coin) -> Result<Decimal> {
        let available = self.amount(key);
        if available < coin.amount {
            return Err(MedianodeError::InsufficientFunds {
                needed: coin.amount,
                available,
            });
        }
        Ok(available - coin.amount)
    }

    /// Set a balance, dropping zero entries and journaling the prior value.
    fn write(&mut self, key: BalanceKey, amount: Decimal) {
        let prior = if amount.is_zero() {
            self.balances.remove(&key)
        } else {
            self.balances.insert(key.clone(), amount)
        };
        if let Some(undo) = self.checkpoints.last_mut() {
            undo.push(Undo::Balance(key, prior));
        }
    }

    fn journal_supply(&mut self) {
        if let Some(undo) = self.checkpoints.last_mut() {
            undo.push(Undo::Supply(self.supply.clone()));
        }
    }
}

impl Ledger for Bank {
    fn balance(&self, account: &AccountId, denom: &str) -> Coin {
        Coin::new(denom, self.amount(&(account.clone(), denom.to_string())))
    }

    fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: &Coin) -> Result<()> {
        amount.validate()?;
        if amount.is_zero() {
            return Ok(());
        }
        let from_key = (from.clone(), amount.denom.clone());
        let remaining = self.remaining_after_debit(&from_key, amount)?;
        if from == to {
            return Ok(());
        }
        let to_key = (to.clone(), amount.denom.clone());
        let credited = self.amount(&to_key) + amount.amount;
        self.write(from_key, remaining);
        self.write(to_key, credited);
        tracing::trace!(
            from = from.short(),
            to = to.short(),
            amount = %amount,
            "Ledger transfer"
        );
        Ok(())
    }

    fn checkpoint(&mut self) {
        self.checkpoints.push(Vec::new());
    }

    fn commit(&mut self) {
        if let Some(undo) = self.checkpoints.pop() {
            if let Some(parent) = self.checkpoints.last_mut() {
                parent.extend(undo);
            }
        }
    }

    fn revert(&mut self) {
        let Some(undo) = self.checkpoints.pop() else {
            return;
        };
        for entry in undo.into_iter().rev() {
            match entry {
                Undo::Balance(key, Some(amount)) => {
                    self.balances.insert(key, amount);
                }
                Undo::Balance(key, None) => {
                    self.balances.remove(&key);
                }
                Undo::Supply(supply) => self.supply = supply,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(n: i64) -> Coin {
        Coin::new("umedia", Decimal::new(n, 0))
    }

    #[test]
    fn mint_increases_balance() {
        let mut bank = Bank::new();
        let user = AccountId::from_seed(1);
        bank.mint(&user, &coin(1000)).unwrap();
        assert_eq!(bank.balance(&user, "umedia"), coin(1000));
        assert_eq!(bank.total_supply("umedia"), Decimal::new(1000, 0));
    }

    #[test]
    fn transfer_moves_funds() {
        let mut bank = Bank::new();
        let (a, b) = (AccountId::from_seed(1), AccountId::from_seed(2));
        bank.mint(&a, &coin(1000)).unwrap();
        bank.transfer(&a, &b, &coin(400)).unwrap();
        assert_eq!(bank.balance(&a, "umedia"), coin(600));
        assert_eq!(bank.balance(&b, "umedia"), coin(400));
        bank.verify_supply().unwrap();
    }

    #[test]
    fn transfer_insufficient_fails_without_change() {
        let mut bank = Bank::new();
        let (a, b) = (AccountId::from_seed(1), AccountId::from_seed(2));
        bank.mint(&a, &coin(100)).unwrap();
        let err = bank.transfer(&a, &b, &coin(200)).unwrap_err();
        assert!(matches!(err, MedianodeError::InsufficientFunds { .. }));
        assert_eq!(bank.balance(&a, "umedia"), coin(100));
        assert!(bank.balance(&b, "umedia").is_zero());
    }

    #[test]
    fn zero_transfer_is_noop() {
        let mut bank = Bank::new();
        let (a, b) = (AccountId::from_seed(1), AccountId::from_seed(2));
        bank.transfer(&a, &b, &coin(0)).unwrap();
        assert!(bank.balance(&b, "umedia").is_zero());
    }

    #[test]
    fn burn_reduces_supply() {
        let mut bank = Bank::new();
        let a = AccountId::from_seed(1);
        bank.mint(&a, &coin(50)).unwrap();
        bank.burn(&a, &coin(20)).unwrap();
        assert_eq!(bank.total_supply("umedia"), Decimal::new(30, 0));
        bank.verify_supply().unwrap();
        assert!(bank.burn(&a, &coin(31)).is_err());
    }

    #[test]
    fn unknown_balance_is_zero() {
        let bank = Bank::new();
        assert!(bank.balance(&AccountId::from_seed(9), "umedia").is_zero());
    }

    #[test]
    fn revert_restores_touched_balances_and_supply() {
        let mut bank = Bank::new();
        let (a, b) = (AccountId::from_seed(1), AccountId::from_seed(2));
        bank.mint(&a, &coin(100)).unwrap();

        bank.checkpoint();
        bank.transfer(&a, &b, &coin(100)).unwrap();
        bank.mint(&b, &coin(5)).unwrap();
        bank.burn(&b, &coin(30)).unwrap();
        bank.revert();

        assert_eq!(bank.balance(&a, "umedia"), coin(100));
        assert!(bank.balance(&b, "umedia").is_zero());
        assert_eq!(bank.total_supply("umedia"), Decimal::new(100, 0));
        bank.verify_supply().unwrap();
    }

    #[test]
    fn nested_commit_still_reverts_with_outer_checkpoint() {
        let mut bank = Bank::new();
        let (a, b) = (AccountId::from_seed(1), AccountId::from_seed(2));
        bank.mint(&a, &coin(100)).unwrap();

        bank.checkpoint();
        bank.transfer(&a, &b, &coin(10)).unwrap();
        bank.checkpoint();
        bank.transfer(&a, &b, &coin(20)).unwrap();
        bank.commit();
        assert_eq!(bank.balance(&b, "umedia"), coin(30));
        bank.revert();

        assert_eq!(bank.balance(&a, "umedia"), coin(100));
        assert!(bank.balance(&b, "umedia").is_zero());
    }

    #[test]
    fn committed_changes_survive() {
        let mut bank = Bank::new();
        let (a, b) = (AccountId::from_seed(1), AccountId::from_seed(2));
        bank.mint(&a, &coin(100)).unwrap();
        bank.checkpoint();
        bank.transfer(&a, &b, &coin(40)).unwrap();
        bank.commit();
        bank.revert();
        assert_eq!(bank.balance(&b, "umedia"), coin(40));
    }

    #[test]
    fn self_transfer_checks_funds_without_moving_them() {
        let mut bank = Bank::new();
        let a = AccountId::from_seed(1);
        bank.mint(&a, &coin(10)).unwrap();
        bank.transfer(&a, &a, &coin(10)).unwrap();
        assert_eq!(bank.balance(&a, "umedia"), coin(10));
        assert!(bank.transfer(&a, &a, &coin(11)).is_err());
    }

    #[test]
    fn mint_beyond_decimal_range_is_rejected() {
        let mut bank = Bank::new();
        let a = AccountId::from_seed(1);
        bank.mint(&a, &Coin::new("umedia", Decimal::MAX)).unwrap();
        assert!(matches!(
            bank.mint(&a, &coin(1)),
            Err(MedianodeError::InvalidAmount { .. })
        ));
        assert_eq!(bank.balance(&a, "umedia").amount, Decimal::MAX);
        bank.verify_supply().unwrap();
    }
}
