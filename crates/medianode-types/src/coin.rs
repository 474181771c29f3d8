//! Token amounts.
//!
//! A [`Coin`] is a whole number of base units of one denomination. Amounts
//! are carried as `Decimal` but must always be integral and non-negative.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{MedianodeError, Result};

/// An amount of a single denomination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: Decimal,
}

impl Coin {
    #[must_use]
    pub fn new(denom: impl Into<String>, amount: Decimal) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    /// Zero amount of `denom`.
    #[must_use]
    pub fn zero(denom: impl Into<String>) -> Self {
        Self::new(denom, Decimal::ZERO)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Validate the denomination and that the amount is a non-negative integer.
    ///
    /// # Errors
    /// Returns `InvalidAmount` describing the first violated rule.
    pub fn validate(&self) -> Result<()> {
        validate_denom(&self.denom)?;
        if self.amount.is_sign_negative() && !self.amount.is_zero() {
            return Err(MedianodeError::InvalidAmount {
                reason: format!("{self} is negative"),
            });
        }
        if self.amount.fract() != Decimal::ZERO {
            return Err(MedianodeError::InvalidAmount {
                reason: format!("{self} is not a whole number of base units"),
            });
        }
        Ok(())
    }

    /// Validate and additionally require `amount > 0`.
    ///
    /// # Errors
    /// Returns `InvalidAmount` if invalid or zero.
    pub fn validate_positive(&self) -> Result<()> {
        self.validate()?;
        if !self.is_positive() {
            return Err(MedianodeError::InvalidAmount {
                reason: format!("{self} must be positive"),
            });
        }
        Ok(())
    }

    /// Require that `self` is denominated in `denom`.
    ///
    /// # Errors
    /// Returns `InvalidAmount` on a denomination mismatch.
    pub fn expect_denom(&self, denom: &str) -> Result<()> {
        if self.denom != denom {
            return Err(MedianodeError::InvalidAmount {
                reason: format!("expected denom {denom}, got {}", self.denom),
            });
        }
        Ok(())
    }

    /// Sum of two coins of the same denomination.
    ///
    /// # Errors
    /// Returns `InvalidAmount` on a denomination mismatch or overflow.
    pub fn checked_add(&self, other: &Self) -> Result<Self> {
        other.expect_denom(&self.denom)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| overflow(format!("{self} + {other}")))?;
        Ok(Self::new(self.denom.clone(), amount))
    }

    /// Difference of two coins of the same denomination, never below zero.
    ///
    /// # Errors
    /// Returns `InvalidAmount` on a denomination mismatch or underflow.
    pub fn checked_sub(&self, other: &Self) -> Result<Self> {
        other.expect_denom(&self.denom)?;
        if other.amount > self.amount {
            return Err(MedianodeError::InvalidAmount {
                reason: format!("{self} - {other} would be negative"),
            });
        }
        Ok(Self::new(self.denom.clone(), self.amount - other.amount))
    }

    /// `self × n`, e.g. price per hour times hours.
    ///
    /// # Errors
    /// Returns `InvalidAmount` if the product does not fit an amount.
    pub fn checked_times(&self, n: u64) -> Result<Self> {
        let amount = self
            .amount
            .checked_mul(Decimal::from(n))
            .ok_or_else(|| overflow(format!("{self} × {n}")))?;
        Ok(Self::new(self.denom.clone(), amount))
    }
}

/// Sum of `coins`, all in `denom`.
///
/// # Errors
/// Returns `InvalidAmount` on a foreign denomination or overflow.
pub fn checked_sum<'a>(denom: &str, coins: impl IntoIterator<Item = &'a Coin>) -> Result<Coin> {
    coins
        .into_iter()
        .try_fold(Coin::zero(denom), |total, coin| total.checked_add(coin))
}

fn overflow(expr: String) -> MedianodeError {
    MedianodeError::InvalidAmount {
        reason: format!("{expr} overflows"),
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Denominations are 3–128 chars: lowercase letters first, then lowercase
/// alphanumerics or `/`.
///
/// # Errors
/// Returns `InvalidAmount` if the denomination is malformed.
pub fn validate_denom(denom: &str) -> Result<()> {
    let len_ok = (3..=128).contains(&denom.len());
    let first_ok = denom.bytes().next().is_some_and(|b| b.is_ascii_lowercase());
    let rest_ok = denom
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'/');
    if len_ok && first_ok && rest_ok {
        Ok(())
    } else {
        Err(MedianodeError::InvalidAmount {
            reason: format!("invalid denom {denom:?}"),
        })
    }
}
