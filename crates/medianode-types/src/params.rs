//! Module parameters (governance-controlled bounds).
//!
//! Params live in the module store and are handed to every handler
//! explicitly; nothing reads them from global state.

use chrono::Duration;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::{Coin, MedianodeError, Result, constants};

/// How lease commission is split between module accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionDistribution {
    /// Share sent to the fee collector (validator rewards).
    pub fee_collector: Decimal,
    /// Share sent to the community pool.
    pub community_pool: Decimal,
}

impl Default for CommissionDistribution {
    fn default() -> Self {
        Self {
            fee_collector: Decimal::new(50, 2),
            community_pool: Decimal::new(50, 2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    pub min_lease_hours: u64,
    pub max_lease_hours: u64,
    /// Aggregate deposit at which a resource becomes Active.
    pub min_deposit: Coin,
    /// Fraction of `min_deposit` required at registration, in (0, 1].
    pub initial_deposit_percentage: Decimal,
    /// Fraction of every settled lease payment withheld as commission, in [0, 1).
    pub lease_commission: Decimal,
    pub commission_distribution: CommissionDistribution,
    /// Lock period between close and deposit release.
    pub deposit_release_period_secs: u64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            min_lease_hours: constants::DEFAULT_MIN_LEASE_HOURS,
            max_lease_hours: constants::DEFAULT_MAX_LEASE_HOURS,
            min_deposit: Coin::new(
                constants::DEFAULT_DENOM,
                Decimal::new(constants::DEFAULT_MIN_DEPOSIT, 0),
            ),
            initial_deposit_percentage: Decimal::new(constants::DEFAULT_INITIAL_DEPOSIT_PERCENT, 2),
            lease_commission: Decimal::new(constants::DEFAULT_LEASE_COMMISSION_PERCENT, 2),
            commission_distribution: CommissionDistribution::default(),
            deposit_release_period_secs: constants::DEFAULT_DEPOSIT_RELEASE_SECS.unsigned_abs(),
        }
    }
}

impl Params {
    /// The single denomination all medianode amounts use.
    #[must_use]
    pub fn denom(&self) -> &str {
        &self.min_deposit.denom
    }

    /// Minimum deposit at registration: `ceil(min_deposit × percentage)`.
    #[must_use]
    pub fn min_initial_deposit(&self) -> Coin {
        let amount = (self.min_deposit.amount * self.initial_deposit_percentage)
            .round_dp_with_strategy(0, RoundingStrategy::AwayFromZero);
        Coin::new(self.min_deposit.denom.clone(), amount)
    }

    #[must_use]
    pub fn deposit_release_period(&self) -> Duration {
        let secs = i64::try_from(self.deposit_release_period_secs).unwrap_or(i64::MAX);
        Duration::seconds(secs.min(i64::MAX / 1_000))
    }

    /// # Errors
    /// Returns `InvalidLeaseHours` if `hours` is outside `[min, max]`.
    pub fn check_lease_hours(&self, hours: u64) -> Result<()> {
        if hours < self.min_lease_hours || hours > self.max_lease_hours {
            return Err(MedianodeError::InvalidLeaseHours {
                hours,
                min: self.min_lease_hours,
                max: self.max_lease_hours,
            });
        }
        Ok(())
    }

    /// Split a settled amount into `(payment, fee_collector, community_pool)`.
    ///
    /// Commission is truncated to whole units; the community pool takes the
    /// rounding remainder of the commission so the three parts always sum
    /// to `amount`.
    #[must_use]
    pub fn split_commission(&self, amount: &Coin) -> (Coin, Coin, Coin) {
        let commission = (amount.amount * self.lease_commission).trunc();
        let fee_collector = (commission * self.commission_distribution.fee_collector).trunc();
        let community_pool = commission - fee_collector;
        let denom = amount.denom.clone();
        (
            Coin::new(denom.clone(), amount.amount - commission),
            Coin::new(denom.clone(), fee_collector),
            Coin::new(denom, community_pool),
        )
    }

    /// # Errors
    /// Returns `InvalidParams` naming the first violated bound.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(MedianodeError::InvalidParams { reason });

        if self.min_lease_hours == 0 {
            return invalid("min_lease_hours must be at least 1".into());
        }
        if self.max_lease_hours < self.min_lease_hours {
            return invalid(format!(
                "max_lease_hours {} below min_lease_hours {}",
                self.max_lease_hours, self.min_lease_hours
            ));
        }
        if let Err(err) = self.min_deposit.validate_positive() {
            return invalid(format!("min_deposit: {err}"));
        }
        if self.initial_deposit_percentage <= Decimal::ZERO
            || self.initial_deposit_percentage > Decimal::ONE
        {
            return invalid(format!(
                "initial_deposit_percentage {} must be in (0, 1]",
                self.initial_deposit_percentage
            ));
        }
        if self.lease_commission < Decimal::ZERO || self.lease_commission >= Decimal::ONE {
            return invalid(format!(
                "lease_commission {} must be in [0, 1)",
                self.lease_commission
            ));
        }
        let dist = &self.commission_distribution;
        if dist.fee_collector < Decimal::ZERO || dist.community_pool < Decimal::ZERO {
            return invalid("commission distribution shares must be non-negative".into());
        }
        if dist.fee_collector + dist.community_pool != Decimal::ONE {
            return invalid(format!(
                "commission distribution must sum to 1, got {}",
                dist.fee_collector + dist.community_pool
            ));
        }
        if self.deposit_release_period_secs == 0 {
            return invalid("deposit_release_period_secs must be positive".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(n: i64) -> Coin {
        Coin::new("umedia", Decimal::new(n, 0))
    }

    #[test]
    fn defaults_are_valid() {
        let params = Params::default();
        params.validate().unwrap();
        assert_eq!(params.denom(), "umedia");
        assert_eq!(params.min_initial_deposit(), coin(100));
        assert_eq!(params.deposit_release_period(), Duration::days(7));
    }

    #[test]
    fn min_initial_deposit_rounds_up() {
        let params = Params {
            min_deposit: coin(999),
            initial_deposit_percentage: Decimal::new(10, 2),
            ..Params::default()
        };
        assert_eq!(params.min_initial_deposit(), coin(100));
    }

    #[test]
    fn lease_hours_bounds() {
        let params = Params {
            min_lease_hours: 2,
            max_lease_hours: 48,
            ..Params::default()
        };
        assert!(params.check_lease_hours(2).is_ok());
        assert!(params.check_lease_hours(48).is_ok());
        assert!(matches!(
            params.check_lease_hours(1),
            Err(MedianodeError::InvalidLeaseHours { hours: 1, min: 2, max: 48 })
        ));
        assert!(params.check_lease_hours(49).is_err());
    }

    #[test]
    fn commission_split_sums_to_amount() {
        let params = Params::default();
        let (payment, fee, pool) = params.split_commission(&coin(10));
        assert_eq!(payment, coin(9));
        assert_eq!(fee, coin(0));
        assert_eq!(pool, coin(1));

        let (payment, fee, pool) = params.split_commission(&coin(240));
        assert_eq!(payment, coin(216));
        assert_eq!(fee, coin(12));
        assert_eq!(pool, coin(12));
    }

    #[test]
    fn zero_commission_pays_owner_everything() {
        let params = Params {
            lease_commission: Decimal::ZERO,
            ..Params::default()
        };
        let (payment, fee, pool) = params.split_commission(&coin(37));
        assert_eq!(payment, coin(37));
        assert!(fee.is_zero() && pool.is_zero());
    }

    #[test]
    fn invalid_params_rejected() {
        let cases = [
            Params { min_lease_hours: 0, ..Params::default() },
            Params { min_lease_hours: 10, max_lease_hours: 5, ..Params::default() },
            Params { min_deposit: coin(0), ..Params::default() },
            Params { initial_deposit_percentage: Decimal::ZERO, ..Params::default() },
            Params { initial_deposit_percentage: Decimal::new(11, 1), ..Params::default() },
            Params { lease_commission: Decimal::ONE, ..Params::default() },
            Params {
                commission_distribution: CommissionDistribution {
                    fee_collector: Decimal::new(6, 1),
                    community_pool: Decimal::new(6, 1),
                },
                ..Params::default()
            },
            Params { deposit_release_period_secs: 0, ..Params::default() },
        ];
        for params in cases {
            assert!(
                matches!(params.validate(), Err(MedianodeError::InvalidParams { .. })),
                "should reject {params:?}"
            );
        }
    }

    #[test]
    fn serde_roundtrip() {
        let params = Params::default();
        let json = serde_json::to_string(&params).unwrap();
        let back: Params = serde_json::from_str(&json).unwrap();
        assert_eq!(params, back);
    }
}
