//! # Lease — an active, incrementally settled rental of one resource
//!
//! The lessee pays `price_per_hour × leased_hours` into module escrow up
//! front. Each block the settlement engine moves whole elapsed hours out of
//! escrow to the owner (minus commission):
//!
//! ```text
//!   0 ≤ settled_lease_amount ≤ total_lease_amount
//!   settled == total  ⇒  lease deleted, resource.leased = false
//! ```

use chrono::{DateTime, Duration, Utc};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::{AccountId, Coin, MedianodeError, ResourceId, Result, constants};

/// Whole hours billable at a given block time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accrual {
    /// Whole hours elapsed since `last_settled_at`, capped at the
    /// contracted hours still unpaid.
    pub billed_hours: u64,
    /// Amount due, capped at the unsettled remainder.
    pub amount: Coin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    pub resource_id: ResourceId,
    pub lessee: AccountId,
    /// Copied from the resource at lease time.
    pub owner: AccountId,
    /// Frozen at lease time; later price updates don't apply.
    pub price_per_hour: Coin,
    pub leased_hours: u64,
    pub start_time: DateTime<Utc>,
    pub total_lease_amount: Coin,
    pub settled_lease_amount: Coin,
    pub last_settled_at: DateTime<Utc>,
}

impl Lease {
    /// A fresh, unsettled lease starting at `now`.
    ///
    /// # Errors
    /// Returns `InvalidAmount` if `price_per_hour × leased_hours` overflows.
    pub fn new(
        resource_id: ResourceId,
        lessee: AccountId,
        owner: AccountId,
        price_per_hour: Coin,
        leased_hours: u64,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let denom = price_per_hour.denom.clone();
        Ok(Self {
            resource_id,
            lessee,
            owner,
            total_lease_amount: price_per_hour.checked_times(leased_hours)?,
            price_per_hour,
            leased_hours,
            start_time: now,
            settled_lease_amount: Coin::zero(denom),
            last_settled_at: now,
        })
    }

    /// Escrowed amount not yet paid out.
    #[must_use]
    pub fn unsettled_amount(&self) -> Coin {
        Coin::new(
            self.total_lease_amount.denom.clone(),
            self.total_lease_amount.amount - self.settled_lease_amount.amount,
        )
    }

    /// Contracted hours not yet paid for. A partial hour left by an
    /// imported settlement counts as a whole one.
    #[must_use]
    pub fn remaining_hours(&self) -> u64 {
        self.unsettled_amount()
            .amount
            .checked_div(self.price_per_hour.amount)
            .and_then(|hours| hours.ceil().to_u64())
            .unwrap_or(u64::MAX)
    }

    #[must_use]
    pub fn is_fully_settled(&self) -> bool {
        self.settled_lease_amount.amount >= self.total_lease_amount.amount
    }

    /// Hours billable at `now`, or `None` if less than one whole hour has
    /// passed since the last settlement or nothing remains to settle.
    #[must_use]
    pub fn accrual_at(&self, now: DateTime<Utc>) -> Option<Accrual> {
        let elapsed_secs = (now - self.last_settled_at).num_seconds();
        let elapsed_hours = u64::try_from(elapsed_secs / constants::SECONDS_PER_HOUR).ok()?;
        if elapsed_hours == 0 {
            return None;
        }
        let remaining = self.unsettled_amount();
        if !remaining.is_positive() {
            return None;
        }
        let billed_hours = elapsed_hours.min(self.remaining_hours());
        let due = self
            .price_per_hour
            .checked_times(billed_hours)
            .map_or(remaining.amount, |due| due.amount.min(remaining.amount));
        Some(Accrual {
            billed_hours,
            amount: Coin::new(remaining.denom, due),
        })
    }

    /// Record a settled accrual. `last_settled_at` advances by exactly the
    /// billed whole hours, so partial hours carry over to the next tick.
    ///
    /// # Errors
    /// Returns `InvariantViolation` if the accrual would overshoot the total.
    pub fn apply_accrual(&mut self, accrual: &Accrual) -> Result<()> {
        let settled = self.settled_lease_amount.checked_add(&accrual.amount)?;
        if settled.amount > self.total_lease_amount.amount {
            return Err(MedianodeError::InvariantViolation {
                reason: format!(
                    "lease {} would settle {settled} of {}",
                    self.resource_id, self.total_lease_amount
                ),
            });
        }
        let last_settled_at = i64::try_from(accrual.billed_hours)
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|billed| self.last_settled_at.checked_add_signed(billed))
            .ok_or_else(|| MedianodeError::Internal("billed hours overflow".into()))?;
        self.settled_lease_amount = settled;
        self.last_settled_at = last_settled_at;
        Ok(())
    }

    /// Add `extra_hours` to the contract.
    ///
    /// # Errors
    /// Returns `InvalidLeaseHours` or `InvalidAmount` if the new hours or
    /// total overflow; the lease is unchanged then.
    pub fn extend(&mut self, extra_hours: u64) -> Result<()> {
        let leased_hours = self
            .leased_hours
            .checked_add(extra_hours)
            .ok_or(MedianodeError::InvalidLeaseHours {
                hours: extra_hours,
                min: 1,
                max: u64::MAX - self.leased_hours,
            })?;
        let total = self
            .total_lease_amount
            .checked_add(&self.price_per_hour.checked_times(extra_hours)?)?;
        self.leased_hours = leased_hours;
        self.total_lease_amount = total;
        Ok(())
    }

    /// Scheduled end of the contract, ignoring settlement progress.
    #[must_use]
    pub fn expected_end(&self) -> Option<DateTime<Utc>> {
        let hours = i64::try_from(self.leased_hours).ok()?;
        self.start_time.checked_add_signed(Duration::try_hours(hours)?)
    }

    /// Field validation used by genesis import.
    ///
    /// # Errors
    /// Returns `InvalidResource` / `InvalidAmount` naming the bad field.
    pub fn validate(&self) -> Result<()> {
        self.price_per_hour.validate_positive()?;
        self.total_lease_amount.validate()?;
        self.settled_lease_amount.validate()?;
        self.total_lease_amount.expect_denom(&self.price_per_hour.denom)?;
        self.settled_lease_amount
            .expect_denom(&self.price_per_hour.denom)?;
        let invalid = |reason: String| MedianodeError::InvalidResource { reason };
        if self.leased_hours == 0 {
            return Err(invalid(format!("lease {} has zero hours", self.resource_id)));
        }
        if self.price_per_hour.checked_times(self.leased_hours).ok().as_ref()
            != Some(&self.total_lease_amount)
        {
            return Err(invalid(format!(
                "lease {} total {} != {} × {}h",
                self.resource_id, self.total_lease_amount, self.price_per_hour, self.leased_hours
            )));
        }
        if self.settled_lease_amount.amount > self.total_lease_amount.amount {
            return Err(invalid(format!(
                "lease {} settled {} exceeds total {}",
                self.resource_id, self.settled_lease_amount, self.total_lease_amount
            )));
        }
        if self.last_settled_at < self.start_time {
            return Err(invalid(format!(
                "lease {} last settled before it started",
                self.resource_id
            )));
        }
        Ok(())
    }
}
