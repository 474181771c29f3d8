//! Deposit release lock.
//!
//! Deposits of a closed resource stay in escrow for the release period so
//! that late disputes can still be raised against the owner. Once the lock
//! expires the settlement engine refunds them.

use chrono::{DateTime, Duration, Utc};
use medianode_types::{Params, Resource, ResourceStatus};

/// Time lock between `closed_at` and deposit release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositLock {
    period: Duration,
}

impl DepositLock {
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    #[must_use]
    pub fn from_params(params: &Params) -> Self {
        Self::new(params.deposit_release_period())
    }

    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// When the deposits of `resource` unlock, if it is closed.
    #[must_use]
    pub fn unlocks_at(&self, resource: &Resource) -> Option<DateTime<Utc>> {
        if resource.status != ResourceStatus::Closed {
            return None;
        }
        resource.closed_at?.checked_add_signed(self.period)
    }

    /// Closed, still holding deposits, and past the lock.
    #[must_use]
    pub fn release_due(&self, resource: &Resource, now: DateTime<Utc>) -> bool {
        !resource.deposits.is_empty() && self.unlocks_at(resource).is_some_and(|at| now >= at)
    }
}

#[cfg(test)]
mod tests {
    use medianode_types::AccountId;

    use super::*;

    fn closed() -> Resource {
        Resource::dummy("mn1", AccountId::from_seed(1), 10, ResourceStatus::Closed)
    }

    #[test]
    fn default_period_is_seven_days() {
        let lock = DepositLock::from_params(&Params::default());
        assert_eq!(lock.period(), Duration::days(7));
    }

    #[test]
    fn locked_until_period_elapses() {
        let lock = DepositLock::new(Duration::days(7));
        let resource = closed();
        let closed_at = resource.closed_at.unwrap();
        assert_eq!(lock.unlocks_at(&resource), Some(closed_at + Duration::days(7)));
        assert!(!lock.release_due(&resource, closed_at + Duration::days(7) - Duration::seconds(1)));
        assert!(lock.release_due(&resource, closed_at + Duration::days(7)));
    }

    #[test]
    fn open_or_empty_resources_never_due() {
        let lock = DepositLock::new(Duration::hours(1));
        let active = Resource::dummy("mn2", AccountId::from_seed(1), 10, ResourceStatus::Active);
        assert!(lock.unlocks_at(&active).is_none());
        assert!(!lock.release_due(&active, active.registered_at + Duration::days(30)));

        let mut drained = closed();
        drained.deposits.clear();
        assert!(!lock.release_due(&drained, drained.registered_at + Duration::days(30)));
    }
}
