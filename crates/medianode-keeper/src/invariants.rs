//! Module invariants, checked by tests after every block and available to
//! hosts as a crisis check.
//!
//! ```text
//!   resource.leased  ⇔  a lease exists for resource.id
//!   lease.settled    ≤  lease.total
//!   escrow balance   ≥  Σ deposits + Σ (lease.total - lease.settled)
//! ```

use std::collections::BTreeSet;

use medianode_bank::Ledger;
use medianode_types::{Coin, Lease, MedianodeError, Resource, ResourceId, Result, checked_sum};

use crate::keeper::Keeper;

impl<L: Ledger> Keeper<L> {
    /// # Errors
    /// Returns `InvariantViolation` describing the first broken invariant.
    pub fn check_invariants(&self) -> Result<()> {
        let violation = |reason: String| Err(MedianodeError::InvariantViolation { reason });

        let resources = self.registry.resources()?;
        let leases = self.registry.leases()?;
        let leased: BTreeSet<&ResourceId> = leases.iter().map(|l| &l.resource_id).collect();

        for resource in &resources {
            if resource.leased != leased.contains(&resource.id) {
                return violation(format!(
                    "resource {} leased={} disagrees with lease store",
                    resource.id, resource.leased
                ));
            }
        }
        for lease in &leases {
            if !self.registry.has_resource(&lease.resource_id) {
                return violation(format!("lease {} has no resource", lease.resource_id));
            }
            if lease.settled_lease_amount.amount > lease.total_lease_amount.amount {
                return violation(format!(
                    "lease {} settled {} exceeds total {}",
                    lease.resource_id, lease.settled_lease_amount, lease.total_lease_amount
                ));
            }
        }

        let params = self.registry.params()?;
        let denom = params.denom();
        let owed = |err: MedianodeError| MedianodeError::InvariantViolation {
            reason: format!("escrow obligations cannot be summed: {err}"),
        };
        let deposits = resources
            .iter()
            .map(Resource::total_deposit)
            .collect::<Result<Vec<Coin>>>()
            .and_then(|totals| checked_sum(denom, &totals))
            .map_err(owed)?;
        let unsettled = leases
            .iter()
            .map(Lease::unsettled_amount)
            .collect::<Vec<Coin>>();
        let unsettled = checked_sum(denom, &unsettled).map_err(owed)?;
        let total = deposits.checked_add(&unsettled).map_err(owed)?;
        let held = self.ledger.balance(&self.config.escrow_account, denom);
        if held.amount < total.amount {
            return violation(format!(
                "escrow holds {held} but owes {deposits} in deposits and {unsettled} in leases"
            ));
        }
        Ok(())
    }
}
