//! The per-block settlement engine.
//!
//! ```text
//!   begin_block(ctx)
//!     ├─ Phase A: for lease in leases (key order)
//!     │     branch { keeper.settle_lease }   ── err ─▶ rollback, warn, event, report
//!     └─ Phase B: for resource in resources (key order) where lock expired
//!           branch { keeper.release_deposits } ── err ─▶ rollback, warn, event, report
//! ```

use medianode_bank::Ledger;
use medianode_keeper::{Keeper, SettleOutcome};
use medianode_types::{Context, MedianodeError, ResourceId, Result};

use crate::release_lock::DepositLock;
use crate::report::{SettlementFailure, SettlementPhase, SettlementReport};

/// Drives settlement once per block.
///
/// Holds only the last settled height, so that a host replaying
/// `begin_block` for the same block cannot pay out twice.
#[derive(Debug, Clone, Default)]
pub struct SettlementEngine {
    last_height: Option<u64>,
}

impl SettlementEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Height of the last block settled by this engine.
    #[must_use]
    pub fn last_height(&self) -> Option<u64> {
        self.last_height
    }

    /// Run both settlement phases for the block described by `ctx`.
    ///
    /// Per-record failures never surface here; they are in the report.
    ///
    /// # Errors
    /// Returns `BlockAlreadySettled` if `ctx.height` is not above the last
    /// settled height, or `Serialization` if the store cannot be listed.
    pub fn begin_block<L: Ledger>(
        &mut self,
        keeper: &mut Keeper<L>,
        ctx: &Context,
    ) -> Result<SettlementReport> {
        if self.last_height.is_some_and(|last| ctx.height <= last) {
            return Err(MedianodeError::BlockAlreadySettled(ctx.height));
        }

        let mut report = SettlementReport::new(ctx.height);
        Self::settle_active_leases(keeper, ctx, &mut report)?;
        Self::release_deposits(keeper, ctx, &mut report)?;
        self.last_height = Some(ctx.height);

        if !report.is_idle() {
            tracing::debug!(
                height = ctx.height,
                settled = report.leases_settled,
                completed = report.leases_completed,
                released = report.deposits_released,
                failures = report.failures.len(),
                "Block settled"
            );
        }
        Ok(report)
    }

    /// Phase A: pay out whole accrued hours of every lease.
    ///
    /// # Errors
    /// Returns `Serialization` if the lease ids cannot be listed.
    pub fn settle_active_leases<L: Ledger>(
        keeper: &mut Keeper<L>,
        ctx: &Context,
        report: &mut SettlementReport,
    ) -> Result<()> {
        for id in keeper.registry().lease_ids()? {
            match keeper.branch(|k| k.settle_lease(ctx, &id)) {
                Ok(SettleOutcome::Idle) => {}
                Ok(SettleOutcome::Settled { .. }) => report.leases_settled += 1,
                Ok(SettleOutcome::Completed { amount }) => {
                    if amount.is_positive() {
                        report.leases_settled += 1;
                    }
                    report.leases_completed += 1;
                }
                Err(err) => record_failure(keeper, ctx, report, SettlementPhase::SettleLeases, id, err),
            }
        }
        Ok(())
    }

    /// Phase B: refund deposits of closed resources whose lock has expired.
    ///
    /// # Errors
    /// Returns `Serialization` if the resources cannot be listed.
    pub fn release_deposits<L: Ledger>(
        keeper: &mut Keeper<L>,
        ctx: &Context,
        report: &mut SettlementReport,
    ) -> Result<()> {
        let lock = DepositLock::from_params(&keeper.query().params()?);
        let due: Vec<ResourceId> = keeper
            .registry()
            .resources()?
            .into_iter()
            .filter(|resource| lock.release_due(resource, ctx.block_time))
            .map(|resource| resource.id)
            .collect();

        for id in due {
            match keeper.branch(|k| k.release_deposits(ctx, &id)) {
                Ok(_) => report.deposits_released += 1,
                Err(err) => {
                    record_failure(keeper, ctx, report, SettlementPhase::ReleaseDeposits, id, err);
                }
            }
        }
        Ok(())
    }
}

fn record_failure<L: Ledger>(
    keeper: &mut Keeper<L>,
    ctx: &Context,
    report: &mut SettlementReport,
    phase: SettlementPhase,
    resource_id: ResourceId,
    error: MedianodeError,
) {
    tracing::warn!(
        height = ctx.height,
        phase = %phase,
        resource = %resource_id,
        error = %error,
        "Settlement step failed, retrying next block"
    );
    keeper.emit_settlement_failure(ctx, &resource_id, error.to_string());
    report.failures.push(SettlementFailure {
        phase,
        resource_id,
        error,
    });
}
