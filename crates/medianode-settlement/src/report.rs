//! Per-block settlement report.

use std::fmt;

use medianode_types::{MedianodeError, ResourceId};
use serde::Serialize;

/// Which half of `begin_block` a record was processed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SettlementPhase {
    /// Phase A: hourly lease payouts.
    SettleLeases,
    /// Phase B: refunds of closed-resource deposits.
    ReleaseDeposits,
}

impl fmt::Display for SettlementPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SettleLeases => write!(f, "SETTLE_LEASES"),
            Self::ReleaseDeposits => write!(f, "RELEASE_DEPOSITS"),
        }
    }
}

/// One record that failed and was rolled back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementFailure {
    pub phase: SettlementPhase,
    pub resource_id: ResourceId,
    pub error: MedianodeError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettlementReport {
    pub height: u64,
    /// Leases that paid out at least one hour this block.
    pub leases_settled: usize,
    /// Leases that reached their total and were removed.
    pub leases_completed: usize,
    /// Closed resources whose deposits were refunded.
    pub deposits_released: usize,
    pub failures: Vec<SettlementFailure>,
}

impl SettlementReport {
    #[must_use]
    pub fn new(height: u64) -> Self {
        Self {
            height,
            ..Self::default()
        }
    }

    /// No record failed this block.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Nothing happened at all.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.leases_settled == 0
            && self.leases_completed == 0
            && self.deposits_released == 0
            && self.is_clean()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_report_is_idle() {
        let report = SettlementReport::new(7);
        assert_eq!(report.height, 7);
        assert!(report.is_idle());
        assert!(report.is_clean());
    }

    #[test]
    fn failure_makes_report_unclean() {
        let mut report = SettlementReport::new(1);
        report.failures.push(SettlementFailure {
            phase: SettlementPhase::SettleLeases,
            resource_id: ResourceId::parse("mn1").unwrap(),
            error: MedianodeError::Internal("ledger offline".into()),
        });
        assert!(!report.is_clean());
        assert!(!report.is_idle());
    }

    #[test]
    fn phase_display() {
        assert_eq!(SettlementPhase::SettleLeases.to_string(), "SETTLE_LEASES");
        assert_eq!(
            SettlementPhase::ReleaseDeposits.to_string(),
            "RELEASE_DEPOSITS"
        );
    }
}
