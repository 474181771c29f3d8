//! Structured events emitted for off-chain indexing.
//!
//! Every successful state change (and every isolated settlement failure)
//! produces one [`Event`] tagged with the block height it happened in.

use serde::{Deserialize, Serialize};

use crate::{AccountId, Coin, ResourceId, ResourceStatus};

/// The kind of state change an event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    ResourceRegistered,
    ResourceUpdated,
    ResourceDeposited,
    ResourceLeased,
    LeaseExtended,
    LeaseCancelled,
    ResourceClosed,
    /// A settlement tick paid accrued hours out of escrow.
    LeasePaymentSettled,
    /// The final tick settled the whole contract; the lease was removed.
    LeaseCompleted,
    /// Deposits of a closed resource were refunded.
    DepositsReleased,
    /// A settlement step failed and was rolled back; it is retried next block.
    SettlementFailed,
    ParamsUpdated,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ResourceRegistered => write!(f, "RESOURCE_REGISTERED"),
            Self::ResourceUpdated => write!(f, "RESOURCE_UPDATED"),
            Self::ResourceDeposited => write!(f, "RESOURCE_DEPOSITED"),
            Self::ResourceLeased => write!(f, "RESOURCE_LEASED"),
            Self::LeaseExtended => write!(f, "LEASE_EXTENDED"),
            Self::LeaseCancelled => write!(f, "LEASE_CANCELLED"),
            Self::ResourceClosed => write!(f, "RESOURCE_CLOSED"),
            Self::LeasePaymentSettled => write!(f, "LEASE_PAYMENT_SETTLED"),
            Self::LeaseCompleted => write!(f, "LEASE_COMPLETED"),
            Self::DepositsReleased => write!(f, "DEPOSITS_RELEASED"),
            Self::SettlementFailed => write!(f, "SETTLEMENT_FAILED"),
            Self::ParamsUpdated => write!(f, "PARAMS_UPDATED"),
        }
    }
}

/// Payload of an event. Field names mirror the records they describe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPayload {
    Resource {
        owner: AccountId,
        status: ResourceStatus,
        total_deposit: Coin,
    },
    Deposit {
        depositor: AccountId,
        amount: Coin,
        total_deposit: Coin,
        status: ResourceStatus,
    },
    Lease {
        lessee: AccountId,
        leased_hours: u64,
        amount: Coin,
        total_lease_amount: Coin,
    },
    Cancellation {
        lessee: AccountId,
        settled: Coin,
        refunded: Coin,
    },
    Settlement {
        owner: AccountId,
        payment: Coin,
        commission: Coin,
        settled_lease_amount: Coin,
        total_lease_amount: Coin,
    },
    Release {
        refunds: Vec<(AccountId, Coin)>,
    },
    Failure {
        reason: String,
    },
    Params,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub event_type: EventType,
    pub height: u64,
    /// The resource concerned; `None` for module-wide events.
    pub resource_id: Option<ResourceId>,
    pub payload: EventPayload,
}

impl Event {
    #[must_use]
    pub fn new(
        event_type: EventType,
        height: u64,
        resource_id: Option<ResourceId>,
        payload: EventPayload,
    ) -> Self {
        Self {
            event_type,
            height,
            resource_id,
            payload,
        }
    }
}
