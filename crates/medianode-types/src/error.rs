//! Error types for the medianode leasing engine.
//!
//! All errors use the `MN_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Lookup errors
//! - 2xx: Authorization errors
//! - 3xx: Lifecycle / status errors
//! - 4xx: Amount and balance errors
//! - 5xx: Duration errors
//! - 6xx: Validation errors
//! - 7xx: Safety invariant errors
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{ResourceId, ResourceStatus};

/// Central error enum for all medianode operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MedianodeError {
    // =================================================================
    // Lookup Errors (1xx)
    // =================================================================
    /// No resource is registered under this id.
    #[error("MN_ERR_100: Resource not found: {0}")]
    ResourceNotFound(ResourceId),

    /// The resource has no lease.
    #[error("MN_ERR_101: Lease not found for resource: {0}")]
    LeaseNotFound(ResourceId),

    // =================================================================
    // Authorization Errors (2xx)
    // =================================================================
    /// The sender is not the owner / lessee / authority the operation requires.
    #[error("MN_ERR_200: Unauthorized: {reason}")]
    Unauthorized { reason: String },

    // =================================================================
    // Lifecycle Errors (3xx)
    // =================================================================
    /// The operation is illegal for the resource's current status.
    #[error("MN_ERR_300: Invalid status for {id}: expected {expected}, got {actual}")]
    InvalidStatus {
        id: ResourceId,
        expected: ResourceStatus,
        actual: ResourceStatus,
    },

    /// The resource is currently leased.
    #[error("MN_ERR_301: Resource already leased: {0}")]
    AlreadyLeased(ResourceId),

    /// A resource with this id already exists.
    #[error("MN_ERR_302: Resource already exists: {0}")]
    AlreadyExists(ResourceId),

    /// The settlement engine already ran for this height.
    #[error("MN_ERR_303: Block already settled: height {0}")]
    BlockAlreadySettled(u64),

    // =================================================================
    // Amount Errors (4xx)
    // =================================================================
    /// Mismatched, mis-denominated, or non-positive amount.
    #[error("MN_ERR_400: Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// The deposit is below the required minimum.
    #[error("MN_ERR_401: Insufficient deposit: need {needed}, got {provided}")]
    InsufficientDeposit { needed: Decimal, provided: Decimal },

    /// The ledger rejected a transfer for lack of funds.
    #[error("MN_ERR_402: Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Decimal, available: Decimal },

    // =================================================================
    // Duration Errors (5xx)
    // =================================================================
    /// Lease hours outside the parameter bounds.
    #[error("MN_ERR_500: Invalid lease hours {hours}: must be within [{min}, {max}]")]
    InvalidLeaseHours { hours: u64, min: u64, max: u64 },

    // =================================================================
    // Validation Errors (6xx)
    // =================================================================
    #[error("MN_ERR_600: Invalid params: {reason}")]
    InvalidParams { reason: String },

    #[error("MN_ERR_601: Invalid genesis: {reason}")]
    InvalidGenesis { reason: String },

    #[error("MN_ERR_602: Invalid address: {reason}")]
    InvalidAddress { reason: String },

    /// A resource or lease record failed field validation.
    #[error("MN_ERR_603: Invalid resource: {reason}")]
    InvalidResource { reason: String },

    // =================================================================
    // Safety Errors (7xx)
    // =================================================================
    /// A module invariant does not hold — critical safety alert.
    #[error("MN_ERR_700: Invariant violation: {reason}")]
    InvariantViolation { reason: String },

    /// Ledger supply is not conserved — critical safety alert.
    #[error("MN_ERR_701: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("MN_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("MN_ERR_901: Serialization error: {0}")]
    Serialization(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, MedianodeError>;

impl From<serde_json::Error> for MedianodeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
