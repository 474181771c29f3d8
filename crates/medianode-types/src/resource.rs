//! # Resource — a leasable medianode
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────┐  deposits ≥ min   ┌────────┐
//!   │ PENDING ├──────────────────▶│ ACTIVE │◀──┐ lease settled / cancelled
//!   └────┬────┘                   └───┬─┬──┘   │
//!        │ close                close │ │ lease│
//!        ▼                            │ ▼      │
//!   ┌────────┐◀───────────────────────┘ (leased = true)
//!   │ CLOSED │
//!   └────────┘
//! ```
//!
//! `Leased` is a sub-state of `Active`, carried by the `leased` flag rather
//! than a separate status. `Closed` is terminal; deposits stay recorded until
//! the settlement engine releases them after the lock period.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, Coin, MedianodeError, ResourceId, Result, checked_sum, constants};

/// Lifecycle status of a resource.
///
/// Transitions are **monotonic** (never go backwards):
/// - `Pending → Active` (aggregate deposit reached `min_deposit`)
/// - `Pending → Closed`, `Active → Closed` (owner closed the node)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceStatus {
    /// Registered, aggregate deposit still below `min_deposit`.
    Pending,
    /// Fully deposited and available for lease (or currently leased).
    Active,
    /// Closed by the owner. Terminal.
    Closed,
}

impl ResourceStatus {
    /// Can a resource in this status move to `target`?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Active | Self::Closed) | (Self::Active, Self::Closed)
        )
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Active => write!(f, "ACTIVE"),
            Self::Closed => write!(f, "CLOSED"),
        }
    }
}

/// Descriptive, owner-editable node metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInfo {
    pub moniker: String,
    pub description: String,
    pub contact: String,
}

impl ResourceInfo {
    /// # Errors
    /// Returns `InvalidResource` if any field is too long or the moniker is empty.
    pub fn validate(&self) -> Result<()> {
        if self.moniker.trim().is_empty() {
            return Err(invalid("moniker must not be empty"));
        }
        check_len("moniker", &self.moniker, constants::MAX_MONIKER_LEN)?;
        check_len("description", &self.description, constants::MAX_DESCRIPTION_LEN)?;
        check_len("contact", &self.contact, constants::MAX_CONTACT_LEN)
    }
}

/// Advertised hardware of the node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareSpecs {
    pub cpus: u32,
    pub ram_gb: u32,
    pub storage_gb: u64,
}

impl HardwareSpecs {
    /// # Errors
    /// Returns `InvalidResource` if any capacity is zero.
    pub fn validate(&self) -> Result<()> {
        if self.cpus == 0 || self.ram_gb == 0 || self.storage_gb == 0 {
            return Err(invalid("hardware specs must be non-zero"));
        }
        Ok(())
    }
}

/// One deposit made towards a resource, refunded individually on release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub depositor: AccountId,
    pub amount: Coin,
    pub deposited_at: DateTime<Utc>,
}

/// A registered medianode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub owner: AccountId,
    pub url: String,
    pub info: ResourceInfo,
    pub hardware_specs: HardwareSpecs,
    pub price_per_hour: Coin,
    pub status: ResourceStatus,
    /// `true` iff a lease for this resource exists.
    pub leased: bool,
    pub deposits: Vec<Deposit>,
    pub registered_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Resource {
    /// Aggregate of all recorded deposits, in the price denomination.
    ///
    /// # Errors
    /// Returns `InvalidAmount` if a deposit is in a foreign denom or the sum
    /// overflows.
    pub fn total_deposit(&self) -> Result<Coin> {
        checked_sum(
            &self.price_per_hour.denom,
            self.deposits.iter().map(|d| &d.amount),
        )
    }

    /// Active and not leased.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.status == ResourceStatus::Active && !self.leased
    }

    /// Move to `target`, enforcing the state machine.
    ///
    /// # Errors
    /// Returns `InvalidStatus` if the transition is not allowed.
    pub fn transition(&mut self, target: ResourceStatus) -> Result<()> {
        if !self.status.can_transition_to(target) {
            return Err(MedianodeError::InvalidStatus {
                id: self.id.clone(),
                expected: target,
                actual: self.status,
            });
        }
        self.status = target;
        Ok(())
    }

    /// Require the resource to be in `expected` status.
    ///
    /// # Errors
    /// Returns `InvalidStatus` otherwise.
    pub fn expect_status(&self, expected: ResourceStatus) -> Result<()> {
        if self.status != expected {
            return Err(MedianodeError::InvalidStatus {
                id: self.id.clone(),
                expected,
                actual: self.status,
            });
        }
        Ok(())
    }

    /// Field validation used by genesis import.
    ///
    /// # Errors
    /// Returns `InvalidResource` / `InvalidAmount` naming the bad field.
    pub fn validate(&self) -> Result<()> {
        validate_url(&self.url)?;
        self.info.validate()?;
        self.hardware_specs.validate()?;
        self.price_per_hour.validate_positive()?;
        for deposit in &self.deposits {
            deposit.amount.validate_positive()?;
            deposit.amount.expect_denom(&self.price_per_hour.denom)?;
        }
        self.total_deposit()?;
        match (self.status, self.closed_at) {
            (ResourceStatus::Closed, None) => {
                return Err(invalid(&format!("{} is closed without closed_at", self.id)));
            }
            (ResourceStatus::Pending | ResourceStatus::Active, Some(_)) => {
                return Err(invalid(&format!("{} has closed_at but is open", self.id)));
            }
            _ => {}
        }
        if self.leased && self.status != ResourceStatus::Active {
            return Err(invalid(&format!(
                "{} is leased while {}",
                self.id, self.status
            )));
        }
        Ok(())
    }
}

/// # Errors
/// Returns `InvalidResource` unless the URL is a non-empty http(s) URL.
pub fn validate_url(url: &str) -> Result<()> {
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(invalid("url must start with http:// or https://"));
    }
    if url.contains(char::is_whitespace) {
        return Err(invalid("url must not contain whitespace"));
    }
    check_len("url", url, constants::MAX_URL_LEN)
}

fn check_len(field: &str, value: &str, max: usize) -> Result<()> {
    if value.len() > max {
        return Err(invalid(&format!("{field} exceeds {max} bytes")));
    }
    Ok(())
}

fn invalid(reason: &str) -> MedianodeError {
    MedianodeError::InvalidResource {
        reason: reason.to_string(),
    }
}

/// Dummy resource for testing. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Resource {
    #[must_use]
    pub fn dummy(id: &str, owner: AccountId, price: i64, status: ResourceStatus) -> Self {
        use rust_decimal::Decimal;

        let registered_at = DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default();
        Self {
            id: ResourceId::parse(id).unwrap_or_else(|_| ResourceId::from_counter(1)),
            owner: owner.clone(),
            url: "https://node.example.com".to_string(),
            info: ResourceInfo {
                moniker: "test-node".to_string(),
                description: String::new(),
                contact: String::new(),
            },
            hardware_specs: HardwareSpecs {
                cpus: 8,
                ram_gb: 32,
                storage_gb: 1_000,
            },
            price_per_hour: Coin::new(constants::DEFAULT_DENOM, Decimal::new(price, 0)),
            status,
            leased: false,
            deposits: vec![Deposit {
                depositor: owner,
                amount: Coin::new(
                    constants::DEFAULT_DENOM,
                    Decimal::new(constants::DEFAULT_MIN_DEPOSIT, 0),
                ),
                deposited_at: registered_at,
            }],
            registered_at,
            closed_at: (status == ResourceStatus::Closed).then_some(registered_at),
        }
    }
}
