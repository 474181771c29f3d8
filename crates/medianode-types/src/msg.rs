//! State-changing messages consumed by the keeper.
//!
//! Every message carries an already-validated `sender` and offers a
//! stateless [`validate_basic`](MsgRegisterResource::validate_basic) that
//! the keeper runs before touching any state.

use serde::{Deserialize, Serialize};

use crate::{
    AccountId, Coin, HardwareSpecs, Lease, MedianodeError, Params, ResourceId, ResourceInfo,
    ResourceStatus, Result, validate_url,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgRegisterResource {
    /// Client-chosen id; generated from the module counter when `None`.
    pub id: Option<ResourceId>,
    pub url: String,
    pub info: ResourceInfo,
    pub hardware_specs: HardwareSpecs,
    pub price_per_hour: Coin,
    pub deposit: Coin,
    pub sender: AccountId,
}

impl MsgRegisterResource {
    /// # Errors
    /// Returns the first field-level validation failure.
    pub fn validate_basic(&self) -> Result<()> {
        validate_url(&self.url)?;
        self.info.validate()?;
        self.hardware_specs.validate()?;
        self.price_per_hour.validate_positive()?;
        self.deposit.validate_positive()?;
        self.deposit.expect_denom(&self.price_per_hour.denom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgRegisterResourceResponse {
    pub id: ResourceId,
    pub status: ResourceStatus,
}

/// Owner edit; `None` fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateResource {
    pub id: ResourceId,
    pub url: Option<String>,
    pub info: Option<ResourceInfo>,
    pub hardware_specs: Option<HardwareSpecs>,
    pub price_per_hour: Option<Coin>,
    pub sender: AccountId,
}

impl MsgUpdateResource {
    /// # Errors
    /// Returns the first field-level validation failure, or `InvalidResource`
    /// if nothing would change.
    pub fn validate_basic(&self) -> Result<()> {
        if self.url.is_none()
            && self.info.is_none()
            && self.hardware_specs.is_none()
            && self.price_per_hour.is_none()
        {
            return Err(MedianodeError::InvalidResource {
                reason: "update carries no fields".into(),
            });
        }
        if let Some(url) = &self.url {
            validate_url(url)?;
        }
        if let Some(info) = &self.info {
            info.validate()?;
        }
        if let Some(specs) = &self.hardware_specs {
            specs.validate()?;
        }
        if let Some(price) = &self.price_per_hour {
            price.validate_positive()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgDepositResource {
    pub id: ResourceId,
    pub amount: Coin,
    pub sender: AccountId,
}

impl MsgDepositResource {
    /// # Errors
    /// Returns `InvalidAmount` unless the amount is positive.
    pub fn validate_basic(&self) -> Result<()> {
        self.amount.validate_positive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgDepositResourceResponse {
    pub total_deposit: Coin,
    pub status: ResourceStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgLeaseResource {
    pub id: ResourceId,
    pub lease_hours: u64,
    pub amount: Coin,
    pub sender: AccountId,
}

impl MsgLeaseResource {
    /// # Errors
    /// Returns `InvalidLeaseHours` for zero hours, `InvalidAmount` for a bad amount.
    pub fn validate_basic(&self) -> Result<()> {
        validate_hours(self.lease_hours)?;
        self.amount.validate_positive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgExtendLease {
    pub id: ResourceId,
    pub lease_hours: u64,
    pub amount: Coin,
    pub sender: AccountId,
}

impl MsgExtendLease {
    /// # Errors
    /// Returns `InvalidLeaseHours` for zero hours, `InvalidAmount` for a bad amount.
    pub fn validate_basic(&self) -> Result<()> {
        validate_hours(self.lease_hours)?;
        self.amount.validate_positive()
    }
}

/// Response of [`MsgLeaseResource`] and [`MsgExtendLease`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgLeaseResponse {
    pub lease: Lease,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCancelLease {
    pub id: ResourceId,
    pub sender: AccountId,
}

impl MsgCancelLease {
    /// Id and sender are checked when constructed, so this never fails.
    ///
    /// # Errors
    /// None today; kept so every handler runs the same pre-check.
    pub fn validate_basic(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCancelLeaseResponse {
    /// Amount settled to the owner during cancellation.
    pub settled: Coin,
    /// Unearned amount returned to the lessee.
    pub refunded: Coin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCloseResource {
    pub id: ResourceId,
    pub sender: AccountId,
}

impl MsgCloseResource {
    /// Id and sender are checked when constructed, so this never fails.
    ///
    /// # Errors
    /// None today; kept so every handler runs the same pre-check.
    pub fn validate_basic(&self) -> Result<()> {
        Ok(())
    }
}

/// Governance-only parameter update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateParams {
    pub params: Params,
    pub authority: AccountId,
}

impl MsgUpdateParams {
    /// # Errors
    /// Returns `InvalidParams` if the params violate their bounds.
    pub fn validate_basic(&self) -> Result<()> {
        self.params.validate()
    }
}

fn validate_hours(hours: u64) -> Result<()> {
    if hours == 0 {
        return Err(MedianodeError::InvalidLeaseHours {
            hours,
            min: 1,
            max: u64::MAX,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn coin(n: i64) -> Coin {
        Coin::new("umedia", Decimal::new(n, 0))
    }

    fn register() -> MsgRegisterResource {
        MsgRegisterResource {
            id: None,
            url: "https://node.example.com".into(),
            info: ResourceInfo {
                moniker: "edge".into(),
                ..ResourceInfo::default()
            },
            hardware_specs: HardwareSpecs {
                cpus: 4,
                ram_gb: 16,
                storage_gb: 500,
            },
            price_per_hour: coin(10),
            deposit: coin(100),
            sender: AccountId::from_seed(1),
        }
    }

    #[test]
    fn register_validate_basic() {
        assert!(register().validate_basic().is_ok());

        let mut msg = register();
        msg.deposit = Coin::new("uatom", Decimal::new(100, 0));
        assert!(matches!(
            msg.validate_basic(),
            Err(MedianodeError::InvalidAmount { .. })
        ));

        let mut msg = register();
        msg.price_per_hour = coin(0);
        assert!(msg.validate_basic().is_err());

        let mut msg = register();
        msg.hardware_specs.cpus = 0;
        assert!(msg.validate_basic().is_err());
    }

    #[test]
    fn empty_update_rejected() {
        let msg = MsgUpdateResource {
            id: ResourceId::parse("mn1").unwrap(),
            url: None,
            info: None,
            hardware_specs: None,
            price_per_hour: None,
            sender: AccountId::from_seed(1),
        };
        assert!(msg.validate_basic().is_err());
    }

    #[test]
    fn zero_hour_lease_rejected() {
        let msg = MsgLeaseResource {
            id: ResourceId::parse("mn1").unwrap(),
            lease_hours: 0,
            amount: coin(10),
            sender: AccountId::from_seed(2),
        };
        assert!(matches!(
            msg.validate_basic(),
            Err(MedianodeError::InvalidLeaseHours { hours: 0, .. })
        ));
    }

    #[test]
    fn cancel_and_close_pass_basic_validation() {
        let id = ResourceId::parse("mn1").unwrap();
        let sender = AccountId::from_seed(2);
        let cancel = MsgCancelLease {
            id: id.clone(),
            sender: sender.clone(),
        };
        assert!(cancel.validate_basic().is_ok());
        assert!(MsgCloseResource { id, sender }.validate_basic().is_ok());
    }
}
