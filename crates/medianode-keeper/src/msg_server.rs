//! Message handlers: the lease lifecycle state machine.
//!
//! Every handler runs the message's stateless `validate_basic`, then does
//! all of its reads, checks and writes inside [`Keeper::branch`]. A handler
//! that fails leaves store, ledger and events exactly as it found them.

use medianode_bank::Ledger;
use medianode_types::{
    AccountId, Coin, Context, Deposit, EventPayload, EventType, Lease, MedianodeError,
    MsgCancelLease, MsgCancelLeaseResponse, MsgCloseResource, MsgDepositResource,
    MsgDepositResourceResponse, MsgExtendLease, MsgLeaseResource, MsgLeaseResponse,
    MsgRegisterResource, MsgRegisterResourceResponse, MsgUpdateParams, MsgUpdateResource,
    Resource, ResourceId, ResourceStatus, Result,
};

use crate::keeper::{Keeper, SettleOutcome};

impl<L: Ledger> Keeper<L> {
    /// Register a new resource and escrow its initial deposit.
    ///
    /// # Errors
    /// `InvalidAmount` on a foreign denom, `InsufficientDeposit` below the
    /// initial minimum, `AlreadyExists` on a taken id, ledger errors.
    pub fn register_resource(
        &mut self,
        ctx: &Context,
        msg: &MsgRegisterResource,
    ) -> Result<MsgRegisterResourceResponse> {
        msg.validate_basic()?;
        self.branch(|k| {
            let params = k.registry.params()?;
            msg.price_per_hour.expect_denom(params.denom())?;
            msg.deposit.expect_denom(params.denom())?;

            let min_initial = params.min_initial_deposit();
            if msg.deposit.amount < min_initial.amount {
                return Err(MedianodeError::InsufficientDeposit {
                    needed: min_initial.amount,
                    provided: msg.deposit.amount,
                });
            }

            let id = match &msg.id {
                Some(id) if k.registry.has_resource(id) => {
                    return Err(MedianodeError::AlreadyExists(id.clone()));
                }
                Some(id) => id.clone(),
                None => k.allocate_resource_id(),
            };

            let escrow = k.config.escrow_account.clone();
            k.send(&msg.sender, &escrow, &msg.deposit)?;

            let status = if msg.deposit.amount >= params.min_deposit.amount {
                ResourceStatus::Active
            } else {
                ResourceStatus::Pending
            };
            let resource = Resource {
                id: id.clone(),
                owner: msg.sender.clone(),
                url: msg.url.clone(),
                info: msg.info.clone(),
                hardware_specs: msg.hardware_specs,
                price_per_hour: msg.price_per_hour.clone(),
                status,
                leased: false,
                deposits: vec![Deposit {
                    depositor: msg.sender.clone(),
                    amount: msg.deposit.clone(),
                    deposited_at: ctx.block_time,
                }],
                registered_at: ctx.block_time,
                closed_at: None,
            };
            resource.validate()?;
            k.registry.set_resource(&resource)?;

            tracing::info!(
                resource = %id,
                owner = msg.sender.short(),
                status = %status,
                deposit = %msg.deposit,
                "Resource registered"
            );
            k.emit(
                ctx,
                EventType::ResourceRegistered,
                Some(&id),
                resource_payload(&resource)?,
            );
            Ok(MsgRegisterResourceResponse { id, status })
        })
    }

    /// Owner edit of url, info, hardware specs or price. An existing lease
    /// keeps the price it was signed at.
    ///
    /// # Errors
    /// `ResourceNotFound`, `Unauthorized` unless owner, `InvalidStatus` if
    /// closed, `InvalidAmount` on a foreign price denom.
    pub fn update_resource(&mut self, ctx: &Context, msg: &MsgUpdateResource) -> Result<()> {
        msg.validate_basic()?;
        self.branch(|k| {
            let mut resource = k.registry.resource(&msg.id)?;
            ensure_sender(&msg.sender, &resource.owner, "only the owner may update a resource")?;
            if resource.status == ResourceStatus::Closed {
                return Err(MedianodeError::InvalidStatus {
                    id: resource.id.clone(),
                    expected: ResourceStatus::Active,
                    actual: resource.status,
                });
            }

            if let Some(url) = &msg.url {
                resource.url.clone_from(url);
            }
            if let Some(info) = &msg.info {
                resource.info = info.clone();
            }
            if let Some(specs) = msg.hardware_specs {
                resource.hardware_specs = specs;
            }
            if let Some(price) = &msg.price_per_hour {
                price.expect_denom(k.registry.params()?.denom())?;
                resource.price_per_hour = price.clone();
            }
            resource.validate()?;
            k.registry.set_resource(&resource)?;

            tracing::info!(resource = %msg.id, "Resource updated");
            k.emit(
                ctx,
                EventType::ResourceUpdated,
                Some(&msg.id),
                resource_payload(&resource)?,
            );
            Ok(())
        })
    }

    /// Top up the deposit of a pending resource. Anyone may deposit; the
    /// depositor is recorded for the eventual refund.
    ///
    /// # Errors
    /// `ResourceNotFound`, `InvalidStatus` unless Pending, `InvalidAmount`
    /// on a foreign denom, ledger errors.
    pub fn deposit_resource(
        &mut self,
        ctx: &Context,
        msg: &MsgDepositResource,
    ) -> Result<MsgDepositResourceResponse> {
        msg.validate_basic()?;
        self.branch(|k| {
            let params = k.registry.params()?;
            let mut resource = k.registry.resource(&msg.id)?;
            resource.expect_status(ResourceStatus::Pending)?;
            msg.amount.expect_denom(params.denom())?;

            let escrow = k.config.escrow_account.clone();
            k.send(&msg.sender, &escrow, &msg.amount)?;
            resource.deposits.push(Deposit {
                depositor: msg.sender.clone(),
                amount: msg.amount.clone(),
                deposited_at: ctx.block_time,
            });

            let total_deposit = resource.total_deposit()?;
            if total_deposit.amount >= params.min_deposit.amount {
                resource.transition(ResourceStatus::Active)?;
                tracing::info!(
                    resource = %msg.id,
                    total_deposit = %total_deposit,
                    "Resource activated"
                );
            }
            k.registry.set_resource(&resource)?;

            tracing::info!(
                resource = %msg.id,
                depositor = msg.sender.short(),
                amount = %msg.amount,
                "Resource deposit"
            );
            k.emit(
                ctx,
                EventType::ResourceDeposited,
                Some(&msg.id),
                EventPayload::Deposit {
                    depositor: msg.sender.clone(),
                    amount: msg.amount.clone(),
                    total_deposit: total_deposit.clone(),
                    status: resource.status,
                },
            );
            Ok(MsgDepositResourceResponse {
                total_deposit,
                status: resource.status,
            })
        })
    }

    /// Lease an available resource, prepaying the whole contract into escrow.
    ///
    /// # Errors
    /// `ResourceNotFound`, `InvalidStatus` unless Active, `AlreadyLeased`,
    /// `InvalidLeaseHours` outside the param bounds, `InvalidAmount` unless
    /// the amount is exactly price × hours, ledger errors.
    pub fn lease_resource(
        &mut self,
        ctx: &Context,
        msg: &MsgLeaseResource,
    ) -> Result<MsgLeaseResponse> {
        msg.validate_basic()?;
        self.branch(|k| {
            let params = k.registry.params()?;
            let mut resource = k.registry.resource(&msg.id)?;
            resource.expect_status(ResourceStatus::Active)?;
            if resource.leased {
                return Err(MedianodeError::AlreadyLeased(msg.id.clone()));
            }
            params.check_lease_hours(msg.lease_hours)?;
            let expected = resource.price_per_hour.checked_times(msg.lease_hours)?;
            if msg.amount != expected {
                return Err(MedianodeError::InvalidAmount {
                    reason: format!(
                        "lease of {}h at {} costs {expected}, got {}",
                        msg.lease_hours, resource.price_per_hour, msg.amount
                    ),
                });
            }

            let escrow = k.config.escrow_account.clone();
            k.send(&msg.sender, &escrow, &msg.amount)?;

            let lease = Lease::new(
                msg.id.clone(),
                msg.sender.clone(),
                resource.owner.clone(),
                resource.price_per_hour.clone(),
                msg.lease_hours,
                ctx.block_time,
            )?;
            k.registry.set_lease(&lease)?;
            resource.leased = true;
            k.registry.set_resource(&resource)?;

            tracing::info!(
                resource = %msg.id,
                lessee = msg.sender.short(),
                hours = msg.lease_hours,
                amount = %msg.amount,
                "Resource leased"
            );
            k.emit(
                ctx,
                EventType::ResourceLeased,
                Some(&msg.id),
                EventPayload::Lease {
                    lessee: msg.sender.clone(),
                    leased_hours: lease.leased_hours,
                    amount: msg.amount.clone(),
                    total_lease_amount: lease.total_lease_amount.clone(),
                },
            );
            Ok(MsgLeaseResponse { lease })
        })
    }

    /// Buy `lease_hours` more on an existing lease at its frozen price.
    ///
    /// # Errors
    /// `LeaseNotFound`, `Unauthorized` unless lessee, `InvalidLeaseHours` if
    /// the total would exceed the max, `InvalidAmount` on a price mismatch.
    pub fn extend_lease(&mut self, ctx: &Context, msg: &MsgExtendLease) -> Result<MsgLeaseResponse> {
        msg.validate_basic()?;
        self.branch(|k| {
            let params = k.registry.params()?;
            let mut lease = k.registry.lease(&msg.id)?;
            ensure_sender(&msg.sender, &lease.lessee, "only the lessee may extend a lease")?;

            let hours = lease.leased_hours.saturating_add(msg.lease_hours);
            if hours > params.max_lease_hours {
                return Err(MedianodeError::InvalidLeaseHours {
                    hours,
                    min: params.min_lease_hours,
                    max: params.max_lease_hours,
                });
            }
            let expected = lease.price_per_hour.checked_times(msg.lease_hours)?;
            if msg.amount != expected {
                return Err(MedianodeError::InvalidAmount {
                    reason: format!(
                        "extension of {}h at {} costs {expected}, got {}",
                        msg.lease_hours, lease.price_per_hour, msg.amount
                    ),
                });
            }

            let escrow = k.config.escrow_account.clone();
            lease.extend(msg.lease_hours)?;
            k.send(&msg.sender, &escrow, &msg.amount)?;
            k.registry.set_lease(&lease)?;

            tracing::info!(
                resource = %msg.id,
                extra_hours = msg.lease_hours,
                leased_hours = lease.leased_hours,
                "Lease extended"
            );
            k.emit(
                ctx,
                EventType::LeaseExtended,
                Some(&msg.id),
                EventPayload::Lease {
                    lessee: lease.lessee.clone(),
                    leased_hours: lease.leased_hours,
                    amount: msg.amount.clone(),
                    total_lease_amount: lease.total_lease_amount.clone(),
                },
            );
            Ok(MsgLeaseResponse { lease })
        })
    }

    /// End a lease early. Accrued whole hours are paid to the owner first,
    /// then the unearned remainder goes back to the lessee.
    ///
    /// # Errors
    /// `LeaseNotFound`, `Unauthorized` unless lessee, ledger errors.
    pub fn cancel_lease(
        &mut self,
        ctx: &Context,
        msg: &MsgCancelLease,
    ) -> Result<MsgCancelLeaseResponse> {
        msg.validate_basic()?;
        self.branch(|k| {
            let lease = k.registry.lease(&msg.id)?;
            ensure_sender(&msg.sender, &lease.lessee, "only the lessee may cancel a lease")?;
            let denom = lease.total_lease_amount.denom.clone();

            let outcome = k.settle_lease(ctx, &msg.id)?;
            let settled = outcome
                .amount()
                .cloned()
                .unwrap_or_else(|| Coin::zero(denom.clone()));

            let refunded = if let SettleOutcome::Completed { .. } = outcome {
                // The catch-up settlement consumed the whole contract.
                Coin::zero(denom)
            } else {
                let lease = k.registry.lease(&msg.id)?;
                let refund = lease.unsettled_amount();
                let escrow = k.config.escrow_account.clone();
                k.send(&escrow, &lease.lessee, &refund)?;
                k.registry.delete_lease(&msg.id)?;
                let mut resource = k.registry.resource(&msg.id)?;
                resource.leased = false;
                k.registry.set_resource(&resource)?;
                refund
            };

            tracing::info!(
                resource = %msg.id,
                lessee = msg.sender.short(),
                settled = %settled,
                refunded = %refunded,
                "Lease cancelled"
            );
            k.emit(
                ctx,
                EventType::LeaseCancelled,
                Some(&msg.id),
                EventPayload::Cancellation {
                    lessee: msg.sender.clone(),
                    settled: settled.clone(),
                    refunded: refunded.clone(),
                },
            );
            Ok(MsgCancelLeaseResponse { settled, refunded })
        })
    }

    /// Close a resource for good. Deposits stay in escrow until the
    /// settlement engine releases them after the lock period.
    ///
    /// # Errors
    /// `ResourceNotFound`, `Unauthorized` unless owner, `InvalidStatus` if
    /// already closed, `AlreadyLeased` while a lease is running.
    pub fn close_resource(&mut self, ctx: &Context, msg: &MsgCloseResource) -> Result<()> {
        msg.validate_basic()?;
        self.branch(|k| {
            let mut resource = k.registry.resource(&msg.id)?;
            ensure_sender(&msg.sender, &resource.owner, "only the owner may close a resource")?;
            if resource.status == ResourceStatus::Closed {
                return Err(MedianodeError::InvalidStatus {
                    id: resource.id.clone(),
                    expected: ResourceStatus::Active,
                    actual: resource.status,
                });
            }
            if resource.leased {
                return Err(MedianodeError::AlreadyLeased(msg.id.clone()));
            }
            resource.transition(ResourceStatus::Closed)?;
            resource.closed_at = Some(ctx.block_time);
            k.registry.set_resource(&resource)?;

            let total_deposit = resource.total_deposit()?;
            tracing::info!(
                resource = %msg.id,
                total_deposit = %total_deposit,
                "Resource closed"
            );
            k.emit(
                ctx,
                EventType::ResourceClosed,
                Some(&msg.id),
                EventPayload::Resource {
                    owner: resource.owner.clone(),
                    status: resource.status,
                    total_deposit,
                },
            );
            Ok(())
        })
    }

    /// Replace the module params. Governance only.
    ///
    /// # Errors
    /// `InvalidParams` on out-of-bounds params or a denom change while
    /// resources exist, `Unauthorized` unless sent by the authority.
    pub fn update_params(&mut self, ctx: &Context, msg: &MsgUpdateParams) -> Result<()> {
        msg.validate_basic()?;
        self.branch(|k| {
            ensure_sender(&msg.authority, &k.config.authority, "only the authority may update params")?;
            let current = k.registry.params()?;
            if current.denom() != msg.params.denom() && !k.registry.resources()?.is_empty() {
                return Err(MedianodeError::InvalidParams {
                    reason: format!(
                        "cannot change denom from {} to {} while resources exist",
                        current.denom(),
                        msg.params.denom()
                    ),
                });
            }
            k.registry.set_params(&msg.params)?;

            tracing::info!(
                min_lease_hours = msg.params.min_lease_hours,
                max_lease_hours = msg.params.max_lease_hours,
                min_deposit = %msg.params.min_deposit,
                lease_commission = %msg.params.lease_commission,
                "Params updated"
            );
            k.emit(ctx, EventType::ParamsUpdated, None, EventPayload::Params);
            Ok(())
        })
    }

    /// Next counter-generated id not already taken by a client-chosen one.
    fn allocate_resource_id(&mut self) -> ResourceId {
        loop {
            let id = ResourceId::from_counter(self.registry.next_resource_id());
            if !self.registry.has_resource(&id) {
                return id;
            }
        }
    }
}

fn ensure_sender(sender: &AccountId, expected: &AccountId, reason: &str) -> Result<()> {
    if sender != expected {
        return Err(MedianodeError::Unauthorized {
            reason: reason.to_string(),
        });
    }
    Ok(())
}

fn resource_payload(resource: &Resource) -> Result<EventPayload> {
    Ok(EventPayload::Resource {
        owner: resource.owner.clone(),
        status: resource.status,
        total_deposit: resource.total_deposit()?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};
    use medianode_bank::Bank;
    use medianode_types::{HardwareSpecs, Params, ResourceInfo};
    use rust_decimal::Decimal;

    use super::*;
    use crate::KeeperConfig;

    fn coin(n: i64) -> Coin {
        Coin::new("umedia", Decimal::new(n, 0))
    }

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn ctx(hours: i64) -> Context {
        Context::new(1 + hours.unsigned_abs(), t0() + Duration::hours(hours))
    }

    fn owner() -> AccountId {
        AccountId::from_seed(1)
    }

    fn lessee() -> AccountId {
        AccountId::from_seed(2)
    }

    fn authority() -> AccountId {
        AccountId::from_seed(99)
    }

    fn keeper() -> Keeper<Bank> {
        let params = Params {
            min_deposit: coin(100),
            ..Params::default()
        };
        let mut bank = Bank::new();
        bank.mint(&owner(), &coin(10_000)).unwrap();
        bank.mint(&lessee(), &coin(10_000)).unwrap();
        Keeper::with_params(KeeperConfig::new(authority()), bank, &params).unwrap()
    }

    fn register_msg(deposit: i64) -> MsgRegisterResource {
        MsgRegisterResource {
            id: None,
            url: "https://node-1.example.com".into(),
            info: ResourceInfo {
                moniker: "node-1".into(),
                ..ResourceInfo::default()
            },
            hardware_specs: HardwareSpecs {
                cpus: 4,
                ram_gb: 16,
                storage_gb: 500,
            },
            price_per_hour: coin(10),
            deposit: coin(deposit),
            sender: owner(),
        }
    }

    fn lease_msg(id: &ResourceId, hours: u64, amount: i64) -> MsgLeaseResource {
        MsgLeaseResource {
            id: id.clone(),
            lease_hours: hours,
            amount: coin(amount),
            sender: lessee(),
        }
    }

    /// `mantissa × 10^exp` base units, for amounts near the `Decimal` limit.
    fn big(mantissa: i128, exp: u32) -> Coin {
        Coin::new(
            "umedia",
            Decimal::from_i128_with_scale(mantissa * 10_i128.pow(exp), 0),
        )
    }

    fn escrow(k: &Keeper<Bank>) -> Coin {
        k.ledger().balance(&k.config().escrow_account, "umedia")
    }

    #[test]
    fn register_full_deposit_is_active() {
        let mut k = keeper();
        let resp = k.register_resource(&ctx(0), &register_msg(100)).unwrap();
        assert_eq!(resp.id.as_str(), "mn1");
        assert_eq!(resp.status, ResourceStatus::Active);
        assert_eq!(escrow(&k), coin(100));
        assert_eq!(k.events()[0].event_type, EventType::ResourceRegistered);
    }

    #[test]
    fn register_partial_deposit_is_pending() {
        let mut k = keeper();
        let resp = k.register_resource(&ctx(0), &register_msg(10)).unwrap();
        assert_eq!(resp.status, ResourceStatus::Pending);
    }

    #[test]
    fn register_below_initial_minimum_fails() {
        let mut k = keeper();
        let err = k.register_resource(&ctx(0), &register_msg(9)).unwrap_err();
        assert!(matches!(err, MedianodeError::InsufficientDeposit { .. }));
        assert!(escrow(&k).is_zero());
        assert_eq!(k.registry().peek_next_resource_id(), 1);
    }

    #[test]
    fn register_duplicate_id_fails() {
        let mut k = keeper();
        let mut msg = register_msg(100);
        msg.id = Some(ResourceId::parse("edge01").unwrap());
        k.register_resource(&ctx(0), &msg).unwrap();
        let err = k.register_resource(&ctx(0), &msg).unwrap_err();
        assert!(matches!(err, MedianodeError::AlreadyExists(_)));
        assert_eq!(escrow(&k), coin(100));
    }

    #[test]
    fn generated_ids_skip_client_chosen_ones() {
        let mut k = keeper();
        let mut msg = register_msg(100);
        msg.id = Some(ResourceId::from_counter(1));
        k.register_resource(&ctx(0), &msg).unwrap();
        let resp = k.register_resource(&ctx(0), &register_msg(100)).unwrap();
        assert_eq!(resp.id.as_str(), "mn2");
    }

    #[test]
    fn register_wrong_denom_fails() {
        let mut k = keeper();
        let mut msg = register_msg(100);
        msg.deposit = Coin::new("uatom", Decimal::new(100, 0));
        msg.price_per_hour = Coin::new("uatom", Decimal::new(10, 0));
        assert!(matches!(
            k.register_resource(&ctx(0), &msg),
            Err(MedianodeError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn deposits_activate_pending_resource() {
        let mut k = keeper();
        let id = k.register_resource(&ctx(0), &register_msg(40)).unwrap().id;
        let msg = MsgDepositResource {
            id: id.clone(),
            amount: coin(60),
            sender: lessee(),
        };
        let resp = k.deposit_resource(&ctx(1), &msg).unwrap();
        assert_eq!(resp.total_deposit, coin(100));
        assert_eq!(resp.status, ResourceStatus::Active);
        let resource = k.query().resource(&id).unwrap();
        assert_eq!(resource.deposits.len(), 2);
        assert_eq!(resource.deposits[1].depositor, lessee());

        // Active resources take no further deposits.
        assert!(matches!(
            k.deposit_resource(&ctx(2), &msg),
            Err(MedianodeError::InvalidStatus { .. })
        ));
    }

    #[test]
    fn lease_requires_exact_amount() {
        let mut k = keeper();
        let id = k.register_resource(&ctx(0), &register_msg(100)).unwrap().id;
        let err = k.lease_resource(&ctx(0), &lease_msg(&id, 24, 239)).unwrap_err();
        assert!(matches!(err, MedianodeError::InvalidAmount { .. }));
        assert!(k.query().lease(&id).is_err());
        assert!(!k.query().resource(&id).unwrap().leased);
        assert_eq!(escrow(&k), coin(100));
    }

    #[test]
    fn lease_rejects_pending_leased_and_bad_hours() {
        let mut k = keeper();
        let pending = k.register_resource(&ctx(0), &register_msg(10)).unwrap().id;
        assert!(matches!(
            k.lease_resource(&ctx(0), &lease_msg(&pending, 1, 10)),
            Err(MedianodeError::InvalidStatus { .. })
        ));

        let id = k.register_resource(&ctx(0), &register_msg(100)).unwrap().id;
        assert!(matches!(
            k.lease_resource(&ctx(0), &lease_msg(&id, 721, 7_210)),
            Err(MedianodeError::InvalidLeaseHours { .. })
        ));
        k.lease_resource(&ctx(0), &lease_msg(&id, 2, 20)).unwrap();
        assert!(matches!(
            k.lease_resource(&ctx(0), &lease_msg(&id, 2, 20)),
            Err(MedianodeError::AlreadyLeased(_))
        ));
    }

    #[test]
    fn lease_cost_overflow_is_an_error_not_a_panic() {
        let mut k = keeper();
        let mut msg = register_msg(100);
        msg.price_per_hour = big(1, 28);
        let id = k.register_resource(&ctx(0), &msg).unwrap().id;
        let escrowed = escrow(&k);

        let err = k
            .lease_resource(&ctx(0), &lease_msg(&id, 10, 1))
            .unwrap_err();
        assert!(matches!(err, MedianodeError::InvalidAmount { .. }));
        assert!(k.query().lease(&id).is_err());
        assert!(!k.query().resource(&id).unwrap().leased);
        assert_eq!(escrow(&k), escrowed);
    }

    #[test]
    fn extension_total_overflow_leaves_lease_untouched() {
        let mut k = keeper();
        let mut msg = register_msg(100);
        msg.price_per_hour = big(1, 27);
        let id = k.register_resource(&ctx(0), &msg).unwrap().id;
        k.ledger_mut().mint(&lessee(), &big(70, 27)).unwrap();
        k.lease_resource(
            &ctx(0),
            &MsgLeaseResource {
                id: id.clone(),
                lease_hours: 70,
                amount: big(70, 27),
                sender: lessee(),
            },
        )
        .unwrap();
        let before = k.export_genesis().unwrap();
        let balance = k.ledger().balance(&lessee(), "umedia");

        // 10h alone fits, but 80e27 in total does not.
        let extend = MsgExtendLease {
            id,
            lease_hours: 10,
            amount: big(10, 27),
            sender: lessee(),
        };
        assert!(matches!(
            k.extend_lease(&ctx(1), &extend),
            Err(MedianodeError::InvalidAmount { .. })
        ));
        assert_eq!(k.export_genesis().unwrap(), before);
        assert_eq!(k.ledger().balance(&lessee(), "umedia"), balance);
        k.check_invariants().unwrap();
    }

    #[test]
    fn extend_checks_lessee_bounds_and_amount() {
        let mut k = keeper();
        let id = k.register_resource(&ctx(0), &register_msg(100)).unwrap().id;
        k.lease_resource(&ctx(0), &lease_msg(&id, 700, 7_000)).unwrap();

        let mut msg = MsgExtendLease {
            id: id.clone(),
            lease_hours: 20,
            amount: coin(200),
            sender: owner(),
        };
        assert!(matches!(
            k.extend_lease(&ctx(1), &msg),
            Err(MedianodeError::Unauthorized { .. })
        ));
        msg.sender = lessee();
        msg.lease_hours = 21;
        msg.amount = coin(210);
        assert!(matches!(
            k.extend_lease(&ctx(1), &msg),
            Err(MedianodeError::InvalidLeaseHours { hours: 721, .. })
        ));
        msg.lease_hours = 20;
        msg.amount = coin(190);
        assert!(matches!(
            k.extend_lease(&ctx(1), &msg),
            Err(MedianodeError::InvalidAmount { .. })
        ));
        msg.amount = coin(200);
        let lease = k.extend_lease(&ctx(1), &msg).unwrap().lease;
        assert_eq!(lease.leased_hours, 720);
        assert_eq!(lease.total_lease_amount, coin(7_200));
    }

    #[test]
    fn cancel_settles_then_refunds_remainder() {
        let mut k = keeper();
        let id = k.register_resource(&ctx(0), &register_msg(100)).unwrap().id;
        k.lease_resource(&ctx(0), &lease_msg(&id, 2, 20)).unwrap();

        let msg = MsgCancelLease {
            id: id.clone(),
            sender: lessee(),
        };
        let resp = k.cancel_lease(&ctx(1), &msg).unwrap();
        assert_eq!(resp.settled, coin(10));
        assert_eq!(resp.refunded, coin(10));
        assert_eq!(k.ledger().balance(&lessee(), "umedia"), coin(9_990));
        assert!(k.query().lease(&id).is_err());
        assert!(k.query().resource(&id).unwrap().is_available());
        assert_eq!(escrow(&k), coin(100));

        // A second cancel finds nothing to refund.
        assert!(matches!(
            k.cancel_lease(&ctx(1), &msg),
            Err(MedianodeError::LeaseNotFound(_))
        ));
    }

    #[test]
    fn cancel_by_stranger_changes_nothing() {
        let mut k = keeper();
        let id = k.register_resource(&ctx(0), &register_msg(100)).unwrap().id;
        k.lease_resource(&ctx(0), &lease_msg(&id, 2, 20)).unwrap();
        let before = k.registry().clone();
        let events = k.events().len();

        let msg = MsgCancelLease {
            id,
            sender: AccountId::from_seed(7),
        };
        assert!(matches!(
            k.cancel_lease(&ctx(1), &msg),
            Err(MedianodeError::Unauthorized { .. })
        ));
        assert_eq!(k.registry(), &before);
        assert_eq!(k.events().len(), events);
    }

    #[test]
    fn close_rules() {
        let mut k = keeper();
        let id = k.register_resource(&ctx(0), &register_msg(100)).unwrap().id;
        k.lease_resource(&ctx(0), &lease_msg(&id, 1, 10)).unwrap();

        let mut msg = MsgCloseResource {
            id: id.clone(),
            sender: lessee(),
        };
        assert!(matches!(
            k.close_resource(&ctx(0), &msg),
            Err(MedianodeError::Unauthorized { .. })
        ));
        msg.sender = owner();
        assert!(matches!(
            k.close_resource(&ctx(0), &msg),
            Err(MedianodeError::AlreadyLeased(_))
        ));

        k.cancel_lease(&ctx(0), &MsgCancelLease { id: id.clone(), sender: lessee() })
            .unwrap();
        k.close_resource(&ctx(2), &msg).unwrap();
        let resource = k.query().resource(&id).unwrap();
        assert_eq!(resource.status, ResourceStatus::Closed);
        assert_eq!(resource.closed_at, Some(t0() + Duration::hours(2)));
        assert!(matches!(
            k.close_resource(&ctx(3), &msg),
            Err(MedianodeError::InvalidStatus { .. })
        ));
    }

    #[test]
    fn update_resource_keeps_lease_price() {
        let mut k = keeper();
        let id = k.register_resource(&ctx(0), &register_msg(100)).unwrap().id;
        k.lease_resource(&ctx(0), &lease_msg(&id, 4, 40)).unwrap();

        let msg = MsgUpdateResource {
            id: id.clone(),
            url: None,
            info: None,
            hardware_specs: None,
            price_per_hour: Some(coin(50)),
            sender: owner(),
        };
        k.update_resource(&ctx(1), &msg).unwrap();
        assert_eq!(k.query().resource(&id).unwrap().price_per_hour, coin(50));
        assert_eq!(k.query().lease(&id).unwrap().price_per_hour, coin(10));

        let stranger = MsgUpdateResource {
            sender: lessee(),
            ..msg
        };
        assert!(matches!(
            k.update_resource(&ctx(1), &stranger),
            Err(MedianodeError::Unauthorized { .. })
        ));
    }

    #[test]
    fn update_params_requires_authority() {
        let mut k = keeper();
        let params = Params {
            max_lease_hours: 48,
            ..Params::default()
        };
        let mut msg = MsgUpdateParams {
            params,
            authority: owner(),
        };
        assert!(matches!(
            k.update_params(&ctx(0), &msg),
            Err(MedianodeError::Unauthorized { .. })
        ));
        msg.authority = authority();
        k.update_params(&ctx(0), &msg).unwrap();
        assert_eq!(k.query().params().unwrap().max_lease_hours, 48);
        assert_eq!(k.events().last().unwrap().event_type, EventType::ParamsUpdated);
    }

    #[test]
    fn update_params_rejects_denom_change_with_resources() {
        let mut k = keeper();
        k.register_resource(&ctx(0), &register_msg(100)).unwrap();
        let msg = MsgUpdateParams {
            params: Params {
                min_deposit: Coin::new("uatom", Decimal::new(100, 0)),
                ..Params::default()
            },
            authority: authority(),
        };
        assert!(matches!(
            k.update_params(&ctx(0), &msg),
            Err(MedianodeError::InvalidParams { .. })
        ));
    }
}
