//! The medianode keeper: module state plus the ledger it settles through.
//!
//! Message handlers live in [`crate::msg_server`], reads in [`crate::query`].
//! This file holds the shared machinery: configuration, transactional
//! branching, event emission, and the two per-block primitives the
//! settlement engine drives.

use medianode_bank::Ledger;
use medianode_types::{
    AccountId, Coin, Context, Event, EventPayload, EventType, MedianodeError, Params, ResourceId,
    ResourceStatus, Result, constants,
};
use serde::{Deserialize, Serialize};

use crate::query::Querier;
use crate::registry::Registry;

// ---------------------------------------------------------------------------
// KeeperConfig
// ---------------------------------------------------------------------------

/// Accounts the keeper acts on behalf of. Passed in explicitly so that no
/// handler reads authority or module addresses from global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeeperConfig {
    /// The only sender allowed to update params (governance).
    pub authority: AccountId,
    /// Module escrow holding deposits and prepaid lease amounts.
    pub escrow_account: AccountId,
    pub fee_collector: AccountId,
    pub community_pool: AccountId,
}

impl KeeperConfig {
    /// Config with the standard module accounts derived from their names.
    #[must_use]
    pub fn new(authority: AccountId) -> Self {
        Self {
            authority,
            escrow_account: AccountId::module(constants::MODULE_NAME),
            fee_collector: AccountId::module(constants::FEE_COLLECTOR_NAME),
            community_pool: AccountId::module(constants::COMMUNITY_POOL_NAME),
        }
    }

    /// Load a config document. Addresses are validated on deserialization.
    ///
    /// # Errors
    /// Returns `Serialization` on malformed JSON or addresses, and
    /// `InvalidParams` if a module account doubles as another.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns `InvalidParams` if module accounts collide.
    pub fn validate(&self) -> Result<()> {
        let module = [&self.escrow_account, &self.fee_collector, &self.community_pool];
        for (i, a) in module.iter().enumerate() {
            if module[i + 1..].contains(a) {
                return Err(MedianodeError::InvalidParams {
                    reason: format!("module account {a} configured twice"),
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SettleOutcome
// ---------------------------------------------------------------------------

/// Result of one [`Keeper::settle_lease`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleOutcome {
    /// Less than a whole hour since the last settlement.
    Idle,
    /// Whole hours paid out; the lease continues.
    Settled { amount: Coin },
    /// The final hours were paid out (possibly zero) and the lease is gone.
    Completed { amount: Coin },
}

impl SettleOutcome {
    /// Amount moved out of escrow by this call.
    #[must_use]
    pub fn amount(&self) -> Option<&Coin> {
        match self {
            Self::Idle => None,
            Self::Settled { amount } | Self::Completed { amount } => Some(amount),
        }
    }
}

// ---------------------------------------------------------------------------
// Keeper
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Keeper<L: Ledger> {
    pub(crate) registry: Registry,
    pub(crate) ledger: L,
    pub(crate) config: KeeperConfig,
    pub(crate) events: Vec<Event>,
}

impl<L: Ledger> Keeper<L> {
    /// A keeper with default params.
    ///
    /// # Errors
    /// Returns `InvalidParams` if the config is inconsistent.
    pub fn new(config: KeeperConfig, ledger: L) -> Result<Self> {
        Self::with_params(config, ledger, &Params::default())
    }

    /// # Errors
    /// Returns `InvalidParams` if the config or params are invalid.
    pub fn with_params(config: KeeperConfig, ledger: L, params: &Params) -> Result<Self> {
        config.validate()?;
        params.validate()?;
        let mut registry = Registry::new();
        registry.set_params(params)?;
        Ok(Self {
            registry,
            ledger,
            config,
            events: Vec::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &KeeperConfig {
        &self.config
    }

    #[must_use]
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Direct ledger access for hosts (funding accounts, bank genesis).
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Read-only query surface.
    #[must_use]
    pub fn query(&self) -> Querier<'_> {
        Querier::new(&self.registry)
    }

    /// Events emitted since the last [`take_events`](Self::take_events).
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Drain pending events (the host forwards them at block end).
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Run `f` transactionally. If it fails, the registry, the ledger and
    /// the pending event list are restored to their state before the call.
    ///
    /// Store and ledger journal only what `f` touches, so a branch costs as
    /// much as the work inside it. Branches nest.
    ///
    /// # Errors
    /// Returns whatever `f` returns.
    pub fn branch<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.registry.store_mut().checkpoint();
        self.ledger.checkpoint();
        let events = self.events.len();
        let result = f(self);
        if result.is_ok() {
            self.registry.store_mut().commit();
            self.ledger.commit();
        } else {
            self.registry.store_mut().revert();
            self.ledger.revert();
            self.events.truncate(events);
        }
        result
    }

    pub(crate) fn emit(
        &mut self,
        ctx: &Context,
        event_type: EventType,
        resource_id: Option<&ResourceId>,
        payload: EventPayload,
    ) {
        self.events
            .push(Event::new(event_type, ctx.height, resource_id.cloned(), payload));
    }

    /// Ledger transfer that skips zero amounts.
    pub(crate) fn send(&mut self, from: &AccountId, to: &AccountId, amount: &Coin) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }
        self.ledger.transfer(from, to, amount)
    }

    /// Record a failed settlement step as an event. Called by the settlement
    /// engine after the failed branch has been rolled back.
    pub fn emit_settlement_failure(
        &mut self,
        ctx: &Context,
        resource_id: &ResourceId,
        reason: String,
    ) {
        self.emit(
            ctx,
            EventType::SettlementFailed,
            Some(resource_id),
            EventPayload::Failure { reason },
        );
    }

    // ---- Settlement primitives ----

    /// Pay out the whole hours accrued on the lease of `id`.
    ///
    /// The accrued amount leaves escrow split three ways: commission to the
    /// fee collector and the community pool, the rest to the owner. When the
    /// lease is fully settled it is deleted and the resource freed.
    ///
    /// Not transactional on its own; callers run it inside [`branch`](Self::branch).
    ///
    /// # Errors
    /// Returns `LeaseNotFound`, ledger errors, or `InvariantViolation` if the
    /// lease record is corrupt.
    pub fn settle_lease(&mut self, ctx: &Context, id: &ResourceId) -> Result<SettleOutcome> {
        let mut lease = self.registry.lease(id)?;
        let params = self.registry.params()?;

        let paid = match lease.accrual_at(ctx.block_time) {
            Some(accrual) => {
                let (payment, fee, pool) = params.split_commission(&accrual.amount);
                let escrow = self.config.escrow_account.clone();
                let fee_collector = self.config.fee_collector.clone();
                let community_pool = self.config.community_pool.clone();
                self.send(&escrow, &lease.owner, &payment)?;
                self.send(&escrow, &fee_collector, &fee)?;
                self.send(&escrow, &community_pool, &pool)?;
                lease.apply_accrual(&accrual)?;

                tracing::debug!(
                    resource = %id,
                    hours = accrual.billed_hours,
                    amount = %accrual.amount,
                    settled = %lease.settled_lease_amount,
                    "Lease payment settled"
                );
                let commission = fee.checked_add(&pool)?;
                self.emit(
                    ctx,
                    EventType::LeasePaymentSettled,
                    Some(id),
                    EventPayload::Settlement {
                        owner: lease.owner.clone(),
                        payment,
                        commission,
                        settled_lease_amount: lease.settled_lease_amount.clone(),
                        total_lease_amount: lease.total_lease_amount.clone(),
                    },
                );
                accrual.amount
            }
            // A lease imported already fully settled still has to complete.
            None if lease.is_fully_settled() => Coin::zero(lease.total_lease_amount.denom.clone()),
            None => return Ok(SettleOutcome::Idle),
        };

        if lease.is_fully_settled() {
            self.registry.delete_lease(id)?;
            let mut resource = self.registry.resource(id)?;
            resource.leased = false;
            self.registry.set_resource(&resource)?;

            tracing::info!(
                resource = %id,
                lessee = lease.lessee.short(),
                total = %lease.total_lease_amount,
                "Lease completed"
            );
            self.emit(
                ctx,
                EventType::LeaseCompleted,
                Some(id),
                EventPayload::Lease {
                    lessee: lease.lessee,
                    leased_hours: lease.leased_hours,
                    amount: lease.settled_lease_amount,
                    total_lease_amount: lease.total_lease_amount,
                },
            );
            return Ok(SettleOutcome::Completed { amount: paid });
        }

        self.registry.set_lease(&lease)?;
        Ok(SettleOutcome::Settled { amount: paid })
    }

    /// Refund every deposit record of the closed resource `id` to its
    /// depositor and clear the list. A resource with no deposits left is a
    /// no-op, so repeated calls never pay twice.
    ///
    /// Not transactional on its own; callers run it inside [`branch`](Self::branch).
    ///
    /// # Errors
    /// Returns `ResourceNotFound`, `InvalidStatus` unless Closed, or ledger errors.
    pub fn release_deposits(
        &mut self,
        ctx: &Context,
        id: &ResourceId,
    ) -> Result<Vec<(AccountId, Coin)>> {
        let mut resource = self.registry.resource(id)?;
        resource.expect_status(ResourceStatus::Closed)?;
        if resource.deposits.is_empty() {
            return Ok(Vec::new());
        }

        let escrow = self.config.escrow_account.clone();
        let mut refunds = Vec::with_capacity(resource.deposits.len());
        for deposit in std::mem::take(&mut resource.deposits) {
            self.send(&escrow, &deposit.depositor, &deposit.amount)?;
            refunds.push((deposit.depositor, deposit.amount));
        }
        self.registry.set_resource(&resource)?;

        tracing::info!(
            resource = %id,
            refunds = refunds.len(),
            "Deposits released"
        );
        self.emit(
            ctx,
            EventType::DepositsReleased,
            Some(id),
            EventPayload::Release {
                refunds: refunds.clone(),
            },
        );
        Ok(refunds)
    }
}
