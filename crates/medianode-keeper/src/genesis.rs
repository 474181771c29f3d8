//! Genesis import and export.

use medianode_bank::Ledger;
use medianode_types::{GenesisState, Result};

use crate::keeper::Keeper;
use crate::registry::Registry;

impl<L: Ledger> Keeper<L> {
    /// Replace the module state with `genesis`. The state is validated in
    /// full before anything is written. Escrow funding is the bank's genesis
    /// concern and is not touched here.
    ///
    /// # Errors
    /// Returns `InvalidGenesis` if validation fails.
    pub fn init_genesis(&mut self, genesis: &GenesisState) -> Result<()> {
        genesis.validate()?;

        let mut registry = Registry::new();
        registry.set_params(&genesis.params)?;
        for resource in &genesis.resources {
            registry.set_resource(resource)?;
        }
        for lease in &genesis.leases {
            registry.set_lease(lease)?;
        }
        registry.set_next_resource_id(genesis.next_resource_id);
        self.registry = registry;

        tracing::info!(
            resources = genesis.resources.len(),
            leases = genesis.leases.len(),
            next_resource_id = genesis.next_resource_id,
            "Genesis imported"
        );
        Ok(())
    }

    /// Snapshot the full module state in key order.
    ///
    /// # Errors
    /// Returns `Serialization` on a corrupt record.
    pub fn export_genesis(&self) -> Result<GenesisState> {
        Ok(GenesisState {
            params: self.registry.params()?,
            resources: self.registry.resources()?,
            leases: self.registry.leases()?,
            next_resource_id: self.registry.peek_next_resource_id(),
        })
    }
}
