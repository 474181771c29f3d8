//! Genesis import/export state.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{Lease, MedianodeError, Params, Resource, ResourceId, Result};

/// The full module state, as imported at chain start and exported on upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    pub params: Params,
    pub resources: Vec<Resource>,
    pub leases: Vec<Lease>,
    /// Next value of the resource id counter (starts at 1).
    pub next_resource_id: u64,
}

impl Default for GenesisState {
    fn default() -> Self {
        Self {
            params: Params::default(),
            resources: Vec::new(),
            leases: Vec::new(),
            next_resource_id: 1,
        }
    }
}

impl GenesisState {
    /// Parse and validate a JSON genesis document.
    ///
    /// # Errors
    /// Returns `Serialization` on malformed JSON, `InvalidGenesis` otherwise.
    pub fn from_json(json: &str) -> Result<Self> {
        let genesis: Self = serde_json::from_str(json)?;
        genesis.validate()?;
        Ok(genesis)
    }

    /// # Errors
    /// Returns `Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject genesis states that could not have been produced by the module.
    ///
    /// # Errors
    /// Returns `InvalidGenesis` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| MedianodeError::InvalidGenesis { reason };

        self.params
            .validate()
            .map_err(|err| invalid(err.to_string()))?;
        if self.next_resource_id == 0 {
            return Err(invalid("next_resource_id must be at least 1".into()));
        }

        let denom = self.params.denom();
        let mut resources: BTreeMap<&ResourceId, &Resource> = BTreeMap::new();
        for resource in &self.resources {
            resource
                .validate()
                .map_err(|err| invalid(format!("resource {}: {err}", resource.id)))?;
            resource
                .price_per_hour
                .expect_denom(denom)
                .map_err(|err| invalid(format!("resource {}: {err}", resource.id)))?;
            if resources.insert(&resource.id, resource).is_some() {
                return Err(invalid(format!("duplicate resource {}", resource.id)));
            }
        }

        let mut leased: BTreeSet<&ResourceId> = BTreeSet::new();
        for lease in &self.leases {
            lease
                .validate()
                .map_err(|err| invalid(format!("lease {}: {err}", lease.resource_id)))?;
            lease
                .price_per_hour
                .expect_denom(denom)
                .map_err(|err| invalid(format!("lease {}: {err}", lease.resource_id)))?;
            let resource = resources
                .get(&lease.resource_id)
                .ok_or_else(|| invalid(format!("lease for unknown resource {}", lease.resource_id)))?;
            if lease.owner != resource.owner {
                return Err(invalid(format!(
                    "lease {} owner does not match resource owner",
                    lease.resource_id
                )));
            }
            if !leased.insert(&lease.resource_id) {
                return Err(invalid(format!("duplicate lease {}", lease.resource_id)));
            }
        }

        for resource in &self.resources {
            if resource.leased != leased.contains(&resource.id) {
                return Err(invalid(format!(
                    "resource {} leased flag is {} but lease {}",
                    resource.id,
                    resource.leased,
                    if resource.leased { "is missing" } else { "exists" }
                )));
            }
        }
        Ok(())
    }
}
