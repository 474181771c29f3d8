//! Typed Resource/Lease registry over the module [`KvStore`].
//!
//! Pure storage: no business rules live here. The registry keeps the
//! owner and lessee secondary indexes in step with the primary records,
//! and owns the resource id counter and the params blob.

use medianode_types::{
    AccountId, Lease, MedianodeError, Params, Resource, ResourceId, Result,
};
use serde::{Serialize, de::DeserializeOwned};

use crate::store::{KvStore, keys};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    store: KvStore,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw access for diagnostics and tests.
    #[must_use]
    pub fn store(&self) -> &KvStore {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut KvStore {
        &mut self.store
    }

    // ------------------------------------------------------------------
    // Resources
    // ------------------------------------------------------------------

    pub fn get_resource(&self, id: &ResourceId) -> Result<Option<Resource>> {
        self.read(&keys::resource_key(id))
    }

    /// Like [`get_resource`](Self::get_resource) but absent is an error.
    pub fn resource(&self, id: &ResourceId) -> Result<Resource> {
        self.get_resource(id)?
            .ok_or_else(|| MedianodeError::ResourceNotFound(id.clone()))
    }

    #[must_use]
    pub fn has_resource(&self, id: &ResourceId) -> bool {
        self.store.has(&keys::resource_key(id))
    }

    pub fn set_resource(&mut self, resource: &Resource) -> Result<()> {
        if let Some(previous) = self.get_resource(&resource.id)? {
            if previous.owner != resource.owner {
                self.store.delete(&keys::account_index_key(
                    keys::OWNER_INDEX_PREFIX,
                    &previous.owner,
                    &previous.id,
                ));
            }
        }
        self.write(keys::resource_key(&resource.id), resource)?;
        self.store.set(
            keys::account_index_key(keys::OWNER_INDEX_PREFIX, &resource.owner, &resource.id),
            Vec::new(),
        );
        Ok(())
    }

    /// Remove a resource and its owner index entry. Returns whether it existed.
    pub fn delete_resource(&mut self, id: &ResourceId) -> Result<bool> {
        let Some(resource) = self.get_resource(id)? else {
            return Ok(false);
        };
        self.store.delete(&keys::resource_key(id));
        self.store.delete(&keys::account_index_key(
            keys::OWNER_INDEX_PREFIX,
            &resource.owner,
            id,
        ));
        Ok(true)
    }

    /// All resources in key order.
    pub fn resources(&self) -> Result<Vec<Resource>> {
        self.read_all(&[keys::RESOURCE_PREFIX])
    }

    pub fn resource_ids_by_owner(&self, owner: &AccountId) -> Result<Vec<ResourceId>> {
        self.index_ids(&keys::account_index_prefix(keys::OWNER_INDEX_PREFIX, owner))
    }

    // ------------------------------------------------------------------
    // Leases
    // ------------------------------------------------------------------

    pub fn get_lease(&self, id: &ResourceId) -> Result<Option<Lease>> {
        self.read(&keys::lease_key(id))
    }

    /// Like [`get_lease`](Self::get_lease) but absent is an error.
    pub fn lease(&self, id: &ResourceId) -> Result<Lease> {
        self.get_lease(id)?
            .ok_or_else(|| MedianodeError::LeaseNotFound(id.clone()))
    }

    #[must_use]
    pub fn has_lease(&self, id: &ResourceId) -> bool {
        self.store.has(&keys::lease_key(id))
    }

    pub fn set_lease(&mut self, lease: &Lease) -> Result<()> {
        if let Some(previous) = self.get_lease(&lease.resource_id)? {
            if previous.lessee != lease.lessee {
                self.store.delete(&keys::account_index_key(
                    keys::LESSEE_INDEX_PREFIX,
                    &previous.lessee,
                    &previous.resource_id,
                ));
            }
        }
        self.write(keys::lease_key(&lease.resource_id), lease)?;
        self.store.set(
            keys::account_index_key(keys::LESSEE_INDEX_PREFIX, &lease.lessee, &lease.resource_id),
            Vec::new(),
        );
        Ok(())
    }

    /// Remove a lease and its lessee index entry. Returns whether it existed.
    pub fn delete_lease(&mut self, id: &ResourceId) -> Result<bool> {
        let Some(lease) = self.get_lease(id)? else {
            return Ok(false);
        };
        self.store.delete(&keys::lease_key(id));
        self.store.delete(&keys::account_index_key(
            keys::LESSEE_INDEX_PREFIX,
            &lease.lessee,
            id,
        ));
        Ok(true)
    }

    /// All leases in key order.
    pub fn leases(&self) -> Result<Vec<Lease>> {
        self.read_all(&[keys::LEASE_PREFIX])
    }

    /// Resource ids of all leases, in key order.
    pub fn lease_ids(&self) -> Result<Vec<ResourceId>> {
        self.ids_under(&[keys::LEASE_PREFIX])
    }

    /// Resource ids of all resources, in key order.
    pub fn resource_ids(&self) -> Result<Vec<ResourceId>> {
        self.ids_under(&[keys::RESOURCE_PREFIX])
    }

    pub fn lease_ids_by_lessee(&self, lessee: &AccountId) -> Result<Vec<ResourceId>> {
        self.index_ids(&keys::account_index_prefix(keys::LESSEE_INDEX_PREFIX, lessee))
    }

    // ------------------------------------------------------------------
    // Counter & params
    // ------------------------------------------------------------------

    /// Current counter value without consuming it. Starts at 1.
    #[must_use]
    pub fn peek_next_resource_id(&self) -> u64 {
        self.store
            .get(&[keys::NEXT_RESOURCE_ID_KEY])
            .and_then(|bytes| <[u8; 8]>::try_from(bytes).ok())
            .map_or(1, u64::from_be_bytes)
    }

    /// Consume and return the next counter value.
    pub fn next_resource_id(&mut self) -> u64 {
        let next = self.peek_next_resource_id();
        self.set_next_resource_id(next + 1);
        next
    }

    pub fn set_next_resource_id(&mut self, value: u64) {
        self.store
            .set(vec![keys::NEXT_RESOURCE_ID_KEY], value.to_be_bytes().to_vec());
    }

    pub fn params(&self) -> Result<Params> {
        self.read(&[keys::PARAMS_KEY])?
            .ok_or_else(|| MedianodeError::Internal("params not initialised".into()))
    }

    pub fn set_params(&mut self, params: &Params) -> Result<()> {
        self.write(vec![keys::PARAMS_KEY], params)
    }

    // ------------------------------------------------------------------
    // Encoding
    // ------------------------------------------------------------------

    fn read<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>> {
        self.store
            .get(key)
            .map(|bytes| serde_json::from_slice(bytes).map_err(Into::into))
            .transpose()
    }

    fn write<T: Serialize>(&mut self, key: Vec<u8>, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.store.set(key, bytes);
        Ok(())
    }

    fn read_all<T: DeserializeOwned>(&self, prefix: &[u8]) -> Result<Vec<T>> {
        self.store
            .prefix_iter(prefix)
            .map(|(_, bytes)| serde_json::from_slice(bytes).map_err(Into::into))
            .collect()
    }

    fn ids_under(&self, prefix: &[u8]) -> Result<Vec<ResourceId>> {
        self.store
            .prefix_iter(prefix)
            .map(|(key, _)| decode_id(&key[prefix.len()..]))
            .collect()
    }

    fn index_ids(&self, prefix: &[u8]) -> Result<Vec<ResourceId>> {
        self.ids_under(prefix)
    }
}

fn decode_id(bytes: &[u8]) -> Result<ResourceId> {
    let s = std::str::from_utf8(bytes)
        .map_err(|err| MedianodeError::Serialization(format!("resource id key: {err}")))?;
    ResourceId::parse(s)
}
