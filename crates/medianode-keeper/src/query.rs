//! Read-only queries over the registry.

use medianode_types::{AccountId, Lease, Params, Resource, ResourceId, Result};
use serde::{Deserialize, Serialize};

use crate::registry::Registry;

const DEFAULT_PAGE_LIMIT: usize = 100;

/// Offset pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub offset: usize,
    pub limit: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total matching records across all pages.
    pub total: usize,
    /// Offset of the next page, `None` on the last one.
    pub next_offset: Option<usize>,
}

impl<T> Page<T> {
    fn slice(all: Vec<T>, req: PageRequest) -> Self {
        let total = all.len();
        let limit = if req.limit == 0 { DEFAULT_PAGE_LIMIT } else { req.limit };
        let items: Vec<T> = all.into_iter().skip(req.offset).take(limit).collect();
        let end = req.offset.saturating_add(items.len());
        Self {
            next_offset: (end < total).then_some(end),
            items,
            total,
        }
    }
}

/// Borrowed query view, obtained from [`Keeper::query`](crate::Keeper::query).
#[derive(Debug, Clone, Copy)]
pub struct Querier<'a> {
    registry: &'a Registry,
}

impl<'a> Querier<'a> {
    #[must_use]
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// # Errors
    /// Returns `Internal` if params were never stored.
    pub fn params(&self) -> Result<Params> {
        self.registry.params()
    }

    /// # Errors
    /// Returns `ResourceNotFound`.
    pub fn resource(&self, id: &ResourceId) -> Result<Resource> {
        self.registry.resource(id)
    }

    /// All resources in id order, one page at a time.
    ///
    /// # Errors
    /// Returns `Serialization` on a corrupt record.
    pub fn resources(&self, req: PageRequest) -> Result<Page<Resource>> {
        Ok(Page::slice(self.registry.resources()?, req))
    }

    /// # Errors
    /// Returns `Serialization` on a corrupt record.
    pub fn resources_by_owner(&self, owner: &AccountId) -> Result<Vec<Resource>> {
        self.registry
            .resource_ids_by_owner(owner)?
            .iter()
            .map(|id| self.registry.resource(id))
            .collect()
    }

    /// Active resources without a running lease.
    ///
    /// # Errors
    /// Returns `Serialization` on a corrupt record.
    pub fn available_resources(&self) -> Result<Vec<Resource>> {
        Ok(self
            .registry
            .resources()?
            .into_iter()
            .filter(Resource::is_available)
            .collect())
    }

    /// # Errors
    /// Returns `LeaseNotFound`.
    pub fn lease(&self, id: &ResourceId) -> Result<Lease> {
        self.registry.lease(id)
    }

    /// # Errors
    /// Returns `Serialization` on a corrupt record.
    pub fn leases(&self, req: PageRequest) -> Result<Page<Lease>> {
        Ok(Page::slice(self.registry.leases()?, req))
    }

    /// # Errors
    /// Returns `Serialization` on a corrupt record.
    pub fn leases_by_lessee(&self, lessee: &AccountId) -> Result<Vec<Lease>> {
        self.registry
            .lease_ids_by_lessee(lessee)?
            .iter()
            .map(|id| self.registry.lease(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use medianode_types::{Coin, MedianodeError, ResourceStatus};
    use rust_decimal::Decimal;

    use super::*;

    fn populated() -> Registry {
        let mut reg = Registry::new();
        reg.set_params(&Params::default()).unwrap();
        let owners = [1, 1, 2, 2, 2];
        for (n, owner) in owners.into_iter().enumerate() {
            let id = format!("mn{}", n + 1);
            let mut r = Resource::dummy(&id, AccountId::from_seed(owner), 10, ResourceStatus::Active);
            if n == 4 {
                r.status = ResourceStatus::Pending;
            }
            reg.set_resource(&r).unwrap();
        }
        let mut leased = reg.resource(&ResourceId::parse("mn2").unwrap()).unwrap();
        leased.leased = true;
        reg.set_resource(&leased).unwrap();
        reg.set_lease(&Lease::new(
            leased.id.clone(),
            AccountId::from_seed(3),
            leased.owner.clone(),
            Coin::new("umedia", Decimal::new(10, 0)),
            2,
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        )
        .unwrap())
        .unwrap();
        reg
    }

    #[test]
    fn pagination_walks_all_records() {
        let reg = populated();
        let q = Querier::new(&reg);
        let first = q.resources(PageRequest { offset: 0, limit: 2 }).unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.total, 5);
        assert_eq!(first.next_offset, Some(2));

        let last = q.resources(PageRequest { offset: 4, limit: 2 }).unwrap();
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.next_offset, None);

        let past_end = q.resources(PageRequest { offset: 10, limit: 2 }).unwrap();
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total, 5);
    }

    #[test]
    fn zero_limit_uses_default() {
        let reg = populated();
        let page = Querier::new(&reg)
            .resources(PageRequest { offset: 0, limit: 0 })
            .unwrap();
        assert_eq!(page.items.len(), 5);
    }

    #[test]
    fn indexed_lookups() {
        let reg = populated();
        let q = Querier::new(&reg);
        assert_eq!(q.resources_by_owner(&AccountId::from_seed(1)).unwrap().len(), 2);
        assert_eq!(q.resources_by_owner(&AccountId::from_seed(2)).unwrap().len(), 3);
        assert!(q.resources_by_owner(&AccountId::from_seed(9)).unwrap().is_empty());

        let leases = q.leases_by_lessee(&AccountId::from_seed(3)).unwrap();
        assert_eq!(leases.len(), 1);
        assert_eq!(leases[0].resource_id.as_str(), "mn2");
        assert_eq!(q.leases(PageRequest::default()).unwrap().total, 1);
    }

    #[test]
    fn available_excludes_leased_and_pending() {
        let reg = populated();
        let ids: Vec<String> = Querier::new(&reg)
            .available_resources()
            .unwrap()
            .into_iter()
            .map(|r| r.id.to_string())
            .collect();
        assert_eq!(ids, vec!["mn1", "mn3", "mn4"]);
    }

    #[test]
    fn missing_records_are_errors() {
        let reg = populated();
        let q = Querier::new(&reg);
        let id = ResourceId::parse("mn42").unwrap();
        assert!(matches!(q.resource(&id), Err(MedianodeError::ResourceNotFound(_))));
        assert!(matches!(q.lease(&id), Err(MedianodeError::LeaseNotFound(_))));
    }
}
