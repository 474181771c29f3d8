//! Ordered key-value store with prefix iteration.
//!
//! Stands in for the chain's module store. Keys are namespaced by a
//! one-byte prefix (see [`keys`]); iteration is always in key order, which
//! is what makes settlement passes replay-identical across nodes.
//!
//! Writes made under a checkpoint record the prior value of the key, so a
//! revert touches only the keys written since.

use std::collections::BTreeMap;

/// A written key and the value it held before the write.
type Undo = (Vec<u8>, Option<Vec<u8>>);

/// In-memory ordered byte store.
#[derive(Debug, Clone, Default)]
pub struct KvStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
    /// Open checkpoints, innermost last.
    checkpoints: Vec<Vec<Undo>>,
}

impl PartialEq for KvStore {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for KvStore {}

impl KvStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    #[must_use]
    pub fn has(&self, key: &[u8]) -> bool {
        self.entries.contains_key(key)
    }

    pub fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        match self.checkpoints.last_mut() {
            Some(undo) => {
                let prior = self.entries.insert(key.clone(), value);
                undo.push((key, prior));
            }
            None => {
                self.entries.insert(key, value);
            }
        }
    }

    /// Remove `key`. Returns whether it was present.
    pub fn delete(&mut self, key: &[u8]) -> bool {
        let Some(prior) = self.entries.remove(key) else {
            return false;
        };
        if let Some(undo) = self.checkpoints.last_mut() {
            undo.push((key.to_vec(), Some(prior)));
        }
        true
    }

    /// All entries whose key starts with `prefix`, in key order.
    pub fn prefix_iter<'a>(&'a self, prefix: &'a [u8]) -> impl Iterator<Item = (&'a [u8], &'a [u8])> + 'a {
        self.entries
            .range(prefix.to_vec()..)
            .take_while(move |(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.as_slice(), value.as_slice()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Open a checkpoint nested in the current one, if any.
    pub fn checkpoint(&mut self) {
        self.checkpoints.push(Vec::new());
    }

    /// Keep the writes since the innermost checkpoint; an enclosing
    /// checkpoint can still revert them.
    pub fn commit(&mut self) {
        if let Some(undo) = self.checkpoints.pop() {
            if let Some(parent) = self.checkpoints.last_mut() {
                parent.extend(undo);
            }
        }
    }

    /// Undo the writes since the innermost checkpoint.
    pub fn revert(&mut self) {
        let Some(undo) = self.checkpoints.pop() else {
            return;
        };
        for (key, prior) in undo.into_iter().rev() {
            match prior {
                Some(value) => {
                    self.entries.insert(key, value);
                }
                None => {
                    self.entries.remove(&key);
                }
            }
        }
    }

    /// Number of open checkpoints.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.checkpoints.len()
    }
}

/// Key layout of the medianode module store.
///
/// | prefix | key suffix                     | value            |
/// |--------|--------------------------------|------------------|
/// | `0x01` | resource id                    | `Resource` JSON  |
/// | `0x02` | resource id                    | `Lease` JSON     |
/// | `0x03` | —                              | counter, u64 BE  |
/// | `0x04` | —                              | `Params` JSON    |
/// | `0x05` | owner ‖ `0x00` ‖ resource id   | empty            |
/// | `0x06` | lessee ‖ `0x00` ‖ resource id  | empty            |
pub mod keys {
    use medianode_types::{AccountId, ResourceId};

    pub const RESOURCE_PREFIX: u8 = 0x01;
    pub const LEASE_PREFIX: u8 = 0x02;
    pub const NEXT_RESOURCE_ID_KEY: u8 = 0x03;
    pub const PARAMS_KEY: u8 = 0x04;
    pub const OWNER_INDEX_PREFIX: u8 = 0x05;
    pub const LESSEE_INDEX_PREFIX: u8 = 0x06;

    const SEPARATOR: u8 = 0x00;

    fn prefixed(prefix: u8, suffix: &[u8]) -> Vec<u8> {
        let mut key = Vec::with_capacity(1 + suffix.len());
        key.push(prefix);
        key.extend_from_slice(suffix);
        key
    }

    #[must_use]
    pub fn resource_key(id: &ResourceId) -> Vec<u8> {
        prefixed(RESOURCE_PREFIX, id.as_bytes())
    }

    #[must_use]
    pub fn lease_key(id: &ResourceId) -> Vec<u8> {
        prefixed(LEASE_PREFIX, id.as_bytes())
    }

    /// Prefix under which every index entry of `account` lives.
    #[must_use]
    pub fn account_index_prefix(prefix: u8, account: &AccountId) -> Vec<u8> {
        let mut key = prefixed(prefix, account.as_str().as_bytes());
        key.push(SEPARATOR);
        key
    }

    #[must_use]
    pub fn account_index_key(prefix: u8, account: &AccountId, id: &ResourceId) -> Vec<u8> {
        let mut key = account_index_prefix(prefix, account);
        key.extend_from_slice(id.as_bytes());
        key
    }
}
