//! In-memory state implementations

use crate::error::StorageResult;
use crate::traits::{Account, StateReader, StateWriter};
use bach_primitives::{Address, H256};
use std::collections::HashMap;

/// In-memory state: accounts plus non-zero storage slots
#[derive(Clone, Debug, Default)]
pub struct StateCache {
    /// Cached accounts (None = deleted)
    accounts: HashMap<Address, Option<Account>>,
    /// Storage slots; a zero entry records an explicit clear
    storage: HashMap<(Address, H256), H256>,
}

impl StateCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get number of cached account changes
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Number of non-zero slots held for `address`
    pub fn live_slots(&self, address: &Address) -> usize {
        self.storage
            .iter()
            .filter(|((addr, _), value)| addr == address && !value.is_zero())
            .count()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty() && self.storage.is_empty()
    }

    /// Apply every change recorded in `changes` on top of this state
    pub fn apply(&mut self, changes: StateCache) {
        self.accounts.extend(changes.accounts);
        for (key, value) in changes.storage {
            if value.is_zero() {
                self.storage.remove(&key);
            } else {
                self.storage.insert(key, value);
            }
        }
    }
}

impl StateReader for StateCache {
    fn get_account(&self, address: &Address) -> StorageResult<Option<Account>> {
        Ok(self.accounts.get(address).cloned().flatten())
    }

    fn get_storage(&self, address: &Address, slot: &H256) -> StorageResult<H256> {
        Ok(self.storage.get(&(*address, *slot)).cloned().unwrap_or(H256::ZERO))
    }
}

impl StateWriter for StateCache {
    fn set_account(&mut self, address: Address, account: Account) -> StorageResult<()> {
        self.accounts.insert(address, Some(account));
        Ok(())
    }

    fn set_storage(&mut self, address: Address, slot: H256, value: H256) -> StorageResult<()> {
        self.storage.insert((address, slot), value);
        Ok(())
    }
}

/// Layered state with fallback to underlying storage.
///
/// Writes stay in the overlay; `into_cache` hands them to the caller, which
/// either applies them to the base state or drops them to discard a failed call.
pub struct CachedState<'a> {
    cache: StateCache,
    underlying: &'a dyn StateReader,
}

impl<'a> CachedState<'a> {
    /// Create a new cached state layer
    pub fn new(underlying: &'a dyn StateReader) -> Self {
        Self {
            cache: StateCache::new(),
            underlying,
        }
    }

    /// Get the cache
    pub fn cache(&self) -> &StateCache {
        &self.cache
    }

    /// Take ownership of the cache
    pub fn into_cache(self) -> StateCache {
        self.cache
    }
}

impl StateReader for CachedState<'_> {
    fn get_account(&self, address: &Address) -> StorageResult<Option<Account>> {
        if let Some(cached) = self.cache.accounts.get(address) {
            return Ok(cached.clone());
        }
        self.underlying.get_account(address)
    }

    fn get_storage(&self, address: &Address, slot: &H256) -> StorageResult<H256> {
        // A cached zero is an explicit clear and must shadow the base value
        if let Some(cached) = self.cache.storage.get(&(*address, *slot)) {
            return Ok(*cached);
        }
        self.underlying.get_storage(address, slot)
    }
}

impl StateWriter for CachedState<'_> {
    fn set_account(&mut self, address: Address, account: Account) -> StorageResult<()> {
        self.cache.set_account(address, account)
    }

    fn set_storage(&mut self, address: Address, slot: H256, value: H256) -> StorageResult<()> {
        self.cache.set_storage(address, slot, value)
    }
}
