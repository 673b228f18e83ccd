//! Storage traits for state access

use crate::error::{StorageError, StorageResult};
use bach_primitives::{Address, H256};

/// Account data
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Account {
    /// Account nonce
    pub nonce: u64,
    /// Account balance
    pub balance: u128,
}

impl Account {
    /// Create an account holding `balance`
    pub fn with_balance(balance: u128) -> Self {
        Self { nonce: 0, balance }
    }

    /// Check if account is empty (EIP-161, without code)
    pub fn is_empty(&self) -> bool {
        self.nonce == 0 && self.balance == 0
    }
}

/// Read access to state
pub trait StateReader {
    /// Get account by address
    fn get_account(&self, address: &Address) -> StorageResult<Option<Account>>;

    /// Get the 32-byte value of a storage slot (zero when unset)
    fn get_storage(&self, address: &Address, slot: &H256) -> StorageResult<H256>;

    /// Check if account exists
    fn account_exists(&self, address: &Address) -> StorageResult<bool> {
        Ok(self.get_account(address)?.is_some())
    }

    /// Get account balance
    fn get_balance(&self, address: &Address) -> StorageResult<u128> {
        Ok(self.get_account(address)?.map(|a| a.balance).unwrap_or(0))
    }
}

/// Write access to state
pub trait StateWriter: StateReader {
    /// Set account
    fn set_account(&mut self, address: Address, account: Account) -> StorageResult<()>;

    /// Set storage slot; writing the zero word clears it
    fn set_storage(&mut self, address: Address, slot: H256, value: H256) -> StorageResult<()>;

    /// Add to balance
    fn add_balance(&mut self, address: &Address, amount: u128) -> StorageResult<()> {
        let mut account = self.get_account(address)?.unwrap_or_default();
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or_else(|| StorageError::InvalidFormat("balance overflow".into()))?;
        self.set_account(*address, account)
    }

    /// Subtract from balance (returns false if insufficient)
    fn sub_balance(&mut self, address: &Address, amount: u128) -> StorageResult<bool> {
        let mut account = self.get_account(address)?.unwrap_or_default();
        if account.balance < amount {
            return Ok(false);
        }
        account.balance -= amount;
        self.set_account(*address, account)?;
        Ok(true)
    }
}

/// Combined read/write state access
pub trait State: StateReader + StateWriter {}

impl<T: StateReader + StateWriter> State for T {}
