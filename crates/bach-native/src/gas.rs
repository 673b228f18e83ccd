//! Gas metering for native contract execution

use serde::{Deserialize, Serialize};

use crate::error::{NativeError, NativeResult};

/// Gas costs for native storage operations
pub mod cost {
    /// Base gas pre-charged by every native dispatch
    pub const BASIC_GAS: u64 = 21000;
    /// Default multiplier applied to a method's raw gas
    pub const GAS_RATIO: f64 = 1.0;

    /// Delete (flat, whole chain)
    pub const DELETE: u64 = 1000;
    /// Read flat
    pub const READ_FLAT: u64 = 1000;
    /// Read per byte
    pub const READ_PER_BYTE: u64 = 3;
    /// Write flat
    pub const WRITE_FLAT: u64 = 2000;
    /// Write per byte
    pub const WRITE_PER_BYTE: u64 = 30;
}

/// Storage cost table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GasConfig {
    /// Flat cost of a delete, regardless of value length
    pub delete_cost: u64,
    /// Flat cost of a read
    pub read_cost_flat: u64,
    /// Cost per byte read
    pub read_cost_per_byte: u64,
    /// Flat cost of a write
    pub write_cost_flat: u64,
    /// Cost per byte written
    pub write_cost_per_byte: u64,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            delete_cost: cost::DELETE,
            read_cost_flat: cost::READ_FLAT,
            read_cost_per_byte: cost::READ_PER_BYTE,
            write_cost_flat: cost::WRITE_FLAT,
            write_cost_per_byte: cost::WRITE_PER_BYTE,
        }
    }
}

impl GasConfig {
    /// Total cost of reading `len` bytes
    pub fn read_cost(&self, len: usize) -> u64 {
        self.read_cost_flat
            .saturating_add(self.read_cost_per_byte.saturating_mul(len as u64))
    }

    /// Total cost of writing `len` bytes
    pub fn write_cost(&self, len: usize) -> u64 {
        self.write_cost_flat
            .saturating_add(self.write_cost_per_byte.saturating_mul(len as u64))
    }
}

/// Remaining-gas counter shared by every dispatch and storage access of one call.
///
/// Single writer: the owning `CallRef` lends it out by `&mut` for the duration
/// of each charge, so no two parties can observe it mid-update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasMeter {
    remaining: u64,
}

impl GasMeter {
    /// Create a meter holding `limit` gas
    pub fn new(limit: u64) -> Self {
        Self { remaining: limit }
    }

    /// Meter for gas-free paths (system calls, genesis setup)
    pub fn infinite() -> Self {
        Self { remaining: u64::MAX }
    }

    /// Gas left
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Charge `amount`.
    ///
    /// A charge that cannot be covered drains the meter to zero and fails;
    /// there is no partial consumption.
    pub fn consume(&mut self, amount: u64) -> NativeResult<()> {
        if self.remaining < amount {
            let available = self.remaining;
            self.remaining = 0;
            return Err(NativeError::InsufficientGas {
                required: amount,
                available,
            });
        }
        self.remaining -= amount;
        Ok(())
    }

    /// Return `amount` to the meter
    pub fn refund(&mut self, amount: u64) {
        self.remaining = self.remaining.saturating_add(amount);
    }
}
