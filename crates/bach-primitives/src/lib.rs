//! # bach-primitives
//!
//! Primitive types for the BachLedger native-contract runtime.
//!
//! - [`Address`]: 20-byte account / contract identifier
//! - [`H256`] (alias [`Slot`]): 32-byte word, used as a storage cell and slot id
//! - [`U256`]: 256-bit unsigned integer

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod hash;

pub use address::{Address, AddressError};
pub use hash::{HashError, H256};

// Re-export primitive-types for U256
pub use primitive_types::U256;

/// A 32-byte storage cell / slot identifier inside an account's namespace
pub type Slot = H256;

/// Block height type
pub type BlockHeight = u64;

/// Convert a [`U256`] to its big-endian 32-byte word
pub fn u256_to_h256(value: &U256) -> H256 {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    H256::from_bytes(bytes)
}

/// Interpret a 32-byte word as a big-endian [`U256`]
pub fn h256_to_u256(word: &H256) -> U256 {
    U256::from_big_endian(word.as_bytes())
}
