//! Keccak-256 hashing and selector derivation

use bach_primitives::H256;
use sha3::{Digest, Keccak256};

/// Width of a method selector in bytes
pub const SELECTOR_LEN: usize = 4;

/// Compute Keccak-256 hash of the input data
pub fn keccak256(data: &[u8]) -> H256 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let result = hasher.finalize();
    H256::from_bytes(result.into())
}

/// Selector of a method signature such as `"transfer(address,uint256)"`:
/// the first four bytes of its Keccak-256 hash.
pub fn method_selector(signature: &str) -> [u8; SELECTOR_LEN] {
    let hash = keccak256(signature.as_bytes());
    let mut selector = [0u8; SELECTOR_LEN];
    selector.copy_from_slice(&hash.as_bytes()[..SELECTOR_LEN]);
    selector
}
