//! # bach-crypto
//!
//! Cryptographic primitives for the BachLedger native runtime.
//!
//! - Keccak-256 hashing (storage slot derivation, event topics)
//! - 4-byte method selectors

#![warn(missing_docs)]
#![warn(clippy::all)]

mod hash;

pub use hash::{keccak256, method_selector, SELECTOR_LEN};
