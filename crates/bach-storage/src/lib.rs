//! # bach-storage
//!
//! State access layer for the BachLedger native runtime.
//!
//! This crate provides:
//! - Slot-level read/write traits ([`StateReader`], [`StateWriter`], [`State`])
//! - Account records (nonce, balance)
//! - An in-memory state ([`StateCache`]) and a copy-on-write overlay ([`CachedState`])

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod state;
mod traits;

pub use error::{StorageError, StorageResult};
pub use state::{CachedState, StateCache};
pub use traits::{Account, State, StateReader, StateWriter};
