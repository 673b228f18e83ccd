//! Native runtime error types

use bach_primitives::{Address, H256};
use bach_storage::StorageError;
use thiserror::Error;

use crate::dispatch::Selector;

/// Native contract execution errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NativeError {
    /// Gas meter could not cover a charge
    #[error("insufficient gas: required {required}, available {available}")]
    InsufficientGas {
        /// Gas the operation needed
        required: u64,
        /// Gas left when the charge was attempted
        available: u64,
    },

    /// Call context stack deeper than allowed
    #[error("call context depth {depth} exceeds maximum {max}")]
    ContextDepthExceeded {
        /// Current depth
        depth: usize,
        /// Configured bound
        max: usize,
    },

    /// Dispatch attempted with no call frame
    #[error("call context stack is empty")]
    EmptyContextStack,

    /// Payload shorter than a method selector
    #[error("malformed payload: {0} bytes, need at least 4")]
    MalformedPayload(usize),

    /// No native contract registered at the address
    #[error("unknown native contract: {0}")]
    UnknownContract(Address),

    /// Contract has no method for the selector
    #[error("unknown method 0x{} on contract {contract}", hex::encode(.selector))]
    UnknownMethod {
        /// Target contract
        contract: Address,
        /// Unresolved selector
        selector: Selector,
    },

    /// Logical storage key does not extend past the address prefix
    #[error("storage key too short: {0} bytes, need more than 20")]
    StorageKeyTooShort(usize),

    /// Slot metadata byte describes an impossible chunk
    #[error("malformed value slot {0}")]
    MalformedSlot(H256),

    /// State layer failure
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Event could not be built
    #[error("invalid event: {0}")]
    InvalidEvent(String),

    /// Caller failed an origin / sender check
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Balance too low for a transfer
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Amount requested
        required: u128,
        /// Balance held
        available: u128,
    },

    /// Bytecode VM call failed
    #[error("evm call failed: {0}")]
    Evm(String),

    /// Handler-level failure
    #[error("execution failed: {0}")]
    Execution(String),
}

impl NativeError {
    /// Build a handler-level failure
    pub fn execution(reason: impl Into<String>) -> Self {
        NativeError::Execution(reason.into())
    }
}

/// Result type for native runtime operations
pub type NativeResult<T> = Result<T, NativeError>;
