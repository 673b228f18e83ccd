//! Execution context for native calls

use bach_primitives::{Address, BlockHeight, H256};
use bytes::Bytes;

use crate::error::{NativeError, NativeResult};

/// Maximum depth of nested native calls
pub const MAX_CONTEXT_DEPTH: usize = 128;

/// One native call: who called, which contract, with what payload
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallFrame {
    /// Caller address (`msg.sender` of this frame)
    pub caller: Address,
    /// Native contract being executed
    pub target: Address,
    /// Call data: selector followed by arguments
    pub payload: Bytes,
}

impl CallFrame {
    /// Create a new call frame
    pub fn new(caller: Address, target: Address, payload: impl Into<Bytes>) -> Self {
        Self {
            caller,
            target,
            payload: payload.into(),
        }
    }
}

/// Transaction environment a top-level call runs in
#[derive(Clone, Debug)]
pub struct TxContext {
    /// Transaction origin (the signer)
    pub origin: Address,
    /// Immediate sender of the top-level call
    pub caller: Address,
    /// Transaction hash
    pub tx_hash: H256,
    /// Height of the block being executed
    pub block_height: BlockHeight,
    /// Gas supplied to the call
    pub gas_limit: u64,
}

impl Default for TxContext {
    fn default() -> Self {
        Self {
            origin: Address::ZERO,
            caller: Address::ZERO,
            tx_hash: H256::ZERO,
            block_height: 0,
            gas_limit: 0,
        }
    }
}

impl TxContext {
    /// Context for a plain call from `sender` (origin and caller coincide)
    pub fn new(sender: Address, gas_limit: u64) -> Self {
        Self {
            origin: sender,
            caller: sender,
            gas_limit,
            ..Default::default()
        }
    }
}

/// Bounded stack of nested call frames.
///
/// The bottom (entry) frame is never popped; it goes away with the stack.
#[derive(Clone, Debug)]
pub struct ContextStack {
    frames: Vec<CallFrame>,
    max_depth: usize,
}

impl Default for ContextStack {
    fn default() -> Self {
        Self::new(MAX_CONTEXT_DEPTH)
    }
}

impl ContextStack {
    /// Create an empty stack bounded by `max_depth`
    pub fn new(max_depth: usize) -> Self {
        Self {
            frames: Vec::new(),
            max_depth,
        }
    }

    /// Push a frame
    pub fn push(&mut self, frame: CallFrame) {
        self.frames.push(frame);
    }

    /// Pop the current frame; a no-op at depth 1 or below
    pub fn pop(&mut self) -> Option<CallFrame> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    /// Frame being executed
    pub fn current(&self) -> Option<&CallFrame> {
        self.frames.last()
    }

    /// Frame that called the current one
    pub fn calling(&self) -> Option<&CallFrame> {
        self.frames.len().checked_sub(2).map(|i| &self.frames[i])
    }

    /// Bottom frame of the call
    pub fn entry(&self) -> Option<&CallFrame> {
        self.frames.first()
    }

    /// Number of frames
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Configured bound
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Check if there are no frames
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// True when non-empty and within the depth bound
    pub fn check(&self) -> bool {
        self.ensure_valid().is_ok()
    }

    /// Like [`check`](Self::check), reporting which bound was violated
    pub fn ensure_valid(&self) -> NativeResult<()> {
        if self.frames.is_empty() {
            return Err(NativeError::EmptyContextStack);
        }
        if self.frames.len() > self.max_depth {
            return Err(NativeError::ContextDepthExceeded {
                depth: self.frames.len(),
                max: self.max_depth,
            });
        }
        Ok(())
    }
}
