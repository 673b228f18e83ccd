//! Event records emitted by native contracts

use bach_crypto::keccak256;
use bach_primitives::{Address, BlockHeight, H256};
use bytes::Bytes;

use crate::error::{NativeError, NativeResult};

/// Log entry produced by a native handler
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    /// Emitting contract
    pub address: Address,
    /// Height of the block the transaction executes in
    pub block_height: BlockHeight,
    /// Topic 0 is the event signature hash; indexed arguments follow
    pub topics: Vec<H256>,
    /// ABI-packed non-indexed arguments
    pub data: Bytes,
}

impl Event {
    /// Build an event; at least one topic is required
    pub fn new(
        address: Address,
        block_height: BlockHeight,
        topics: Vec<H256>,
        data: impl Into<Bytes>,
    ) -> NativeResult<Self> {
        if topics.is_empty() {
            return Err(NativeError::InvalidEvent(format!(
                "event from {} has no topics",
                address
            )));
        }
        Ok(Self {
            address,
            block_height,
            topics,
            data: data.into(),
        })
    }

    /// Topic identifying an event signature such as `"Transfer(address,address,uint256)"`
    pub fn signature_topic(signature: &str) -> H256 {
        keccak256(signature.as_bytes())
    }

    /// Signature hash of the event
    pub fn topic0(&self) -> Option<&H256> {
        self.topics.first()
    }
}
