//! Hook into the bytecode VM for native-to-EVM calls

use bach_primitives::Address;
use bytes::Bytes;

use crate::error::{NativeError, NativeResult};

/// Result of a call into the bytecode VM.
///
/// `gas_used` is reported whether or not the call failed: a reverted call
/// still burns the gas the VM spent before reverting.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvmCallOutput {
    /// Return data (revert data on failure)
    pub output: Bytes,
    /// Gas the VM spent
    pub gas_used: u64,
    /// Failure reported by the VM, if any
    pub error: Option<NativeError>,
}

impl EvmCallOutput {
    /// Successful call
    pub fn success(output: impl Into<Bytes>, gas_used: u64) -> Self {
        Self {
            output: output.into(),
            gas_used,
            error: None,
        }
    }

    /// Failed call that still spent `gas_used`
    pub fn failure(error: NativeError, gas_used: u64) -> Self {
        Self {
            output: Bytes::new(),
            gas_used,
            error: Some(error),
        }
    }

    /// Check if the VM reported no failure
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Split into the return data or the VM's failure
    pub fn into_result(self) -> NativeResult<Bytes> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.output),
        }
    }
}

/// Executes calls from native handlers into EVM contracts
pub trait EvmBridge {
    /// Run `input` against `target` on behalf of `caller` with at most `gas`
    fn call(&mut self, caller: Address, target: Address, gas: u64, input: &[u8]) -> EvmCallOutput;
}

impl<F> EvmBridge for F
where
    F: FnMut(Address, Address, u64, &[u8]) -> EvmCallOutput,
{
    fn call(&mut self, caller: Address, target: Address, gas: u64, input: &[u8]) -> EvmCallOutput {
        self(caller, target, gas, input)
    }
}
