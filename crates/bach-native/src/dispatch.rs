//! Selector-based method dispatch with two-tier gas accounting

use bach_crypto::SELECTOR_LEN;
use bach_primitives::{Address, H256};
use bach_storage::State;
use bytes::Bytes;

use crate::bridge::EvmCallOutput;
use crate::call_ref::CallRef;
use crate::context::CallFrame;
use crate::error::{NativeError, NativeResult};
use crate::event::Event;
use crate::registry::ContractDescriptor;
use crate::store::MeteredStore;
use crate::utils::concat_key;

/// First four bytes of `keccak256(signature)`
pub type Selector = [u8; SELECTOR_LEN];

/// Resolves and runs the current frame of a [`CallRef`]
pub struct Dispatcher<'c, 'a> {
    call_ref: &'c mut CallRef<'a>,
}

impl<'c, 'a> Dispatcher<'c, 'a> {
    /// Bind a dispatcher to a call
    pub fn new(call_ref: &'c mut CallRef<'a>) -> Self {
        Self { call_ref }
    }

    /// Execute the current frame.
    ///
    /// The basic charge is taken before anything is validated, so every call
    /// that fails before reaching a handler costs exactly `basic_gas`. Once the
    /// method is known, the basic charge is replaced by the method's final
    /// cost (never less than `basic_gas`) before the handler runs.
    pub fn invoke(self) -> NativeResult<Bytes> {
        let registry = self.call_ref.registry();
        let basic_gas = registry.config().basic_gas;

        self.call_ref.gas_mut().consume(basic_gas)?;
        self.call_ref.contexts().ensure_valid()?;

        let frame = self
            .call_ref
            .contexts()
            .current()
            .cloned()
            .ok_or(NativeError::EmptyContextStack)?;
        if frame.payload.len() < SELECTOR_LEN {
            return Err(NativeError::MalformedPayload(frame.payload.len()));
        }
        let mut selector = [0u8; SELECTOR_LEN];
        selector.copy_from_slice(&frame.payload[..SELECTOR_LEN]);

        let contract = registry
            .get(&frame.target)
            .ok_or(NativeError::UnknownContract(frame.target))?;
        let entry = contract
            .method(&selector)
            .ok_or(NativeError::UnknownMethod {
                contract: frame.target,
                selector,
            })?;

        tracing::debug!(
            "dispatch {}.{} from {} (depth {}, gas {})",
            contract.name(),
            entry.signature,
            frame.caller,
            self.call_ref.contexts().depth(),
            entry.gas
        );

        let gas = self.call_ref.gas_mut();
        gas.refund(basic_gas);
        gas.consume(entry.gas.max(basic_gas))?;

        let mut inv = Invocation {
            call_ref: self.call_ref,
            contract,
            frame,
            selector,
        };
        contract.execute(entry, &mut inv)
    }
}

/// What a handler sees of the call it is executing
pub struct Invocation<'c, 'a> {
    call_ref: &'c mut CallRef<'a>,
    contract: &'a ContractDescriptor,
    frame: CallFrame,
    selector: Selector,
}

impl<'c, 'a> Invocation<'c, 'a> {
    /// Address of the executing contract
    pub fn address(&self) -> Address {
        self.frame.target
    }

    /// Immediate caller of this frame
    pub fn caller(&self) -> Address {
        self.frame.caller
    }

    /// Full call data, selector included
    pub fn payload(&self) -> &Bytes {
        &self.frame.payload
    }

    /// Call data after the selector
    pub fn input(&self) -> &[u8] {
        &self.frame.payload[SELECTOR_LEN..]
    }

    /// Selector that resolved this method
    pub fn selector(&self) -> Selector {
        self.selector
    }

    /// Name of the executing contract
    pub fn contract_name(&self) -> &str {
        self.contract.name()
    }

    /// The enclosing call
    pub fn call_ref(&self) -> &CallRef<'a> {
        &*self.call_ref
    }

    /// Mutable access to the enclosing call
    pub fn call_ref_mut(&mut self) -> &mut CallRef<'a> {
        &mut *self.call_ref
    }

    /// Storage key in this contract's namespace
    pub fn key(&self, parts: &[&[u8]]) -> Vec<u8> {
        concat_key(&self.frame.target, parts)
    }

    /// Metered storage charged to this call's gas
    pub fn store(&mut self) -> MeteredStore<'_, dyn State + 'a> {
        self.call_ref.store()
    }

    /// Call another native contract with this contract as caller
    pub fn module_call(&mut self, target: Address, payload: impl Into<Bytes>) -> NativeResult<Bytes> {
        let caller = self.frame.target;
        self.call_ref.module_call(caller, target, payload)
    }

    /// Call an EVM contract with this contract as caller, giving it at most
    /// `gas` (clamped to the gas left)
    pub fn evm_call(
        &mut self,
        target: Address,
        gas: u64,
        input: &[u8],
    ) -> NativeResult<EvmCallOutput> {
        let caller = self.frame.target;
        self.call_ref.evm_call(caller, target, gas, input)
    }

    /// Emit an event: topic 0 is `keccak256(event_signature)`, then `indexed`
    pub fn notify(
        &mut self,
        event_signature: &str,
        indexed: &[H256],
        data: impl Into<Bytes>,
    ) -> NativeResult<()> {
        let mut topics = Vec::with_capacity(indexed.len() + 1);
        topics.push(Event::signature_topic(event_signature));
        topics.extend_from_slice(indexed);
        let address = self.frame.target;
        self.call_ref.emit(address, topics, data)
    }
}
