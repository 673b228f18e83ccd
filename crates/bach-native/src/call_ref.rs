//! Per-transaction handle for native execution

use bach_primitives::{Address, BlockHeight, H256, U256};
use bach_storage::State;
use bytes::Bytes;

use crate::bridge::{EvmBridge, EvmCallOutput};
use crate::context::{CallFrame, ContextStack, TxContext};
use crate::dispatch::Dispatcher;
use crate::error::NativeResult;
use crate::event::Event;
use crate::gas::GasMeter;
use crate::registry::ContractRegistry;
use crate::store::MeteredStore;

/// Everything one top-level call needs: state, gas, call frames and the
/// transaction it belongs to. Nested native calls share it.
pub struct CallRef<'a> {
    contexts: ContextStack,
    state: &'a mut dyn State,
    registry: &'a ContractRegistry,
    gas: GasMeter,
    tx: TxContext,
    evm_bridge: Option<Box<dyn EvmBridge + 'a>>,
    value: U256,
    tx_to: Address,
    events: Vec<Event>,
}

impl<'a> CallRef<'a> {
    /// Create a call metered with `tx.gas_limit`
    pub fn new(state: &'a mut dyn State, registry: &'a ContractRegistry, tx: TxContext) -> Self {
        let gas = GasMeter::new(tx.gas_limit);
        Self::with_meter(state, registry, tx, gas)
    }

    /// Create an unmetered call for system transactions
    pub fn system(state: &'a mut dyn State, registry: &'a ContractRegistry, tx: TxContext) -> Self {
        Self::with_meter(state, registry, tx, GasMeter::infinite())
    }

    fn with_meter(
        state: &'a mut dyn State,
        registry: &'a ContractRegistry,
        tx: TxContext,
        gas: GasMeter,
    ) -> Self {
        Self {
            contexts: ContextStack::new(registry.config().max_call_depth),
            state,
            registry,
            gas,
            tx,
            evm_bridge: None,
            value: U256::zero(),
            tx_to: Address::ZERO,
            events: Vec::new(),
        }
    }

    /// Attach the bytecode VM bridge
    pub fn with_evm_bridge(mut self, bridge: impl EvmBridge + 'a) -> Self {
        self.evm_bridge = Some(Box::new(bridge));
        self
    }

    // ==================== Calls ====================

    /// Run `payload` against the native contract at `target`.
    ///
    /// The frame is pushed for the duration of the dispatch and popped on
    /// every exit path.
    pub fn module_call(
        &mut self,
        caller: Address,
        target: Address,
        payload: impl Into<Bytes>,
    ) -> NativeResult<Bytes> {
        self.contexts.push(CallFrame::new(caller, target, payload));
        let result = Dispatcher::new(self).invoke();
        self.contexts.pop();

        if let Err(err) = &result {
            tracing::error!(
                "native call to {} failed: {} (tx {}, gas left {})",
                target,
                err,
                self.tx.tx_hash,
                self.gas.remaining()
            );
        }
        result
    }

    /// Call an EVM contract through the bridge with at most `gas`.
    ///
    /// The cap is clamped to the gas left. Gas the VM reports as used is
    /// charged before a VM failure is returned, so a reverted call is not
    /// free. Without a bridge the call succeeds with empty output and costs
    /// nothing.
    pub fn evm_call(
        &mut self,
        caller: Address,
        target: Address,
        gas: u64,
        input: &[u8],
    ) -> NativeResult<EvmCallOutput> {
        let Some(bridge) = self.evm_bridge.as_mut() else {
            return Ok(EvmCallOutput::default());
        };
        let gas = gas.min(self.gas.remaining());
        let mut result = bridge.call(caller, target, gas, input);
        self.gas.consume(result.gas_used)?;
        tracing::trace!(
            "evm call {} -> {} used {} of {} gas",
            caller,
            target,
            result.gas_used,
            gas
        );
        if let Some(err) = result.error.take() {
            return Err(err);
        }
        Ok(result)
    }

    // ==================== Storage ====================

    /// Metered storage charged to this call's gas
    pub fn store(&mut self) -> MeteredStore<'_, dyn State + 'a> {
        MeteredStore::new(
            &mut *self.state,
            &mut self.gas,
            &self.registry.config().storage,
        )
    }

    /// Unmetered state access
    pub fn state_mut(&mut self) -> &mut (dyn State + 'a) {
        &mut *self.state
    }

    // ==================== Events ====================

    /// Record an event from `address`
    pub fn emit(&mut self, address: Address, topics: Vec<H256>, data: impl Into<Bytes>) -> NativeResult<()> {
        let event = Event::new(address, self.tx.block_height, topics, data)?;
        self.events.push(event);
        Ok(())
    }

    /// Events recorded so far
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Hand the recorded events to the caller, leaving the buffer empty
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // ==================== Transaction ====================

    /// `msg.sender` of the top-level call
    pub fn msg_sender(&self) -> Address {
        self.tx.caller
    }

    /// `tx.origin`
    pub fn tx_origin(&self) -> Address {
        self.tx.origin
    }

    /// Transaction hash
    pub fn tx_hash(&self) -> H256 {
        self.tx.tx_hash
    }

    /// Current block height
    pub fn block_height(&self) -> BlockHeight {
        self.tx.block_height
    }

    /// Gas left on the shared meter
    pub fn gas_left(&self) -> u64 {
        self.gas.remaining()
    }

    /// Shared gas meter
    pub fn gas_mut(&mut self) -> &mut GasMeter {
        &mut self.gas
    }

    /// Call frames
    pub fn contexts(&self) -> &ContextStack {
        &self.contexts
    }

    /// Contract registry
    pub fn registry(&self) -> &'a ContractRegistry {
        self.registry
    }

    /// Record `tx.value`; zero is ignored
    pub fn set_value(&mut self, value: U256) {
        if !value.is_zero() {
            self.value = value;
        }
    }

    /// `tx.value`
    pub fn value(&self) -> U256 {
        self.value
    }

    /// Record `tx.to`; the zero address is ignored
    pub fn set_to(&mut self, to: Address) {
        if !to.is_zero() {
            self.tx_to = to;
        }
    }

    /// `tx.to`
    pub fn tx_to(&self) -> Address {
        self.tx_to
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NativeConfig;
    use crate::error::NativeError;
    use bach_storage::StateCache;

    fn tx() -> TxContext {
        TxContext {
            origin: Address::from_low_u64(1),
            caller: Address::from_low_u64(2),
            tx_hash: H256::from_bytes([0xaa; 32]),
            block_height: 42,
            gas_limit: 100_000,
        }
    }

    #[test]
    fn test_accessors() {
        let registry = ContractRegistry::default();
        let mut state = StateCache::new();
        let call = CallRef::new(&mut state, &registry, tx());

        assert_eq!(call.tx_origin(), Address::from_low_u64(1));
        assert_eq!(call.msg_sender(), Address::from_low_u64(2));
        assert_eq!(call.tx_hash(), H256::from_bytes([0xaa; 32]));
        assert_eq!(call.block_height(), 42);
        assert_eq!(call.gas_left(), 100_000);
        assert!(call.contexts().is_empty());
        assert_eq!(call.contexts().max_depth(), 128);
    }

    #[test]
    fn test_system_call_is_unmetered() {
        let registry = ContractRegistry::default();
        let mut state = StateCache::new();
        let call = CallRef::system(&mut state, &registry, tx());
        assert_eq!(call.gas_left(), u64::MAX);
    }

    #[test]
    fn test_value_and_to() {
        let registry = ContractRegistry::default();
        let mut state = StateCache::new();
        let mut call = CallRef::new(&mut state, &registry, tx());

        call.set_value(U256::zero());
        assert_eq!(call.value(), U256::zero());
        call.set_value(U256::from(5u64));
        call.set_value(U256::zero());
        assert_eq!(call.value(), U256::from(5u64));

        call.set_to(Address::ZERO);
        assert_eq!(call.tx_to(), Address::ZERO);
        call.set_to(Address::from_low_u64(0x1003));
        call.set_to(Address::ZERO);
        assert_eq!(call.tx_to(), Address::from_low_u64(0x1003));
    }

    #[test]
    fn test_evm_call_without_bridge() {
        let registry = ContractRegistry::default();
        let mut state = StateCache::new();
        let mut call = CallRef::new(&mut state, &registry, tx());

        let out = call
            .evm_call(Address::ZERO, Address::from_low_u64(7), 50_000, &[1, 2])
            .unwrap();
        assert_eq!(out, EvmCallOutput::default());
        assert_eq!(call.gas_left(), 100_000);
    }

    #[test]
    fn test_evm_call_charges_used_gas() {
        let registry = ContractRegistry::default();
        let mut state = StateCache::new();
        let mut call = CallRef::new(&mut state, &registry, tx()).with_evm_bridge(
            |_caller: Address, _target: Address, gas: u64, input: &[u8]| {
                assert_eq!(gas, 100_000);
                EvmCallOutput::success(Bytes::copy_from_slice(input), 30_000)
            },
        );

        let out = call
            .evm_call(Address::ZERO, Address::from_low_u64(7), u64::MAX, &[9])
            .unwrap();
        assert_eq!(&out.output[..], &[9]);
        assert!(out.is_success());
        assert_eq!(call.gas_left(), 70_000);
    }

    #[test]
    fn test_evm_call_passes_gas_cap() {
        let registry = ContractRegistry::default();
        let mut state = StateCache::new();
        let mut call = CallRef::new(&mut state, &registry, tx()).with_evm_bridge(
            |_caller: Address, _target: Address, gas: u64, _input: &[u8]| {
                assert_eq!(gas, 25_000);
                EvmCallOutput::success(Bytes::new(), gas)
            },
        );

        call.evm_call(Address::ZERO, Address::from_low_u64(7), 25_000, &[])
            .unwrap();
        assert_eq!(call.gas_left(), 75_000);
    }

    #[test]
    fn test_evm_revert_still_charges_gas() {
        let registry = ContractRegistry::default();
        let mut state = StateCache::new();
        let mut call = CallRef::new(&mut state, &registry, tx()).with_evm_bridge(
            |_caller: Address, _target: Address, _gas: u64, _input: &[u8]| {
                EvmCallOutput::failure(NativeError::Evm("reverted".into()), 40_000)
            },
        );

        assert_eq!(
            call.evm_call(Address::ZERO, Address::ZERO, 100_000, &[]),
            Err(NativeError::Evm("reverted".into()))
        );
        assert_eq!(call.gas_left(), 60_000);
    }

    #[test]
    fn test_evm_overspend_drains_meter() {
        let registry = ContractRegistry::default();
        let mut state = StateCache::new();
        let mut call = CallRef::new(&mut state, &registry, tx()).with_evm_bridge(
            |_caller: Address, _target: Address, _gas: u64, _input: &[u8]| {
                EvmCallOutput::success(Bytes::new(), 150_000)
            },
        );

        assert_eq!(
            call.evm_call(Address::ZERO, Address::ZERO, 100_000, &[]),
            Err(NativeError::InsufficientGas { required: 150_000, available: 100_000 })
        );
        assert_eq!(call.gas_left(), 0);
    }

    #[test]
    fn test_emit_and_take_events() {
        let registry = ContractRegistry::default();
        let mut state = StateCache::new();
        let mut call = CallRef::new(&mut state, &registry, tx());

        let topic = Event::signature_topic("Ping()");
        call.emit(Address::from_low_u64(3), vec![topic], Bytes::new())
            .unwrap();
        assert!(matches!(
            call.emit(Address::from_low_u64(3), Vec::new(), Bytes::new()),
            Err(NativeError::InvalidEvent(_))
        ));

        assert_eq!(call.events().len(), 1);
        let events = call.take_events();
        assert_eq!(events[0].block_height, 42);
        assert_eq!(events[0].topics, vec![topic]);
        assert!(call.events().is_empty());
    }

    #[test]
    fn test_module_call_unknown_contract_pops_frame() {
        let registry = ContractRegistry::new(NativeConfig::default());
        let mut state = StateCache::new();
        let mut call = CallRef::new(&mut state, &registry, tx());

        let target = Address::from_low_u64(0x1009);
        assert_eq!(
            call.module_call(Address::from_low_u64(2), target, vec![0, 0, 0, 0]),
            Err(NativeError::UnknownContract(target))
        );
        assert_eq!(call.gas_left(), 100_000 - 21000);
        // entry frame stays
        assert_eq!(call.contexts().depth(), 1);
    }
}
