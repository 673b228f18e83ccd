//! Native contract registration
//!
//! Contracts are registered once at startup. Registration resolves every
//! method signature to its selector and final gas cost, producing an
//! immutable [`ContractDescriptor`] that dispatch consults on each call.

use std::collections::HashMap;

use bach_crypto::method_selector;
use bach_primitives::Address;
use bytes::Bytes;

use crate::config::NativeConfig;
use crate::dispatch::{Invocation, Selector};
use crate::error::{NativeError, NativeResult};

/// A contract implemented in the node rather than in bytecode
pub trait NativeContract: Send + Sync + 'static {
    /// Closed set of methods the contract exposes
    type Method: Copy + Send + Sync + 'static;

    /// Human-readable contract name
    fn name(&self) -> &str;

    /// Method declarations, in registration order
    fn methods(&self) -> Vec<MethodDecl<Self::Method>>;

    /// Execute `method` for the current call frame
    fn call(&self, method: Self::Method, inv: &mut Invocation<'_, '_>) -> NativeResult<Bytes>;
}

/// One exported method: its ABI signature and raw gas cost
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodDecl<M> {
    /// Method handled by [`NativeContract::call`]
    pub method: M,
    /// ABI signature, e.g. `"transfer(address,uint256)"`
    pub signature: String,
    /// Cost before the basic charge and ratio are applied
    pub raw_gas: u64,
}

impl<M> MethodDecl<M> {
    /// Declare a method
    pub fn new(method: M, signature: impl Into<String>, raw_gas: u64) -> Self {
        Self {
            method,
            signature: signature.into(),
            raw_gas,
        }
    }
}

/// Resolved method of a registered contract
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodEntry {
    index: usize,
    /// ABI signature
    pub signature: String,
    /// Final gas charged when the method is dispatched
    pub gas: u64,
}

trait DynContract: Send + Sync {
    fn call(&self, index: usize, inv: &mut Invocation<'_, '_>) -> NativeResult<Bytes>;
}

struct Bound<C: NativeContract> {
    contract: C,
    methods: Vec<C::Method>,
}

impl<C: NativeContract> DynContract for Bound<C> {
    fn call(&self, index: usize, inv: &mut Invocation<'_, '_>) -> NativeResult<Bytes> {
        let method = self
            .methods
            .get(index)
            .copied()
            .ok_or_else(|| NativeError::execution(format!("no method at index {}", index)))?;
        self.contract.call(method, inv)
    }
}

/// Immutable per-address record built at registration
pub struct ContractDescriptor {
    address: Address,
    name: String,
    methods: HashMap<Selector, MethodEntry>,
    contract: Box<dyn DynContract>,
}

impl ContractDescriptor {
    fn build<C: NativeContract>(address: Address, contract: C, config: &NativeConfig) -> Self {
        let decls = contract.methods();
        let mut methods = HashMap::with_capacity(decls.len());
        let mut bound = Vec::with_capacity(decls.len());

        for (index, decl) in decls.into_iter().enumerate() {
            let selector = method_selector(&decl.signature);
            let gas = config.method_gas(decl.raw_gas);
            tracing::trace!(
                "{} 0x{} -> {} (gas {})",
                contract.name(),
                hex::encode(selector),
                decl.signature,
                gas
            );
            bound.push(decl.method);
            methods.insert(
                selector,
                MethodEntry {
                    index,
                    signature: decl.signature,
                    gas,
                },
            );
        }

        Self {
            address,
            name: contract.name().to_string(),
            methods,
            contract: Box::new(Bound {
                contract,
                methods: bound,
            }),
        }
    }

    /// Contract address
    pub fn address(&self) -> Address {
        self.address
    }

    /// Contract name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a method by selector
    pub fn method(&self, selector: &Selector) -> Option<&MethodEntry> {
        self.methods.get(selector)
    }

    /// Number of distinct selectors
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    pub(crate) fn execute(
        &self,
        entry: &MethodEntry,
        inv: &mut Invocation<'_, '_>,
    ) -> NativeResult<Bytes> {
        self.contract.call(entry.index, inv)
    }
}

impl std::fmt::Debug for ContractDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractDescriptor")
            .field("address", &self.address)
            .field("name", &self.name)
            .field("methods", &self.methods.len())
            .finish()
    }
}

/// Address -> contract table, immutable once the node is running
#[derive(Debug, Default)]
pub struct ContractRegistry {
    config: NativeConfig,
    contracts: HashMap<Address, ContractDescriptor>,
}

impl ContractRegistry {
    /// Create an empty registry pricing methods with `config`
    pub fn new(config: NativeConfig) -> Self {
        Self {
            config,
            contracts: HashMap::new(),
        }
    }

    /// Runtime configuration
    pub fn config(&self) -> &NativeConfig {
        &self.config
    }

    /// Register `contract` at `address`, replacing any previous registration.
    ///
    /// Methods whose signatures share a selector keep the last declaration.
    pub fn register<C: NativeContract>(&mut self, address: Address, contract: C) {
        let descriptor = ContractDescriptor::build(address, contract, &self.config);
        tracing::debug!(
            "registered native contract {} at {} ({} methods)",
            descriptor.name(),
            address,
            descriptor.method_count()
        );
        if self.contracts.insert(address, descriptor).is_some() {
            tracing::debug!("replaced native contract at {}", address);
        }
    }

    /// Descriptor of the contract at `address`
    pub fn get(&self, address: &Address) -> Option<&ContractDescriptor> {
        self.contracts.get(address)
    }

    /// Whether `address` hosts a native contract
    pub fn contains(&self, address: &Address) -> bool {
        self.contracts.contains_key(address)
    }

    /// Registered addresses, sorted
    pub fn addresses(&self) -> Vec<Address> {
        let mut addresses: Vec<Address> = self.contracts.keys().copied().collect();
        addresses.sort();
        addresses
    }

    /// Number of registered contracts
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    /// Check if no contract is registered
    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}
