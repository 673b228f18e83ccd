//! # bach-native
//!
//! Native-contract execution runtime for BachLedger.
//!
//! Native contracts are privileged handlers compiled into the node that run
//! directly against ledger state instead of through the EVM. This crate
//! provides:
//! - [`ContractRegistry`]: address -> contract table built at startup
//! - [`CallRef`]: per-transaction handle owning the call frames and gas meter
//! - [`Dispatcher`]: selector resolution with basic and per-method gas
//! - [`MeteredStore`]: gas-metered codec packing byte strings into 32-byte slots
//!
//! ## Example
//!
//! ```ignore
//! let mut registry = ContractRegistry::new(NativeConfig::default());
//! registry.register(Address::from_low_u64(0x1003), MyContract);
//!
//! let mut call = CallRef::new(&mut state, &registry, TxContext::new(sender, 100_000));
//! let output = call.module_call(sender, Address::from_low_u64(0x1003), payload)?;
//! let events = call.take_events();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod bridge;
mod call_ref;
mod config;
mod context;
mod dispatch;
mod error;
mod event;
mod gas;
mod registry;
mod store;
pub mod utils;

pub use bridge::{EvmBridge, EvmCallOutput};
pub use call_ref::CallRef;
pub use config::{ConfigError, NativeConfig};
pub use context::{CallFrame, ContextStack, TxContext, MAX_CONTEXT_DEPTH};
pub use dispatch::{Dispatcher, Invocation, Selector};
pub use error::{NativeError, NativeResult};
pub use event::Event;
pub use gas::{cost, GasConfig, GasMeter};
pub use registry::{ContractDescriptor, ContractRegistry, MethodDecl, MethodEntry, NativeContract};
pub use store::{encode_value, key_to_slot, next_slot, parse_key, MeteredStore, CHUNK_LEN};
