//! Contracts and fixtures shared by the integration tests

#![allow(dead_code)]

use bach_crypto::method_selector;
use bach_native::utils::{bytes_to_u32, transfer, u32_to_bytes, validate_origin};
use bach_native::{
    ContractRegistry, Invocation, MethodDecl, NativeConfig, NativeContract, NativeError,
    NativeResult, TxContext,
};
use bach_primitives::{Address, H256};
use bytes::Bytes;

pub const COUNTER: Address = Address::from_low_u64(0x1003);
pub const ECHO: Address = Address::from_low_u64(0x1004);
pub const ADMIN: Address = Address::from_low_u64(0xad);
pub const ALICE: Address = Address::from_low_u64(0xa1);
pub const BOB: Address = Address::from_low_u64(0xb0);

pub const EVM_GAS_CAP: u64 = 10_000;

pub const STORED_EVENT: &str = "Stored(address,bytes)";

/// Selector of `signature` followed by raw argument bytes
pub fn payload(signature: &str, args: &[u8]) -> Vec<u8> {
    let mut data = method_selector(signature).to_vec();
    data.extend_from_slice(args);
    data
}

pub fn registry() -> ContractRegistry {
    let mut registry = ContractRegistry::new(NativeConfig::default());
    registry.register(COUNTER, Counter);
    registry.register(ECHO, Echo);
    registry
}

pub fn tx(gas_limit: u64) -> TxContext {
    TxContext {
        origin: ALICE,
        caller: ALICE,
        tx_hash: H256::from_bytes([0x5a; 32]),
        block_height: 1000,
        gas_limit,
    }
}

fn address_arg(input: &[u8]) -> NativeResult<Address> {
    if input.len() < Address::LEN {
        return Err(NativeError::execution("missing address argument"));
    }
    Address::from_slice(&input[..Address::LEN]).map_err(|e| NativeError::execution(e.to_string()))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CounterMethod {
    Ping,
    Charge,
    Expensive,
    Put,
    Load,
    Drop,
    Emit,
    Recurse,
    Relay,
    CallEvm,
    CallEvmCapped,
    Admin,
    Pay,
    Fail,
}

/// Exercises every facility a handler can reach
pub struct Counter;

impl NativeContract for Counter {
    type Method = CounterMethod;

    fn name(&self) -> &str {
        "counter"
    }

    fn methods(&self) -> Vec<MethodDecl<CounterMethod>> {
        vec![
            MethodDecl::new(CounterMethod::Ping, "ping()", 0),
            MethodDecl::new(CounterMethod::Charge, "charge()", 29000),
            MethodDecl::new(CounterMethod::Expensive, "expensive()", 200_000),
            MethodDecl::new(CounterMethod::Put, "put(bytes)", 0),
            MethodDecl::new(CounterMethod::Load, "load()", 0),
            MethodDecl::new(CounterMethod::Drop, "drop()", 0),
            MethodDecl::new(CounterMethod::Emit, "emit(bytes)", 0),
            MethodDecl::new(CounterMethod::Recurse, "recurse(uint32)", 0),
            MethodDecl::new(CounterMethod::Relay, "relay(address)", 0),
            MethodDecl::new(CounterMethod::CallEvm, "callEvm(address)", 0),
            MethodDecl::new(CounterMethod::CallEvmCapped, "callEvmCapped(address)", 0),
            MethodDecl::new(CounterMethod::Admin, "admin()", 0),
            MethodDecl::new(CounterMethod::Pay, "pay(address)", 0),
            MethodDecl::new(CounterMethod::Fail, "fail()", 0),
        ]
    }

    fn call(&self, method: CounterMethod, inv: &mut Invocation<'_, '_>) -> NativeResult<Bytes> {
        match method {
            CounterMethod::Ping => Ok(Bytes::from_static(b"pong")),
            CounterMethod::Charge | CounterMethod::Expensive => Ok(Bytes::new()),
            CounterMethod::Put => {
                let key = inv.key(&[b"data"]);
                let value = inv.input().to_vec();
                inv.store().put(&key, &value)?;
                Ok(Bytes::new())
            }
            CounterMethod::Load => {
                let key = inv.key(&[b"data"]);
                Ok(Bytes::from(inv.store().get_bytes(&key)?))
            }
            CounterMethod::Drop => {
                let key = inv.key(&[b"data"]);
                inv.store().delete(&key)?;
                Ok(Bytes::new())
            }
            CounterMethod::Emit => {
                let data = inv.input().to_vec();
                let caller = inv.caller().to_word();
                inv.notify(STORED_EVENT, &[caller], data)?;
                Ok(Bytes::new())
            }
            CounterMethod::Recurse => {
                let remaining = bytes_to_u32(inv.input());
                if remaining == 0 {
                    let depth = inv.call_ref().contexts().depth() as u32;
                    return Ok(Bytes::copy_from_slice(&u32_to_bytes(depth)));
                }
                let next = payload("recurse(uint32)", &u32_to_bytes(remaining - 1));
                let this = inv.address();
                inv.module_call(this, next)
            }
            CounterMethod::Relay => {
                let target = address_arg(inv.input())?;
                inv.module_call(target, payload("whoami()", &[]))
            }
            CounterMethod::CallEvm => {
                let target = address_arg(inv.input())?;
                let gas = inv.call_ref().gas_left();
                let out = inv.evm_call(target, gas, b"evm-input")?;
                Ok(out.output)
            }
            CounterMethod::CallEvmCapped => {
                let target = address_arg(inv.input())?;
                let out = inv.evm_call(target, EVM_GAS_CAP, b"evm-input")?;
                Ok(out.output)
            }
            CounterMethod::Admin => {
                validate_origin(inv.call_ref(), &ADMIN)?;
                Ok(Bytes::from_static(b"ok"))
            }
            CounterMethod::Pay => {
                let to = address_arg(inv.input())?;
                let from = inv.caller();
                let amount = inv.call_ref().value().low_u128();
                transfer(inv.call_ref_mut().state_mut(), &from, &to, amount)?;
                Ok(Bytes::new())
            }
            CounterMethod::Fail => Err(NativeError::execution("boom")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EchoMethod {
    WhoAmI,
}

/// Reports who called it
pub struct Echo;

impl NativeContract for Echo {
    type Method = EchoMethod;

    fn name(&self) -> &str {
        "echo"
    }

    fn methods(&self) -> Vec<MethodDecl<EchoMethod>> {
        vec![MethodDecl::new(EchoMethod::WhoAmI, "whoami()", 0)]
    }

    fn call(&self, method: EchoMethod, inv: &mut Invocation<'_, '_>) -> NativeResult<Bytes> {
        match method {
            EchoMethod::WhoAmI => Ok(Bytes::copy_from_slice(inv.caller().as_bytes())),
        }
    }
}
