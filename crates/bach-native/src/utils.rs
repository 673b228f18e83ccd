//! Helpers shared by native contract handlers

use bach_primitives::Address;
use bach_storage::State;

use crate::call_ref::CallRef;
use crate::error::{NativeError, NativeResult};

/// Build a logical storage key: `address ‖ part0 ‖ part1 ‖ ...`
pub fn concat_key(address: &Address, parts: &[&[u8]]) -> Vec<u8> {
    let len = Address::LEN + parts.iter().map(|p| p.len()).sum::<usize>();
    let mut key = Vec::with_capacity(len);
    key.extend_from_slice(address.as_bytes());
    for part in parts {
        key.extend_from_slice(part);
    }
    key
}

/// Little-endian encoding of a `u32`
pub fn u32_to_bytes(value: u32) -> [u8; 4] {
    value.to_le_bytes()
}

/// Decode a little-endian `u32`; any other width decodes to 0
pub fn bytes_to_u32(bytes: &[u8]) -> u32 {
    match <[u8; 4]>::try_from(bytes) {
        Ok(raw) => u32::from_le_bytes(raw),
        Err(_) => 0,
    }
}

/// Little-endian encoding of a `u64`
pub fn u64_to_bytes(value: u64) -> [u8; 8] {
    value.to_le_bytes()
}

/// Decode a little-endian `u64`; any other width decodes to 0
pub fn bytes_to_u64(bytes: &[u8]) -> u64 {
    match <[u8; 8]>::try_from(bytes) {
        Ok(raw) => u64::from_le_bytes(raw),
        Err(_) => 0,
    }
}

/// Require the transaction to be signed by `expected`
pub fn validate_origin(call_ref: &CallRef<'_>, expected: &Address) -> NativeResult<()> {
    if call_ref.tx_origin() != *expected {
        return Err(NativeError::Unauthorized(format!(
            "origin {} is not {}",
            call_ref.tx_origin(),
            expected
        )));
    }
    Ok(())
}

/// Require the transaction's immediate sender to be `expected`
pub fn validate_sender(call_ref: &CallRef<'_>, expected: &Address) -> NativeResult<()> {
    if call_ref.msg_sender() != *expected {
        return Err(NativeError::Unauthorized(format!(
            "sender {} is not {}",
            call_ref.msg_sender(),
            expected
        )));
    }
    Ok(())
}

/// Move `amount` from `from` to `to`
pub fn transfer<S: State + ?Sized>(
    state: &mut S,
    from: &Address,
    to: &Address,
    amount: u128,
) -> NativeResult<()> {
    let available = state.get_balance(from)?;
    if available < amount {
        return Err(NativeError::InsufficientBalance {
            required: amount,
            available,
        });
    }
    // a self-transfer still needs the funds
    if amount == 0 || from == to {
        return Ok(());
    }
    if !state.sub_balance(from, amount)? {
        return Err(NativeError::InsufficientBalance {
            required: amount,
            available,
        });
    }
    state.add_balance(to, amount)?;
    tracing::trace!("transferred {} from {} to {}", amount, from, to);
    Ok(())
}
