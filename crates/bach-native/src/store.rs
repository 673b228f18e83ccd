//! Gas-metered storage codec for native contracts.
//!
//! A logical key is `address ‖ subkey`. Values live in the address's slot
//! namespace starting at `keccak256(subkey)`:
//!
//! - fixed-width values (address, hash, U256) take exactly that one slot;
//! - byte strings are cut into 31-byte chunks chained across slots. A
//!   non-final chunk is stored as `0x01 ‖ chunk`; the final chunk of length
//!   `L` as `(L << 1)` in the first byte with the chunk right-aligned in the
//!   last `L` bytes. The slot after `s` is `keccak256(s + 1)`, with `s` read
//!   as a big-endian 256-bit integer.
//!
//! Every charge is taken from the shared [`GasMeter`] before the state is
//! touched for a write, so a failed charge leaves no partial value behind.

use bach_crypto::keccak256;
use bach_primitives::{h256_to_u256, u256_to_h256, Address, Slot, H256, U256};
use bach_storage::State;

use crate::error::{NativeError, NativeResult};
use crate::gas::{GasConfig, GasMeter};

/// Payload bytes carried by one slot of a chained value
pub const CHUNK_LEN: usize = H256::LEN - 1;

const MORE_FLAG: u8 = 1;

/// Split a logical key into its account address and head slot
pub fn parse_key(key: &[u8]) -> NativeResult<(Address, Slot)> {
    if key.len() <= Address::LEN {
        return Err(NativeError::StorageKeyTooShort(key.len()));
    }
    let mut address = [0u8; 20];
    address.copy_from_slice(&key[..Address::LEN]);
    Ok((Address::from_bytes(address), key_to_slot(&key[Address::LEN..])))
}

/// Head slot of a subkey
pub fn key_to_slot(subkey: &[u8]) -> Slot {
    keccak256(subkey)
}

/// Slot following `slot` in a value chain
pub fn next_slot(slot: &Slot) -> Slot {
    keccak256(slot.increment().as_bytes())
}

/// Encode a byte string into the words of its slot chain
pub fn encode_value(value: &[u8]) -> Vec<H256> {
    let mut words = Vec::with_capacity(value.len() / CHUNK_LEN + 1);
    let mut rest = value;
    loop {
        if rest.len() <= CHUNK_LEN {
            words.push(encode_chunk(rest, false));
            return words;
        }
        let (chunk, tail) = rest.split_at(CHUNK_LEN);
        words.push(encode_chunk(chunk, true));
        rest = tail;
    }
}

fn encode_chunk(chunk: &[u8], more: bool) -> H256 {
    let mut word = [0u8; 32];
    if more {
        word[0] = MORE_FLAG;
        word[1..].copy_from_slice(chunk);
    } else {
        word[0] = (chunk.len() as u8) << 1;
        word[H256::LEN - chunk.len()..].copy_from_slice(chunk);
    }
    H256::from_bytes(word)
}

/// Chunk bytes of a word and whether the chain continues
fn decode_chunk(slot: &Slot, word: &H256) -> NativeResult<(Vec<u8>, bool)> {
    let bytes = word.as_bytes();
    let meta = bytes[0];
    if meta & MORE_FLAG == MORE_FLAG {
        return Ok((bytes[1..].to_vec(), true));
    }
    let len = (meta >> 1) as usize;
    if len > CHUNK_LEN {
        return Err(NativeError::MalformedSlot(*slot));
    }
    Ok((bytes[H256::LEN - len..].to_vec(), false))
}

fn continues(word: &H256) -> bool {
    word.as_bytes()[0] & MORE_FLAG == MORE_FLAG
}

/// Metered view over one state, charging a shared gas meter
pub struct MeteredStore<'s, S: State + ?Sized> {
    state: &'s mut S,
    meter: &'s mut GasMeter,
    config: &'s GasConfig,
}

impl<'s, S: State + ?Sized> MeteredStore<'s, S> {
    /// Create a store over `state` charging `meter` with the costs in `config`
    pub fn new(state: &'s mut S, meter: &'s mut GasMeter, config: &'s GasConfig) -> Self {
        Self { state, meter, config }
    }

    /// Gas left on the shared meter
    pub fn gas_left(&self) -> u64 {
        self.meter.remaining()
    }

    /// Cost table in use
    pub fn gas_config(&self) -> &GasConfig {
        self.config
    }

    // ==================== Fixed-width values ====================

    /// Store an address in the key's slot
    pub fn set_address(&mut self, key: &[u8], value: &Address) -> NativeResult<()> {
        self.set_word(key, value.to_word())
    }

    /// Read an address (zero address when unset)
    pub fn get_address(&mut self, key: &[u8]) -> NativeResult<Address> {
        Ok(Address::from_word(&self.get_word(key)?))
    }

    /// Clear an address
    pub fn del_address(&mut self, key: &[u8]) -> NativeResult<()> {
        self.del_word(key)
    }

    /// Store a hash in the key's slot
    pub fn set_hash(&mut self, key: &[u8], value: &H256) -> NativeResult<()> {
        self.set_word(key, *value)
    }

    /// Read a hash (zero when unset)
    pub fn get_hash(&mut self, key: &[u8]) -> NativeResult<H256> {
        self.get_word(key)
    }

    /// Clear a hash
    pub fn del_hash(&mut self, key: &[u8]) -> NativeResult<()> {
        self.del_word(key)
    }

    /// Store an integer in the key's slot
    pub fn set_u256(&mut self, key: &[u8], value: &U256) -> NativeResult<()> {
        self.set_word(key, u256_to_h256(value))
    }

    /// Read an integer (zero when unset)
    pub fn get_u256(&mut self, key: &[u8]) -> NativeResult<U256> {
        Ok(h256_to_u256(&self.get_word(key)?))
    }

    /// Clear an integer
    pub fn del_u256(&mut self, key: &[u8]) -> NativeResult<()> {
        self.del_word(key)
    }

    fn set_word(&mut self, key: &[u8], word: H256) -> NativeResult<()> {
        let (address, slot) = parse_key(key)?;
        self.meter.consume(self.config.write_cost(H256::LEN))?;
        self.state.set_storage(address, slot, word)?;
        Ok(())
    }

    fn get_word(&mut self, key: &[u8]) -> NativeResult<H256> {
        let (address, slot) = parse_key(key)?;
        self.meter.consume(self.config.read_cost(H256::LEN))?;
        Ok(self.state.get_storage(&address, &slot)?)
    }

    fn del_word(&mut self, key: &[u8]) -> NativeResult<()> {
        let (address, slot) = parse_key(key)?;
        self.meter.consume(self.config.delete_cost)?;
        self.state.set_storage(address, slot, H256::ZERO)?;
        Ok(())
    }

    // ==================== Byte strings ====================

    /// Store a byte string of any length.
    ///
    /// Costs `write_cost_flat + len * write_cost_per_byte`. Slots left over
    /// from a longer previous value under the same key are cleared.
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> NativeResult<()> {
        let (address, head) = parse_key(key)?;
        self.meter.consume(self.config.write_cost(value.len()))?;

        let stale = self.chain_len(&address, &head)?;
        let words = encode_value(value);

        let mut slot = head;
        for (i, word) in words.iter().enumerate() {
            if i > 0 {
                slot = next_slot(&slot);
            }
            self.state.set_storage(address, slot, *word)?;
        }
        for _ in words.len()..stale {
            slot = next_slot(&slot);
            self.state.set_storage(address, slot, H256::ZERO)?;
        }

        tracing::trace!(
            "put {} bytes in {} slots for {} (cleared {})",
            value.len(),
            words.len(),
            address,
            stale.saturating_sub(words.len())
        );
        Ok(())
    }

    /// Read a byte string.
    ///
    /// An unset key and a key holding the empty string both read as `None`:
    /// the encoding of `b""` is the zero word.
    pub fn get(&mut self, key: &[u8]) -> NativeResult<Option<Vec<u8>>> {
        let (address, head) = parse_key(key)?;
        self.meter.consume(self.config.read_cost_flat)?;

        let mut slot = head;
        let mut word = self.state.get_storage(&address, &slot)?;
        if word.is_zero() {
            return Ok(None);
        }

        let mut value = Vec::new();
        loop {
            let (chunk, more) = decode_chunk(&slot, &word)?;
            value.extend_from_slice(&chunk);
            if !more {
                break;
            }
            slot = next_slot(&slot);
            word = self.state.get_storage(&address, &slot)?;
        }

        self.meter.consume(
            self.config
                .read_cost_per_byte
                .saturating_mul(value.len() as u64),
        )?;
        if value.is_empty() {
            return Ok(None);
        }
        Ok(Some(value))
    }

    /// Read a byte string, empty when absent
    pub fn get_bytes(&mut self, key: &[u8]) -> NativeResult<Vec<u8>> {
        Ok(self.get(key)?.unwrap_or_default())
    }

    /// Whether the key holds a non-empty value (charged as a read)
    pub fn contains(&mut self, key: &[u8]) -> NativeResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Delete a byte string, zeroing every slot of its chain.
    ///
    /// Costs `delete_cost` whatever the chain length.
    pub fn delete(&mut self, key: &[u8]) -> NativeResult<()> {
        let (address, head) = parse_key(key)?;
        self.meter.consume(self.config.delete_cost)?;

        let mut slot = head;
        let mut cleared = 0usize;
        loop {
            let word = self.state.get_storage(&address, &slot)?;
            self.state.set_storage(address, slot, H256::ZERO)?;
            cleared += 1;
            if !continues(&word) {
                break;
            }
            slot = next_slot(&slot);
        }

        tracing::trace!("deleted {} slots for {}", cleared, address);
        Ok(())
    }

    /// Slots occupied by the chain starting at `head` (0 when unset)
    fn chain_len(&self, address: &Address, head: &Slot) -> NativeResult<usize> {
        let mut word = self.state.get_storage(address, head)?;
        if word.is_zero() {
            return Ok(0);
        }
        let mut slot = *head;
        let mut len = 1;
        while continues(&word) {
            slot = next_slot(&slot);
            word = self.state.get_storage(address, &slot)?;
            len += 1;
        }
        Ok(len)
    }
}
