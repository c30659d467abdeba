//! Access-list entries: `(addr, storage_keys)` pairs used for gas metering
//! of storage-key pre-declaration.

use crate::address::Address;
use crate::error::{InvalidConstruction, TypesDecodeError};
use animica_codec::Value;

/// One access-list entry: an address plus the storage keys the transaction
/// pre-declares it will touch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessEntry {
    /// The contract address being accessed.
    pub addr: Address,
    /// The storage keys pre-declared for `addr`.
    pub storage_keys: Vec<Vec<u8>>,
}

impl AccessEntry {
    /// Builds a new access-list entry.
    pub fn new(addr: Address, storage_keys: Vec<Vec<u8>>) -> Self {
        AccessEntry { addr, storage_keys }
    }

    /// Encodes this entry as `{addr, keys}`.
    pub fn to_value(&self) -> Value {
        Value::Map(vec![
            (Value::text("addr"), self.addr.to_value()),
            (
                Value::text("keys"),
                Value::Array(self.storage_keys.iter().cloned().map(Value::bytes).collect()),
            ),
        ])
    }

    /// Decodes an entry from `{addr, keys}`.
    pub fn from_value(v: &Value) -> Result<Self, TypesDecodeError> {
        let addr_v = v
            .map_get_text("addr")
            .ok_or(TypesDecodeError::MissingField("addr"))?;
        let addr = Address::from_value(addr_v)?;
        let keys_v = v
            .map_get_text("keys")
            .ok_or(TypesDecodeError::MissingField("keys"))?;
        let keys_arr = keys_v
            .as_array()
            .ok_or(TypesDecodeError::WrongType("keys"))?;
        let mut storage_keys = Vec::with_capacity(keys_arr.len());
        for k in keys_arr {
            let bytes = k
                .as_bytes()
                .ok_or(InvalidConstruction::new("access_entry_key_not_bytes"))?;
            storage_keys.push(bytes.to_vec());
        }
        Ok(AccessEntry { addr, storage_keys })
    }
}
