//! The opaque 32-byte address type shared by senders, contracts, and logs.

use crate::error::InvalidConstruction;
use animica_codec::Value;

/// Length in bytes of every [`Address`]. Representation-independent;
/// bech32m (or any other textual form) happens at RPC/SDK edges only.
pub const ADDRESS_LEN: usize = 32;

/// An opaque 32-byte identifier for an account or contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// Builds an `Address` directly from a 32-byte array.
    pub const fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Address(bytes)
    }

    /// Builds an `Address` from a byte slice, requiring it be exactly
    /// [`ADDRESS_LEN`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, InvalidConstruction> {
        let arr: [u8; ADDRESS_LEN] = bytes
            .try_into()
            .map_err(|_| InvalidConstruction::new("address_length"))?;
        Ok(Address(arr))
    }

    /// The underlying 32 bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Encodes this address as a canonical CBOR byte string.
    pub fn to_value(self) -> Value {
        Value::bytes(self.0.to_vec())
    }

    /// Decodes an address from a canonical CBOR byte string value.
    pub fn from_value(v: &Value) -> Result<Self, InvalidConstruction> {
        let bytes = v.as_bytes().ok_or(InvalidConstruction::new("address_length"))?;
        Address::from_slice(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        Address(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_length() {
        let err = Address::from_slice(&[0u8; 31]).unwrap_err();
        assert_eq!(err.reason, "address_length");
    }

    #[test]
    fn round_trips_through_value() {
        let a = Address::from_bytes([0x22u8; 32]);
        let v = a.to_value();
        assert_eq!(Address::from_value(&v).unwrap(), a);
    }
}
