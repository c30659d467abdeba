//! A non-negative integer bounded to 256 bits, used for amounts and
//! allowances.

use crate::error::InvalidConstruction;
use animica_codec::{Int, Value};

/// Maximum byte length of an [`Amount`]'s big-endian magnitude (256 bits).
const MAX_BYTES: usize = 32;

/// A non-negative integer in `[0, 2**256 - 1]`.
///
/// Stored as a minimal big-endian byte vector (no leading zero byte; zero is
/// the empty vector) so arithmetic and canonical CBOR encoding agree on a
/// single representation.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Vec<u8>);

impl Amount {
    /// The value zero.
    pub fn zero() -> Self {
        Amount(Vec::new())
    }

    /// Builds an `Amount` from a `u64`.
    pub fn from_u64(v: u64) -> Self {
        Amount::from_u128(v as u128)
    }

    /// Builds an `Amount` from a `u128`.
    pub fn from_u128(v: u128) -> Self {
        let mut bytes = v.to_be_bytes().to_vec();
        let first_nonzero = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
        bytes.drain(0..first_nonzero);
        Amount(bytes)
    }

    /// Builds an `Amount` from big-endian magnitude bytes, requiring the
    /// magnitude fit within 256 bits. Leading zero bytes are rejected only if
    /// they would make the encoding non-minimal; callers passing raw
    /// already-trimmed bytes are the common case, so this also accepts (and
    /// trims) a longer slice with leading zeros for convenience.
    pub fn from_be_bytes(bytes: &[u8]) -> Result<Self, InvalidConstruction> {
        let first_nonzero = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
        let trimmed = &bytes[first_nonzero..];
        if trimmed.len() > MAX_BYTES {
            return Err(InvalidConstruction::new("amount_exceeds_u256_max"));
        }
        Ok(Amount(trimmed.to_vec()))
    }

    /// The minimal big-endian magnitude bytes (empty for zero).
    pub fn as_be_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Whether this amount is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    /// Attempts to read this amount as a `u128`, failing if it does not fit.
    pub fn to_u128(&self) -> Option<u128> {
        if self.0.len() > 16 {
            return None;
        }
        let mut buf = [0u8; 16];
        let start = 16 - self.0.len();
        buf[start..].copy_from_slice(&self.0);
        Some(u128::from_be_bytes(buf))
    }

    /// Checked addition: `None` on overflow past the 256-bit ceiling.
    pub fn checked_add(&self, other: &Amount) -> Option<Amount> {
        let sum = add_be(&self.0, &other.0);
        if sum.len() > MAX_BYTES {
            None
        } else {
            Some(Amount(sum))
        }
    }

    /// Checked subtraction: `None` if `other` exceeds `self`.
    pub fn checked_sub(&self, other: &Amount) -> Option<Amount> {
        sub_be(&self.0, &other.0).map(Amount)
    }

    /// Encodes this amount as a canonical CBOR integer (bignum tag if it
    /// exceeds 64 bits).
    pub fn to_value(&self) -> Value {
        Value::Int(Int::from_magnitude_be(&self.0))
    }

    /// Decodes an amount from a canonical CBOR non-negative integer value.
    pub fn from_value(v: &Value) -> Result<Self, InvalidConstruction> {
        let i = v.as_int().ok_or(InvalidConstruction::new("amount_not_int"))?;
        if i.is_negative() {
            return Err(InvalidConstruction::new("amount_negative"));
        }
        Amount::from_be_bytes(i.arg_magnitude_be())
    }
}

fn add_be(a: &[u8], b: &[u8]) -> Vec<u8> {
    let len = a.len().max(b.len()) + 1;
    let mut out = vec![0u8; len];
    let mut carry = 0u16;
    for i in 0..len {
        let av = a.len().checked_sub(1 + i).and_then(|idx| a.get(idx)).copied().unwrap_or(0) as u16;
        let bv = b.len().checked_sub(1 + i).and_then(|idx| b.get(idx)).copied().unwrap_or(0) as u16;
        let sum = av + bv + carry;
        out[len - 1 - i] = (sum & 0xFF) as u8;
        carry = sum >> 8;
    }
    let first_nonzero = out.iter().position(|&b| b != 0).unwrap_or(out.len());
    out.drain(0..first_nonzero);
    out
}

fn sub_be(a: &[u8], b: &[u8]) -> Option<Vec<u8>> {
    if cmp_be(a, b) == std::cmp::Ordering::Less {
        return None;
    }
    let len = a.len();
    let mut out = vec![0u8; len];
    let mut borrow = 0i16;
    for i in 0..len {
        let av = a[len - 1 - i] as i16;
        let bv = b.len().checked_sub(1 + i).and_then(|idx| b.get(idx)).copied().unwrap_or(0) as i16;
        let mut diff = av - bv - borrow;
        if diff < 0 {
            diff += 256;
            borrow = 1;
        } else {
            borrow = 0;
        }
        out[len - 1 - i] = diff as u8;
    }
    let first_nonzero = out.iter().position(|&b| b != 0).unwrap_or(out.len());
    out.drain(0..first_nonzero);
    Some(out)
}

fn cmp_be(a: &[u8], b: &[u8]) -> std::cmp::Ordering {
    if a.len() != b.len() {
        a.len().cmp(&b.len())
    } else {
        a.cmp(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_round_trips() {
        let a = Amount::zero();
        assert!(a.is_zero());
        assert_eq!(Amount::from_value(&a.to_value()).unwrap(), a);
    }

    #[test]
    fn u256_max_round_trips() {
        let bytes = [0xFFu8; 32];
        let a = Amount::from_be_bytes(&bytes).unwrap();
        assert_eq!(a.as_be_bytes(), &bytes[..]);
        assert_eq!(Amount::from_value(&a.to_value()).unwrap(), a);
    }

    #[test]
    fn above_u256_max_rejected() {
        let bytes = [0xFFu8; 33];
        assert!(Amount::from_be_bytes(&bytes).is_err());
    }

    #[test]
    fn checked_add_and_sub() {
        let a = Amount::from_u64(5);
        let b = Amount::from_u64(3);
        assert_eq!(a.checked_add(&b).unwrap().to_u128(), Some(8));
        assert_eq!(a.checked_sub(&b).unwrap().to_u128(), Some(2));
        assert!(b.checked_sub(&a).is_none());
    }

    #[test]
    fn checked_add_overflows_at_u256_max() {
        let max = Amount::from_be_bytes(&[0xFFu8; 32]).unwrap();
        let one = Amount::from_u64(1);
        assert!(max.checked_add(&one).is_none());
    }
}
