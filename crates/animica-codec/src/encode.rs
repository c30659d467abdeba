//! Canonical encoder.

use crate::error::EncodeError;
use crate::value::{check_map_keys, Value};

fn ai_bytes(major: u8, n: u64) -> Vec<u8> {
    let major = major << 5;
    if n < 24 {
        vec![major | n as u8]
    } else if n <= 0xFF {
        vec![major | 24, n as u8]
    } else if n <= 0xFFFF {
        let mut out = vec![major | 25];
        out.extend_from_slice(&(n as u16).to_be_bytes());
        out
    } else if n <= 0xFFFF_FFFF {
        let mut out = vec![major | 26];
        out.extend_from_slice(&(n as u32).to_be_bytes());
        out
    } else {
        let mut out = vec![major | 27];
        out.extend_from_slice(&n.to_be_bytes());
        out
    }
}

fn encode_bytestring(major: u8, data: &[u8]) -> Vec<u8> {
    let mut out = ai_bytes(major, data.len() as u64);
    out.extend_from_slice(data);
    out
}

fn encode_int(i: &crate::int::Int) -> Result<Vec<u8>, EncodeError> {
    let major = if i.is_negative() { 1 } else { 0 };
    let mag = i.arg_magnitude_be();
    if mag.len() <= 8 {
        let mut buf = [0u8; 8];
        let start = 8 - mag.len();
        buf[start..].copy_from_slice(mag);
        Ok(ai_bytes(major, u64::from_be_bytes(buf)))
    } else {
        let tag = if i.is_negative() { 3 } else { 2 };
        let payload = encode_bytestring(2, mag);
        let mut out = ai_bytes(6, tag);
        out.extend_from_slice(&payload);
        Ok(out)
    }
}

/// Encodes a [`Value`] into canonical CBOR bytes.
pub fn encode(value: &Value) -> Result<Vec<u8>, EncodeError> {
    match value {
        Value::Null => Ok(vec![0xF6]),
        Value::Bool(false) => Ok(vec![0xF4]),
        Value::Bool(true) => Ok(vec![0xF5]),
        Value::Int(i) => encode_int(i),
        Value::Bytes(b) => Ok(encode_bytestring(2, b)),
        Value::Text(s) => Ok(encode_bytestring(3, s.as_bytes())),
        Value::Array(items) => {
            let mut out = ai_bytes(4, items.len() as u64);
            for item in items {
                out.extend_from_slice(&encode(item)?);
            }
            Ok(out)
        }
        Value::Map(pairs) => {
            if !check_map_keys(pairs) {
                return Err(EncodeError::UnsupportedMapKey);
            }
            let mut encoded: Vec<(Vec<u8>, Vec<u8>)> = Vec::with_capacity(pairs.len());
            for (k, v) in pairs {
                encoded.push((encode(k)?, encode(v)?));
            }
            encoded.sort_by(|a, b| a.0.cmp(&b.0));
            for w in encoded.windows(2) {
                if w[0].0 == w[1].0 {
                    return Err(EncodeError::DuplicateMapKey);
                }
            }
            let mut out = ai_bytes(5, encoded.len() as u64);
            for (k, v) in &encoded {
                out.extend_from_slice(k);
                out.extend_from_slice(v);
            }
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::int::Int;

    #[test]
    fn null_and_bools() {
        assert_eq!(encode(&Value::Null).unwrap(), vec![0xF6]);
        assert_eq!(encode(&Value::Bool(true)).unwrap(), vec![0xF5]);
        assert_eq!(encode(&Value::Bool(false)).unwrap(), vec![0xF4]);
    }

    #[test]
    fn small_uint_is_inline() {
        assert_eq!(encode(&Value::uint(5)).unwrap(), vec![0x05]);
        assert_eq!(encode(&Value::uint(23)).unwrap(), vec![0x17]);
        assert_eq!(encode(&Value::uint(24)).unwrap(), vec![0x18, 24]);
    }

    #[test]
    fn negative_one() {
        assert_eq!(encode(&Value::int(-1)).unwrap(), vec![0x20]);
    }

    #[test]
    fn bignum_beyond_u64() {
        let bytes = [0xFFu8; 32];
        let v = Value::Int(Int::from_magnitude_be(&bytes));
        let out = encode(&v).unwrap();
        // tag(2) major=6 ai=2 -> 0xC2, then byte string header + 32 bytes
        assert_eq!(out[0], 0xC2);
    }

    #[test]
    fn map_sorts_by_encoded_key_bytes() {
        let m = Value::Map(vec![
            (Value::text("z"), Value::uint(1)),
            (Value::text("a"), Value::uint(2)),
        ]);
        let out = encode(&m).unwrap();
        // map header (1 pair -> wait 2 pairs): 0xA2, then "a" entry before "z" entry
        assert_eq!(out[0], 0xA2);
        // text "a" encodes as 0x61 0x61; text "z" as 0x61 0x7A
        let a_pos = out.windows(2).position(|w| w == [0x61, 0x61]).unwrap();
        let z_pos = out.windows(2).position(|w| w == [0x61, 0x7A]).unwrap();
        assert!(a_pos < z_pos);
    }

    #[test]
    fn duplicate_keys_rejected() {
        let m = Value::Map(vec![
            (Value::uint(1), Value::uint(1)),
            (Value::uint(1), Value::uint(2)),
        ]);
        assert!(matches!(encode(&m), Err(EncodeError::DuplicateMapKey)));
    }
}
