//! Canonical decoder.
//!
//! Mirrors `animica-codec::encode`'s algorithm and the strictness level of
//! the reference decoder this was ported from: additional-info widths are
//! not re-validated for minimality (a non-canonical but well-formed input
//! that our own encoder would never produce is still accepted), but map-key
//! ordering, duplicate keys, disallowed tags, indefinite lengths, invalid
//! UTF-8, and trailing bytes are all rejected.

use crate::error::DecodeError;
use crate::int::Int;
use crate::value::Value;

struct Buf<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Buf<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Buf { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.pos + n > self.bytes.len() {
            return Err(DecodeError::Truncated);
        }
        let out = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn take1(&mut self) -> Result<u8, DecodeError> {
        let b = self.take(1)?;
        Ok(b[0])
    }
}

fn read_ai(buf: &mut Buf) -> Result<(u8, u64), DecodeError> {
    let ib = buf.take1()?;
    let major = ib >> 5;
    let ai = ib & 0x1F;
    if ai < 24 {
        return Ok((major, ai as u64));
    }
    match ai {
        24 => Ok((major, buf.take1()? as u64)),
        25 => {
            let b = buf.take(2)?;
            Ok((major, u16::from_be_bytes([b[0], b[1]]) as u64))
        }
        26 => {
            let b = buf.take(4)?;
            Ok((major, u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as u64))
        }
        27 => {
            let b = buf.take(8)?;
            let mut arr = [0u8; 8];
            arr.copy_from_slice(b);
            Ok((major, u64::from_be_bytes(arr)))
        }
        _ => Err(DecodeError::IndefiniteLength),
    }
}

fn decode_value(buf: &mut Buf) -> Result<Value, DecodeError> {
    let (major, ai) = read_ai(buf)?;
    match major {
        0 => Ok(Value::Int(Int::from_u64(ai))),
        1 => Ok(Value::Int(Int::negative_from_arg_be(&ai.to_be_bytes()))),
        2 => {
            let data = buf.take(ai as usize)?;
            Ok(Value::Bytes(data.to_vec()))
        }
        3 => {
            let data = buf.take(ai as usize)?;
            let s = std::str::from_utf8(data).map_err(|_| DecodeError::InvalidUtf8)?;
            Ok(Value::Text(s.to_string()))
        }
        4 => {
            let mut items = Vec::with_capacity(ai as usize);
            for _ in 0..ai {
                items.push(decode_value(buf)?);
            }
            Ok(Value::Array(items))
        }
        5 => {
            let mut pairs = Vec::with_capacity(ai as usize);
            let mut last_key_enc: Option<Vec<u8>> = None;
            for _ in 0..ai {
                let key_start = buf.pos;
                let key = decode_value(buf)?;
                let key_end = buf.pos;
                if !matches!(key, Value::Int(_) | Value::Bytes(_) | Value::Text(_)) {
                    return Err(DecodeError::UnsupportedMapKey);
                }
                let key_enc = buf.bytes[key_start..key_end].to_vec();
                if let Some(prev) = &last_key_enc {
                    if key_enc <= *prev {
                        // Equal encoded bytes means a duplicate key; strictly
                        // smaller means non-canonical ordering. Distinguish
                        // to match the reference decoder's two error kinds.
                        if key_enc == *prev {
                            return Err(DecodeError::DuplicateMapKey);
                        }
                        return Err(DecodeError::NonCanonicalMapOrder);
                    }
                }
                last_key_enc = Some(key_enc);
                let val = decode_value(buf)?;
                pairs.push((key, val));
            }
            Ok(Value::Map(pairs))
        }
        6 => {
            let tag = ai;
            if tag != 2 && tag != 3 {
                return Err(DecodeError::DisallowedTag(tag));
            }
            let (m_major, m_len) = read_ai(buf)?;
            if m_major != 2 {
                return Err(DecodeError::BignumNotBytes);
            }
            let mag = buf.take(m_len as usize)?;
            if mag.is_empty() {
                return Err(DecodeError::InvalidBignum);
            }
            if tag == 2 {
                Ok(Value::Int(Int::from_magnitude_be(mag)))
            } else {
                Ok(Value::Int(Int::negative_from_arg_be(mag)))
            }
        }
        7 => match ai {
            20 => Ok(Value::Bool(false)),
            21 => Ok(Value::Bool(true)),
            22 => Ok(Value::Null),
            _ => Err(DecodeError::DisallowedSimpleOrFloat),
        },
        _ => Err(DecodeError::UnknownMajorType),
    }
}

/// Decodes canonical CBOR bytes into a [`Value`], enforcing the same
/// constraints the encoder upholds (no floats, no indefinite items, no
/// disallowed tags, strictly canonical map key order, no trailing bytes).
pub fn decode(bytes: &[u8]) -> Result<Value, DecodeError> {
    let mut buf = Buf::new(bytes);
    let value = decode_value(&mut buf)?;
    if buf.pos != buf.bytes.len() {
        return Err(DecodeError::TrailingBytes);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode;

    #[test]
    fn round_trip_small_values() {
        for v in [Value::Null, Value::Bool(true), Value::Bool(false), Value::uint(0), Value::uint(23), Value::uint(24), Value::int(-1)] {
            let bytes = encode(&v).unwrap();
            assert_eq!(decode(&bytes).unwrap(), v);
        }
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut bytes = encode(&Value::uint(1)).unwrap();
        bytes.push(0x00);
        assert!(matches!(decode(&bytes), Err(DecodeError::TrailingBytes)));
    }

    #[test]
    fn float_simple_values_rejected() {
        // major 7, ai 27 (float64) is disallowed.
        let bytes = vec![0xFBu8, 0, 0, 0, 0, 0, 0, 0, 0];
        assert!(matches!(decode(&bytes), Err(DecodeError::DisallowedSimpleOrFloat)));
    }

    #[test]
    fn indefinite_length_rejected() {
        let bytes = vec![0x5F]; // byte string, ai=31 (indefinite)
        assert!(matches!(decode(&bytes), Err(DecodeError::IndefiniteLength)));
    }

    #[test]
    fn non_canonical_map_order_rejected() {
        // map with two text keys, "z" before "a" (wrong order)
        let mut bytes = vec![0xA2];
        bytes.extend(encode(&Value::text("z")).unwrap());
        bytes.extend(encode(&Value::uint(1)).unwrap());
        bytes.extend(encode(&Value::text("a")).unwrap());
        bytes.extend(encode(&Value::uint(2)).unwrap());
        assert!(matches!(decode(&bytes), Err(DecodeError::NonCanonicalMapOrder)));
    }

    #[test]
    fn duplicate_map_key_rejected() {
        let mut bytes = vec![0xA2];
        bytes.extend(encode(&Value::uint(1)).unwrap());
        bytes.extend(encode(&Value::uint(10)).unwrap());
        bytes.extend(encode(&Value::uint(1)).unwrap());
        bytes.extend(encode(&Value::uint(20)).unwrap());
        assert!(matches!(decode(&bytes), Err(DecodeError::DuplicateMapKey)));
    }

    #[test]
    fn bignum_round_trip() {
        let mag = [0xAAu8; 40];
        let v = Value::Int(Int::from_magnitude_be(&mag));
        let bytes = encode(&v).unwrap();
        assert_eq!(decode(&bytes).unwrap(), v);
    }
}
