//! SignBytes envelope construction: `{1:domain, 2:chain_id, 3:payload, [4:extra]}`.

use crate::domain::is_known_domain;
use crate::error::SignBytesError;
use animica_codec::{encode, Value};

const MAX_NESTING_DEPTH: usize = 1000;

fn check_nesting(value: &Value, depth: usize) -> Result<(), SignBytesError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(SignBytesError::NestingTooDeep);
    }
    match value {
        Value::Array(items) => {
            for item in items {
                check_nesting(item, depth + 1)?;
            }
        }
        Value::Map(pairs) => {
            for (k, v) in pairs {
                check_nesting(k, depth + 1)?;
                check_nesting(v, depth + 1)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Builds the canonical SignBytes map for `domain`/`chain_id`/`payload`
/// (and optional `extra`), without yet encoding it to bytes.
fn build_envelope(
    domain: &str,
    chain_id: u64,
    payload: Value,
    extra: Option<Value>,
) -> Result<Value, SignBytesError> {
    if !is_known_domain(domain) {
        return Err(SignBytesError::UnknownDomain(domain.to_string()));
    }
    check_nesting(&payload, 0)?;
    let mut pairs = vec![
        (Value::uint(1), Value::text(domain)),
        (Value::uint(2), Value::uint(chain_id)),
        (Value::uint(3), payload),
    ];
    if let Some(extra) = extra {
        check_nesting(&extra, 0)?;
        pairs.push((Value::uint(4), extra));
    }
    Ok(Value::Map(pairs))
}

/// Produces domain-separated canonical SignBytes for `payload` under
/// `domain` and `chain_id`. `chain_id` is taken as `u64` because negative
/// chain ids are rejected by construction upstream in `animica-types`; a
/// signed `i64` entry point is also provided for callers decoding
/// untrusted input where negativity itself is the error to report.
pub fn signbytes(
    domain: &str,
    payload: Value,
    chain_id: u64,
    extra: Option<Value>,
) -> Result<Vec<u8>, SignBytesError> {
    let envelope = build_envelope(domain, chain_id, payload, extra)?;
    encode(&envelope).map_err(SignBytesError::from)
}

/// As [`signbytes`], but accepts a possibly-negative `chain_id` and
/// reports [`SignBytesError::NegativeChainId`] if it is negative.
pub fn signbytes_checked(
    domain: &str,
    payload: Value,
    chain_id: i64,
    extra: Option<Value>,
) -> Result<Vec<u8>, SignBytesError> {
    if chain_id < 0 {
        return Err(SignBytesError::NegativeChainId);
    }
    signbytes(domain, payload, chain_id as u64, extra)
}

/// SignBytes for an `UnsignedTx`-shaped payload under the tx-sign domain.
pub fn signbytes_tx(payload: Value, chain_id: u64) -> Result<Vec<u8>, SignBytesError> {
    signbytes(crate::domain::DOM_TX_SIGN_V1, payload, chain_id, None)
}

/// SignBytes for a `Header`-shaped payload under the header-sign domain.
pub fn signbytes_header(payload: Value, chain_id: u64) -> Result<Vec<u8>, SignBytesError> {
    signbytes(crate::domain::DOM_HEADER_SIGN_V1, payload, chain_id, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use animica_codec::decode;

    #[test]
    fn envelope_keys_are_in_order_1_2_3() {
        let payload = Value::Map(vec![
            (Value::text("z"), Value::uint(1)),
            (Value::text("a"), Value::uint(2)),
        ]);
        let bytes = signbytes_tx(payload, 1).unwrap();
        let decoded = decode(&bytes).unwrap();
        match decoded {
            Value::Map(pairs) => {
                assert_eq!(pairs.len(), 3);
                assert_eq!(pairs[0].0, Value::uint(1));
                assert_eq!(pairs[1].0, Value::uint(2));
                assert_eq!(pairs[2].0, Value::uint(3));
                // payload map inside sorts "a" before "z"
                match &pairs[2].1 {
                    Value::Map(inner) => {
                        assert_eq!(inner[0].0, Value::text("a"));
                        assert_eq!(inner[1].0, Value::text("z"));
                    }
                    _ => panic!("expected payload map"),
                }
            }
            _ => panic!("expected map"),
        }
    }

    #[test]
    fn unknown_domain_rejected() {
        let err = signbytes("animica/bogus/v1", Value::Null, 1, None).unwrap_err();
        assert!(matches!(err, SignBytesError::UnknownDomain(_)));
    }

    #[test]
    fn negative_chain_id_rejected() {
        let err = signbytes_checked("animica/tx/sign/v1", Value::Null, -1, None).unwrap_err();
        assert_eq!(err, SignBytesError::NegativeChainId);
    }

    #[test]
    fn excessive_nesting_rejected() {
        let mut payload = Value::Null;
        for _ in 0..1100 {
            payload = Value::Array(vec![payload]);
        }
        let err = signbytes_tx(payload, 1).unwrap_err();
        assert_eq!(err, SignBytesError::NestingTooDeep);
    }
}
