//! Logs and receipts: the deterministic record of a transaction's effects.

use crate::address::Address;
use crate::error::{reject_unknown_fields, InvalidConstruction, TypesDecodeError};
use animica_codec::Value;

/// Length in bytes of every [`Log`] topic.
pub const TOPIC_LEN: usize = 32;

/// The outcome of executing a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReceiptStatus {
    /// The transaction completed and its staging area was merged.
    Success = 0,
    /// The contract explicitly reverted; staging area discarded.
    Revert = 1,
    /// Gas was exhausted before completion; staging area discarded.
    Oog = 2,
}

impl ReceiptStatus {
    fn as_u64(self) -> u64 {
        self as u64
    }

    fn from_u64(tag: u64) -> Result<Self, TypesDecodeError> {
        match tag {
            0 => Ok(ReceiptStatus::Success),
            1 => Ok(ReceiptStatus::Revert),
            2 => Ok(ReceiptStatus::Oog),
            _other => Err(InvalidConstruction::new("receipt_status_unknown").into()),
        }
    }
}

/// A deterministic, chain-agnostic event emitted by a contract during
/// execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Log {
    /// The emitting contract's address.
    pub address: Address,
    /// Opaque 32-byte topic selectors, in emission order.
    pub topics: Vec<[u8; TOPIC_LEN]>,
    /// The log's data payload.
    pub data: Vec<u8>,
}

impl Log {
    /// Builds a `Log`.
    pub fn new(address: Address, topics: Vec<[u8; TOPIC_LEN]>, data: Vec<u8>) -> Self {
        Log { address, topics, data }
    }

    /// Encodes this log as `{address, topics, data}`.
    pub fn to_value(&self) -> Value {
        Value::Map(vec![
            (Value::text("address"), self.address.to_value()),
            (
                Value::text("topics"),
                Value::Array(self.topics.iter().map(|t| Value::bytes(t.to_vec())).collect()),
            ),
            (Value::text("data"), Value::bytes(self.data.clone())),
        ])
    }

    /// Decodes a log from `{address, topics, data}`.
    pub fn from_value(v: &Value) -> Result<Self, TypesDecodeError> {
        reject_unknown_fields(v, &["address", "topics", "data"])?;
        let address = Address::from_value(
            v.map_get_text("address")
                .ok_or(TypesDecodeError::MissingField("address"))?,
        )?;
        let topics_v = v
            .map_get_text("topics")
            .ok_or(TypesDecodeError::MissingField("topics"))?;
        let topics_arr = topics_v.as_array().ok_or(TypesDecodeError::WrongType("topics"))?;
        let mut topics = Vec::with_capacity(topics_arr.len());
        for t in topics_arr {
            let bytes = t
                .as_bytes()
                .ok_or(InvalidConstruction::new("log_topic_not_bytes"))?;
            let arr: [u8; TOPIC_LEN] = bytes
                .try_into()
                .map_err(|_| InvalidConstruction::new("log_topic_length"))?;
            topics.push(arr);
        }
        let data = v
            .map_get_text("data")
            .and_then(|x| x.as_bytes())
            .ok_or(TypesDecodeError::MissingField("data"))?
            .to_vec();
        Ok(Log { address, topics, data })
    }
}

const RECEIPT_VERSION: u64 = 1;

/// The canonical receipt produced when a transaction's execution frame
/// closes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    /// The execution outcome.
    pub status: ReceiptStatus,
    /// Total gas consumed.
    pub gas_used: u64,
    /// Logs emitted, in emission order. Empty when `status != Success`.
    pub logs: Vec<Log>,
}

impl Receipt {
    /// Builds a `Receipt`.
    pub fn new(status: ReceiptStatus, gas_used: u64, logs: Vec<Log>) -> Self {
        Receipt { status, gas_used, logs }
    }

    /// Whether this receipt represents a successful execution.
    pub fn ok(&self) -> bool {
        matches!(self.status, ReceiptStatus::Success)
    }

    /// Encodes this receipt as `{v, status, gasUsed, logs}`.
    pub fn to_value(&self) -> Value {
        Value::Map(vec![
            (Value::text("v"), Value::uint(RECEIPT_VERSION)),
            (Value::text("status"), Value::uint(self.status.as_u64())),
            (Value::text("gasUsed"), Value::uint(self.gas_used)),
            (
                Value::text("logs"),
                Value::Array(self.logs.iter().map(Log::to_value).collect()),
            ),
        ])
    }

    /// Decodes a receipt from its canonical map shape.
    pub fn from_value(v: &Value) -> Result<Self, TypesDecodeError> {
        reject_unknown_fields(v, &["v", "status", "gasUsed", "logs"])?;
        let version = v
            .map_get_text("v")
            .and_then(|x| x.as_int())
            .and_then(|i| i.to_u64())
            .ok_or(TypesDecodeError::MissingField("v"))?;
        if version != RECEIPT_VERSION {
            return Err(TypesDecodeError::UnsupportedVersion(version));
        }
        let status_tag = v
            .map_get_text("status")
            .and_then(|x| x.as_int())
            .and_then(|i| i.to_u64())
            .ok_or(TypesDecodeError::MissingField("status"))?;
        let status = ReceiptStatus::from_u64(status_tag)?;
        let gas_used = v
            .map_get_text("gasUsed")
            .and_then(|x| x.as_int())
            .and_then(|i| i.to_u64())
            .ok_or(TypesDecodeError::MissingField("gasUsed"))?;
        let logs_v = v.map_get_text("logs").ok_or(TypesDecodeError::MissingField("logs"))?;
        let logs_arr = logs_v.as_array().ok_or(TypesDecodeError::WrongType("logs"))?;
        let logs = logs_arr
            .iter()
            .map(Log::from_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Receipt { status, gas_used, logs })
    }

    /// Encodes this receipt to canonical CBOR bytes.
    pub fn to_cbor(&self) -> Result<Vec<u8>, animica_codec::EncodeError> {
        animica_codec::encode(&self.to_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use animica_codec::decode;

    #[test]
    fn receipt_round_trips() {
        let log = Log::new(Address::from_bytes([0x33u8; 32]), vec![[0x44u8; 32]], b"hello".to_vec());
        let r = Receipt::new(ReceiptStatus::Success, 42_000, vec![log]);
        let encoded = r.to_cbor().unwrap();
        let decoded = Receipt::from_value(&decode(&encoded).unwrap()).unwrap();
        assert_eq!(decoded, r);
    }

    #[test]
    fn failed_tx_has_empty_logs() {
        let r = Receipt::new(ReceiptStatus::Oog, 50_000, Vec::new());
        assert!(!r.ok());
        assert!(r.logs.is_empty());
    }

    #[test]
    fn unknown_field_rejected_on_receipt() {
        let r = Receipt::new(ReceiptStatus::Success, 42_000, Vec::new());
        let mut pairs = match r.to_value() {
            Value::Map(p) => p,
            _ => unreachable!(),
        };
        pairs.push((Value::text("bogus"), Value::uint(1)));
        let err = Receipt::from_value(&Value::Map(pairs)).unwrap_err();
        assert!(matches!(err, TypesDecodeError::UnknownField(_)));
    }

    #[test]
    fn unknown_field_rejected_on_log() {
        let log = Log::new(Address::from_bytes([0x33u8; 32]), vec![[0x44u8; 32]], b"hello".to_vec());
        let mut pairs = match log.to_value() {
            Value::Map(p) => p,
            _ => unreachable!(),
        };
        pairs.push((Value::text("bogus"), Value::uint(1)));
        let err = Log::from_value(&Value::Map(pairs)).unwrap_err();
        assert!(matches!(err, TypesDecodeError::UnknownField(_)));
    }
}
