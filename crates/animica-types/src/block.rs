//! The block envelope: header, transactions, and optional proof/receipt
//! attachments.

use crate::error::{reject_unknown_fields, TypesDecodeError};
use crate::header::Header;
use crate::receipt::Receipt;
use crate::tx::Tx;
use animica_codec::Value;

/// A full block: a header plus the transactions it commits to, and the
/// receipts/proofs produced (or carried) alongside it.
///
/// `proofs` and `receipts` are optional on the wire: a block fetched for
/// header-only sync carries neither, while a block produced by execution
/// carries both.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    /// The block header.
    pub header: Header,
    /// Transactions included in this block, in inclusion order.
    pub txs: Vec<Tx>,
    /// Opaque proof bytes attached to this block, if any.
    pub proofs: Option<Vec<u8>>,
    /// Receipts for `txs`, in the same order, if computed.
    pub receipts: Option<Vec<Receipt>>,
}

impl Block {
    /// Builds a `Block`.
    pub fn new(header: Header, txs: Vec<Tx>, proofs: Option<Vec<u8>>, receipts: Option<Vec<Receipt>>) -> Self {
        Block { header, txs, proofs, receipts }
    }

    /// Encodes this block as `{header, txs, proofs, receipts}`, omitting
    /// `proofs`/`receipts` when absent.
    pub fn to_value(&self) -> Value {
        let mut pairs = vec![
            (Value::text("header"), self.header.to_value()),
            (
                Value::text("txs"),
                Value::Array(self.txs.iter().map(Tx::to_value).collect()),
            ),
        ];
        if let Some(proofs) = &self.proofs {
            pairs.push((Value::text("proofs"), Value::bytes(proofs.clone())));
        }
        if let Some(receipts) = &self.receipts {
            pairs.push((
                Value::text("receipts"),
                Value::Array(receipts.iter().map(Receipt::to_value).collect()),
            ));
        }
        Value::Map(pairs)
    }

    /// Decodes a block from its canonical map shape. `proofs`/`receipts`
    /// are accepted as absent.
    pub fn from_value(v: &Value) -> Result<Self, TypesDecodeError> {
        reject_unknown_fields(v, &["header", "txs", "proofs", "receipts"])?;
        let header = Header::from_value(
            v.map_get_text("header")
                .ok_or(TypesDecodeError::MissingField("header"))?,
        )?;
        let txs_v = v.map_get_text("txs").ok_or(TypesDecodeError::MissingField("txs"))?;
        let txs_arr = txs_v.as_array().ok_or(TypesDecodeError::WrongType("txs"))?;
        let txs = txs_arr
            .iter()
            .map(Tx::from_value)
            .collect::<Result<Vec<_>, _>>()?;

        let proofs = match v.map_get_text("proofs") {
            Some(p) => Some(p.as_bytes().ok_or(TypesDecodeError::WrongType("proofs"))?.to_vec()),
            None => None,
        };
        let receipts = match v.map_get_text("receipts") {
            Some(r) => {
                let arr = r.as_array().ok_or(TypesDecodeError::WrongType("receipts"))?;
                Some(arr.iter().map(Receipt::from_value).collect::<Result<Vec<_>, _>>()?)
            }
            None => None,
        };

        Ok(Block { header, txs, proofs, receipts })
    }

    /// Encodes this block to canonical CBOR bytes.
    pub fn to_cbor(&self) -> Result<Vec<u8>, animica_codec::EncodeError> {
        animica_codec::encode(&self.to_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::amount::Amount;
    use crate::receipt::ReceiptStatus;
    use crate::signature::PqSignature;
    use crate::tx::{TransferPayload, TxPayload, UnsignedTx};
    use animica_codec::decode;

    fn sample_header() -> Header {
        Header::new(1337, 1, [0u8; 32], 1_000, [1u8; 32], [2u8; 32], [3u8; 32], [4u8; 32], [5u8; 32], 0, Vec::new(), Vec::new()).unwrap()
    }

    fn sample_tx() -> Tx {
        let unsigned = UnsignedTx::new(
            1337,
            0,
            1,
            21_000,
            Address::from_bytes([0x11u8; 32]),
            TxPayload::Transfer(TransferPayload {
                to: Address::from_bytes([0x22u8; 32]),
                amount: Amount::from_u64(10),
                data: Vec::new(),
            }),
            Vec::new(),
        )
        .unwrap();
        Tx::new(unsigned, vec![PqSignature::new(1, vec![1], vec![2]).unwrap()])
    }

    #[test]
    fn block_without_proofs_or_receipts_round_trips() {
        let b = Block::new(sample_header(), vec![sample_tx()], None, None);
        let encoded = b.to_cbor().unwrap();
        let decoded = Block::from_value(&decode(&encoded).unwrap()).unwrap();
        assert_eq!(decoded, b);
        assert!(decoded.proofs.is_none());
        assert!(decoded.receipts.is_none());
    }

    #[test]
    fn block_with_receipts_round_trips() {
        let receipt = Receipt::new(ReceiptStatus::Success, 21_000, Vec::new());
        let b = Block::new(sample_header(), vec![sample_tx()], Some(vec![9, 9]), Some(vec![receipt]));
        let encoded = b.to_cbor().unwrap();
        let decoded = Block::from_value(&decode(&encoded).unwrap()).unwrap();
        assert_eq!(decoded, b);
    }

    #[test]
    fn missing_header_rejected() {
        let v = Value::Map(vec![(Value::text("txs"), Value::Array(Vec::new()))]);
        assert!(matches!(Block::from_value(&v), Err(TypesDecodeError::MissingField("header"))));
    }

    #[test]
    fn unknown_field_rejected() {
        let b = Block::new(sample_header(), vec![sample_tx()], None, None);
        let mut pairs = match b.to_value() {
            Value::Map(p) => p,
            _ => unreachable!(),
        };
        pairs.push((Value::text("bogus"), Value::uint(1)));
        let err = Block::from_value(&Value::Map(pairs)).unwrap_err();
        assert!(matches!(err, TypesDecodeError::UnknownField(_)));
    }
}
