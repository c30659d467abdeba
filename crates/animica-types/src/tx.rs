//! Transaction model: `UnsignedTx` + `Tx`, canonical encoding, content
//! addressing, and the domain-separated SignBytes used for PQ signing.

use crate::access::AccessEntry;
use crate::address::Address;
use crate::amount::Amount;
use crate::error::{reject_unknown_fields, InvalidConstruction, TypesDecodeError};
use crate::signature::PqSignature;
use animica_codec::{encode, Value};

const TX_VERSION: u64 = 1;

/// The kind of a transaction's payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxKind {
    /// A value transfer, optionally carrying arbitrary `data`.
    Transfer = 0,
    /// A contract deployment: non-empty `code` and `manifest`.
    Deploy = 1,
    /// A contract call: `to` plus non-empty ABI-encoded `data`.
    Call = 2,
}

impl TxKind {
    fn as_u64(self) -> u64 {
        self as u64
    }

    fn from_u64(tag: u64) -> Result<Self, TypesDecodeError> {
        match tag {
            0 => Ok(TxKind::Transfer),
            1 => Ok(TxKind::Deploy),
            2 => Ok(TxKind::Call),
            other => Err(TypesDecodeError::UnknownKind(other)),
        }
    }
}

/// The `TRANSFER` payload: `{to, amount, data}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferPayload {
    /// The recipient address.
    pub to: Address,
    /// The amount transferred.
    pub amount: Amount,
    /// Optional opaque data carried with the transfer.
    pub data: Vec<u8>,
}

/// The `DEPLOY` payload: `{code, manifest}`, both required non-empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployPayload {
    /// Contract source or bytecode, interpreted by the VM's static analyzer.
    pub code: Vec<u8>,
    /// Canonical manifest bytes (ABI, capability declarations, metadata).
    pub manifest: Vec<u8>,
}

/// The `CALL` payload: `{to, data}`, `data` required non-empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallPayload {
    /// The contract being called.
    pub to: Address,
    /// ABI-encoded call data (selector + arguments).
    pub data: Vec<u8>,
}

/// The discriminated payload union carried by an [`UnsignedTx`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxPayload {
    /// See [`TransferPayload`].
    Transfer(TransferPayload),
    /// See [`DeployPayload`].
    Deploy(DeployPayload),
    /// See [`CallPayload`].
    Call(CallPayload),
}

impl TxPayload {
    fn kind(&self) -> TxKind {
        match self {
            TxPayload::Transfer(_) => TxKind::Transfer,
            TxPayload::Deploy(_) => TxKind::Deploy,
            TxPayload::Call(_) => TxKind::Call,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            TxPayload::Transfer(p) => Value::Map(vec![
                (Value::text("to"), p.to.to_value()),
                (Value::text("amount"), p.amount.to_value()),
                (Value::text("data"), Value::bytes(p.data.clone())),
            ]),
            TxPayload::Deploy(p) => Value::Map(vec![
                (Value::text("code"), Value::bytes(p.code.clone())),
                (Value::text("manifest"), Value::bytes(p.manifest.clone())),
            ]),
            TxPayload::Call(p) => Value::Map(vec![
                (Value::text("to"), p.to.to_value()),
                (Value::text("data"), Value::bytes(p.data.clone())),
            ]),
        }
    }

    fn from_value(kind: TxKind, v: &Value) -> Result<Self, TypesDecodeError> {
        match kind {
            TxKind::Transfer => {
                reject_unknown_fields(v, &["to", "amount", "data"])?;
                let to = Address::from_value(
                    v.map_get_text("to").ok_or(TypesDecodeError::MissingField("to"))?,
                )?;
                let amount = Amount::from_value(
                    v.map_get_text("amount")
                        .ok_or(TypesDecodeError::MissingField("amount"))?,
                )?;
                let data = v
                    .map_get_text("data")
                    .and_then(|x| x.as_bytes())
                    .ok_or(TypesDecodeError::MissingField("data"))?
                    .to_vec();
                Ok(TxPayload::Transfer(TransferPayload { to, amount, data }))
            }
            TxKind::Deploy => {
                reject_unknown_fields(v, &["code", "manifest"])?;
                let code = v
                    .map_get_text("code")
                    .and_then(|x| x.as_bytes())
                    .ok_or(TypesDecodeError::MissingField("code"))?
                    .to_vec();
                let manifest = v
                    .map_get_text("manifest")
                    .and_then(|x| x.as_bytes())
                    .ok_or(TypesDecodeError::MissingField("manifest"))?
                    .to_vec();
                if code.is_empty() || manifest.is_empty() {
                    return Err(InvalidConstruction::new("deploy_payload_empty").into());
                }
                Ok(TxPayload::Deploy(DeployPayload { code, manifest }))
            }
            TxKind::Call => {
                reject_unknown_fields(v, &["to", "data"])?;
                let to = Address::from_value(
                    v.map_get_text("to").ok_or(TypesDecodeError::MissingField("to"))?,
                )?;
                let data = v
                    .map_get_text("data")
                    .and_then(|x| x.as_bytes())
                    .ok_or(TypesDecodeError::MissingField("data"))?
                    .to_vec();
                if data.is_empty() {
                    return Err(InvalidConstruction::new("call_payload_empty_data").into());
                }
                Ok(TxPayload::Call(CallPayload { to, data }))
            }
        }
    }
}

/// An unsigned transaction: everything a signature covers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsignedTx {
    /// The chain this transaction targets; must be positive.
    pub chain_id: u64,
    /// The sender's account nonce.
    pub nonce: u64,
    /// Gas price, in the chain's native fee unit.
    pub gas_price: u64,
    /// Maximum gas this transaction may consume; must be positive.
    pub gas_limit: u64,
    /// The sending address.
    pub sender: Address,
    /// The payload, discriminated by [`TxKind`].
    pub payload: TxPayload,
    /// Pre-declared storage access, for gas metering.
    pub access_list: Vec<AccessEntry>,
}

impl UnsignedTx {
    /// Builds an `UnsignedTx`, enforcing the construction invariants:
    /// `chain_id > 0`, `gas_limit > 0`.
    pub fn new(
        chain_id: u64,
        nonce: u64,
        gas_price: u64,
        gas_limit: u64,
        sender: Address,
        payload: TxPayload,
        access_list: Vec<AccessEntry>,
    ) -> Result<Self, InvalidConstruction> {
        if chain_id == 0 {
            return Err(InvalidConstruction::new("chain_id_not_positive"));
        }
        if gas_limit == 0 {
            return Err(InvalidConstruction::new("gas_limit_not_positive"));
        }
        Ok(UnsignedTx {
            chain_id,
            nonce,
            gas_price,
            gas_limit,
            sender,
            payload,
            access_list,
        })
    }

    /// The canonical map shape used for CBOR encoding and for the SignBytes
    /// payload: `{v, chainId, from, nonce, gas:{price,limit},
    /// payload:{t,v}, accessList}`.
    pub fn to_value(&self) -> Value {
        Value::Map(vec![
            (Value::text("v"), Value::uint(TX_VERSION)),
            (Value::text("chainId"), Value::uint(self.chain_id)),
            (Value::text("from"), self.sender.to_value()),
            (Value::text("nonce"), Value::uint(self.nonce)),
            (
                Value::text("gas"),
                Value::Map(vec![
                    (Value::text("price"), Value::uint(self.gas_price)),
                    (Value::text("limit"), Value::uint(self.gas_limit)),
                ]),
            ),
            (
                Value::text("payload"),
                Value::Map(vec![
                    (Value::text("t"), Value::uint(self.payload.kind().as_u64())),
                    (Value::text("v"), self.payload.to_value()),
                ]),
            ),
            (
                Value::text("accessList"),
                Value::Array(self.access_list.iter().map(AccessEntry::to_value).collect()),
            ),
        ])
    }

    /// Decodes an `UnsignedTx` from its canonical map shape, rejecting
    /// unknown versions or payload kinds.
    pub fn from_value(v: &Value) -> Result<Self, TypesDecodeError> {
        reject_unknown_fields(v, &["v", "chainId", "from", "nonce", "gas", "payload", "accessList"])?;
        let version = v
            .map_get_text("v")
            .and_then(|x| x.as_int())
            .and_then(|i| i.to_u64())
            .ok_or(TypesDecodeError::MissingField("v"))?;
        if version != TX_VERSION {
            return Err(TypesDecodeError::UnsupportedVersion(version));
        }
        let chain_id = v
            .map_get_text("chainId")
            .and_then(|x| x.as_int())
            .and_then(|i| i.to_u64())
            .ok_or(TypesDecodeError::MissingField("chainId"))?;
        let sender = Address::from_value(
            v.map_get_text("from").ok_or(TypesDecodeError::MissingField("from"))?,
        )?;
        let nonce = v
            .map_get_text("nonce")
            .and_then(|x| x.as_int())
            .and_then(|i| i.to_u64())
            .ok_or(TypesDecodeError::MissingField("nonce"))?;
        let gas = v.map_get_text("gas").ok_or(TypesDecodeError::MissingField("gas"))?;
        reject_unknown_fields(gas, &["price", "limit"])?;
        let gas_price = gas
            .map_get_text("price")
            .and_then(|x| x.as_int())
            .and_then(|i| i.to_u64())
            .ok_or(TypesDecodeError::MissingField("gas.price"))?;
        let gas_limit = gas
            .map_get_text("limit")
            .and_then(|x| x.as_int())
            .and_then(|i| i.to_u64())
            .ok_or(TypesDecodeError::MissingField("gas.limit"))?;

        let payload_v = v
            .map_get_text("payload")
            .ok_or(TypesDecodeError::MissingField("payload"))?;
        reject_unknown_fields(payload_v, &["t", "v"])?;
        let tag = payload_v
            .map_get_text("t")
            .and_then(|x| x.as_int())
            .and_then(|i| i.to_u64())
            .ok_or(TypesDecodeError::MissingField("payload.t"))?;
        let kind = TxKind::from_u64(tag)?;
        let inner = payload_v
            .map_get_text("v")
            .ok_or(TypesDecodeError::MissingField("payload.v"))?;
        let payload = TxPayload::from_value(kind, inner)?;

        let access_list = match v.map_get_text("accessList") {
            Some(arr) => {
                let items = arr.as_array().ok_or(TypesDecodeError::WrongType("accessList"))?;
                items
                    .iter()
                    .map(AccessEntry::from_value)
                    .collect::<Result<Vec<_>, _>>()?
            }
            None => Vec::new(),
        };

        Ok(UnsignedTx::new(chain_id, nonce, gas_price, gas_limit, sender, payload, access_list)?)
    }

    /// Encodes this `UnsignedTx` to canonical CBOR bytes.
    pub fn to_cbor(&self) -> Result<Vec<u8>, animica_codec::EncodeError> {
        encode(&self.to_value())
    }

    /// Domain-separated SignBytes for this `UnsignedTx`, under
    /// `animica/tx/sign/v1`.
    pub fn sign_bytes(&self) -> Result<Vec<u8>, animica_signing::SignBytesError> {
        animica_signing::signbytes_tx(self.to_value(), self.chain_id)
    }

    /// `UnsignedHash`: sha3_256 of the canonical CBOR of this `UnsignedTx`.
    pub fn unsigned_hash(&self) -> Result<[u8; 32], InvalidConstruction> {
        let bytes = self
            .to_cbor()
            .map_err(|_| InvalidConstruction::new("unsigned_tx_not_encodable"))?;
        animica_crypto::sha3_256(&bytes).map_err(|_| InvalidConstruction::new("hash_failed"))
    }
}

/// A signed transaction: an [`UnsignedTx`] plus zero or more PQ signatures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tx {
    /// The unsigned payload this transaction signs over.
    pub unsigned: UnsignedTx,
    /// Signatures attached to this transaction. Block import requires at
    /// least one; the mempool's precheck path allows zero.
    pub sigs: Vec<PqSignature>,
}

impl Tx {
    /// Wraps `unsigned` with `sigs`.
    pub fn new(unsigned: UnsignedTx, sigs: Vec<PqSignature>) -> Self {
        Tx { unsigned, sigs }
    }

    /// The canonical map shape: `{v, tx, sigs}`.
    pub fn to_value(&self) -> Value {
        Value::Map(vec![
            (Value::text("v"), Value::uint(TX_VERSION)),
            (Value::text("tx"), self.unsigned.to_value()),
            (
                Value::text("sigs"),
                Value::Array(self.sigs.iter().map(PqSignature::to_value).collect()),
            ),
        ])
    }

    /// Decodes a `Tx` from its canonical map shape.
    pub fn from_value(v: &Value) -> Result<Self, TypesDecodeError> {
        reject_unknown_fields(v, &["v", "tx", "sigs"])?;
        let version = v
            .map_get_text("v")
            .and_then(|x| x.as_int())
            .and_then(|i| i.to_u64())
            .ok_or(TypesDecodeError::MissingField("v"))?;
        if version != TX_VERSION {
            return Err(TypesDecodeError::UnsupportedVersion(version));
        }
        let unsigned = UnsignedTx::from_value(
            v.map_get_text("tx").ok_or(TypesDecodeError::MissingField("tx"))?,
        )?;
        let sigs_v = v.map_get_text("sigs").ok_or(TypesDecodeError::MissingField("sigs"))?;
        let sigs_arr = sigs_v.as_array().ok_or(TypesDecodeError::WrongType("sigs"))?;
        let sigs = sigs_arr
            .iter()
            .map(PqSignature::from_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Tx { unsigned, sigs })
    }

    /// Encodes this `Tx` to canonical CBOR bytes.
    pub fn to_cbor(&self) -> Result<Vec<u8>, animica_codec::EncodeError> {
        encode(&self.to_value())
    }

    /// `TxID`: sha3_256 of the canonical CBOR of the signed `Tx` (so two
    /// differently-signed copies of the same unsigned payload have distinct
    /// ids).
    pub fn txid(&self) -> Result<[u8; 32], InvalidConstruction> {
        let bytes = self
            .to_cbor()
            .map_err(|_| InvalidConstruction::new("tx_not_encodable"))?;
        animica_crypto::sha3_256(&bytes).map_err(|_| InvalidConstruction::new("hash_failed"))
    }

    /// Requires at least `n` signatures, as block import does before
    /// admitting a transaction.
    pub fn require_min_sigs(&self, n: usize) -> Result<(), InvalidConstruction> {
        if self.sigs.len() < n {
            return Err(InvalidConstruction::new("tx_insufficient_signatures"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use animica_codec::decode;

    fn sample_unsigned() -> UnsignedTx {
        UnsignedTx::new(
            1,
            0,
            1000,
            50_000,
            Address::from_bytes([0x11u8; 32]),
            TxPayload::Transfer(TransferPayload {
                to: Address::from_bytes([0x22u8; 32]),
                amount: Amount::from_u64(123_456_789),
                data: Vec::new(),
            }),
            Vec::new(),
        )
        .unwrap()
    }

    #[test]
    fn transfer_round_trips_byte_identically() {
        let u = sample_unsigned();
        let encoded = encode(&u.to_value()).unwrap();
        let decoded = UnsignedTx::from_value(&decode(&encoded).unwrap()).unwrap();
        assert_eq!(decoded, u);
        let encoded_again = encode(&decoded.to_value()).unwrap();
        assert_eq!(encoded, encoded_again);
    }

    #[test]
    fn unsigned_hash_is_stable_across_reruns() {
        let u = sample_unsigned();
        assert_eq!(u.unsigned_hash().unwrap(), u.unsigned_hash().unwrap());
    }

    #[test]
    fn gas_limit_zero_rejected() {
        let err = UnsignedTx::new(
            1,
            0,
            0,
            0,
            Address::from_bytes([0x11u8; 32]),
            TxPayload::Transfer(TransferPayload {
                to: Address::from_bytes([0x22u8; 32]),
                amount: Amount::zero(),
                data: Vec::new(),
            }),
            Vec::new(),
        )
        .unwrap_err();
        assert_eq!(err.reason, "gas_limit_not_positive");
    }

    #[test]
    fn deploy_rejects_empty_code() {
        let payload = Value::Map(vec![
            (Value::text("code"), Value::bytes(Vec::new())),
            (Value::text("manifest"), Value::bytes(vec![1])),
        ]);
        let err = TxPayload::from_value(TxKind::Deploy, &payload).unwrap_err();
        assert_eq!(err.code(), "deploy_payload_empty");
    }

    #[test]
    fn txid_differs_from_unsigned_hash() {
        let u = sample_unsigned();
        let tx = Tx::new(u.clone(), vec![PqSignature::new(1, vec![1], vec![2]).unwrap()]);
        assert_ne!(tx.txid().unwrap(), u.unsigned_hash().unwrap());
    }

    #[test]
    fn unknown_field_rejected_on_unsigned_tx() {
        let mut pairs = match sample_unsigned().to_value() {
            Value::Map(p) => p,
            _ => unreachable!(),
        };
        pairs.push((Value::text("bogus"), Value::uint(1)));
        let err = UnsignedTx::from_value(&Value::Map(pairs)).unwrap_err();
        assert!(matches!(err, TypesDecodeError::UnknownField(_)));
    }

    #[test]
    fn unknown_field_rejected_on_tx() {
        let u = sample_unsigned();
        let tx = Tx::new(u, vec![PqSignature::new(1, vec![1], vec![2]).unwrap()]);
        let mut pairs = match tx.to_value() {
            Value::Map(p) => p,
            _ => unreachable!(),
        };
        pairs.push((Value::text("bogus"), Value::uint(1)));
        let err = Tx::from_value(&Value::Map(pairs)).unwrap_err();
        assert!(matches!(err, TypesDecodeError::UnknownField(_)));
    }

    #[test]
    fn unknown_field_rejected_on_transfer_payload() {
        let payload = Value::Map(vec![
            (Value::text("to"), Address::from_bytes([0x22u8; 32]).to_value()),
            (Value::text("amount"), Amount::from_u64(1).to_value()),
            (Value::text("data"), Value::bytes(Vec::new())),
            (Value::text("bogus"), Value::uint(1)),
        ]);
        let err = TxPayload::from_value(TxKind::Transfer, &payload).unwrap_err();
        assert!(matches!(err, TypesDecodeError::UnknownField(_)));
    }

    #[test]
    fn unknown_kind_tag_rejected_on_decode() {
        let bogus = Value::Map(vec![
            (Value::text("t"), Value::uint(9)),
            (Value::text("v"), Value::Null),
        ]);
        let tag = bogus
            .map_get_text("t")
            .and_then(|x| x.as_int())
            .and_then(|i| i.to_u64())
            .unwrap();
        assert!(TxKind::from_u64(tag).is_err());
    }
}
