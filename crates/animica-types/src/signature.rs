//! The `PqSignature` wire shape: `(alg_id, pubkey, sig)`.

use crate::error::{InvalidConstruction, TypesDecodeError};
use animica_codec::Value;

/// Maximum permitted `pubkey` length, in bytes.
pub const PUBKEY_MAX: usize = 2048;
/// Maximum permitted `sig` length, in bytes.
pub const SIG_MAX: usize = 4096;

/// A post-quantum signature: scheme id plus raw public key and signature
/// bytes, treated as an external byte contract (Dilithium3 / SPHINCS+ are
/// oracles the host verifies against, not reimplemented here).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PqSignature {
    /// Identifies the PQ scheme (1=Dilithium3, 2=SPHINCS+-SHAKE-128s, ...).
    pub alg_id: u16,
    /// The raw public key bytes, at most [`PUBKEY_MAX`] bytes.
    pub pubkey: Vec<u8>,
    /// The raw signature bytes, at most [`SIG_MAX`] bytes.
    pub sig: Vec<u8>,
}

impl PqSignature {
    /// Builds a `PqSignature`, validating size caps.
    pub fn new(alg_id: u16, pubkey: Vec<u8>, sig: Vec<u8>) -> Result<Self, InvalidConstruction> {
        if pubkey.len() > PUBKEY_MAX {
            return Err(InvalidConstruction::new("pqsignature_pubkey_too_large"));
        }
        if sig.len() > SIG_MAX {
            return Err(InvalidConstruction::new("pqsignature_sig_too_large"));
        }
        Ok(PqSignature { alg_id, pubkey, sig })
    }

    /// Encodes this signature as `{alg, pubkey, sig}`.
    pub fn to_value(&self) -> Value {
        Value::Map(vec![
            (Value::text("alg"), Value::uint(self.alg_id as u64)),
            (Value::text("pubkey"), Value::bytes(self.pubkey.clone())),
            (Value::text("sig"), Value::bytes(self.sig.clone())),
        ])
    }

    /// Decodes a signature from `{alg, pubkey, sig}`.
    pub fn from_value(v: &Value) -> Result<Self, TypesDecodeError> {
        let alg_v = v
            .map_get_text("alg")
            .ok_or(TypesDecodeError::MissingField("alg"))?;
        let alg_id = alg_v
            .as_int()
            .and_then(|i| i.to_u64())
            .ok_or(TypesDecodeError::WrongType("alg"))?;
        let alg_id: u16 = alg_id
            .try_into()
            .map_err(|_| TypesDecodeError::from(InvalidConstruction::new("pqsignature_alg_out_of_range")))?;
        let pubkey = v
            .map_get_text("pubkey")
            .and_then(|x| x.as_bytes())
            .ok_or(TypesDecodeError::MissingField("pubkey"))?
            .to_vec();
        let sig = v
            .map_get_text("sig")
            .and_then(|x| x.as_bytes())
            .ok_or(TypesDecodeError::MissingField("sig"))?
            .to_vec();
        Ok(PqSignature::new(alg_id, pubkey, sig)?)
    }
}
