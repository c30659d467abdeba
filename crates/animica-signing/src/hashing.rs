//! Hashing of SignBytes: the consensus TxID/HeaderHash contract.

use crate::envelope::signbytes;
use crate::error::SignBytesError;
use animica_codec::Value;

/// The digest algorithm used over a SignBytes envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Digest {
    /// sha3-256 — the consensus default.
    Sha3_256,
    /// sha3-512 — extended domain separation, not part of the consensus
    /// hash contract.
    Sha3_512,
}

/// Returns the digest of the canonical SignBytes for `domain`/`payload`/
/// `chain_id`.
pub fn hash_signbytes(
    domain: &str,
    payload: Value,
    chain_id: u64,
    digest: Digest,
) -> Result<Vec<u8>, SignBytesError> {
    let sb = signbytes(domain, payload, chain_id, None)?;
    match digest {
        Digest::Sha3_256 => animica_crypto::sha3_256(&sb)
            .map(|b| b.to_vec())
            .map_err(|e| SignBytesError::HashFailed(e.to_string())),
        Digest::Sha3_512 => animica_crypto::sha3_512(&sb)
            .map(|b| b.to_vec())
            .map_err(|e| SignBytesError::HashFailed(e.to_string())),
    }
}

/// TxHash: sha3_256 of the `animica/tx/sign/v1` SignBytes over
/// `unsigned_tx_payload`. Always 32 bytes.
pub fn tx_hash(unsigned_tx_payload: Value, chain_id: u64) -> Result<[u8; 32], SignBytesError> {
    let v = hash_signbytes(
        crate::domain::DOM_TX_SIGN_V1,
        unsigned_tx_payload,
        chain_id,
        Digest::Sha3_256,
    )?;
    let mut out = [0u8; 32];
    out.copy_from_slice(&v);
    Ok(out)
}

/// HeaderHash: sha3_256 of the `animica/header/sign/v1` SignBytes over
/// `header_payload`. Always 32 bytes.
pub fn header_hash(header_payload: Value, chain_id: u64) -> Result<[u8; 32], SignBytesError> {
    let v = hash_signbytes(
        crate::domain::DOM_HEADER_SIGN_V1,
        header_payload,
        chain_id,
        Digest::Sha3_256,
    )?;
    let mut out = [0u8; 32];
    out.copy_from_slice(&v);
    Ok(out)
}
