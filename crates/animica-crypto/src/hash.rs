//! Consensus and contract-facing hash functions.
//!
//! Wraps `dcrypt`'s digest implementations the same way `Sha256Hash`/
//! `Sha512Hash` wrap `dcrypt::algorithms::hash::sha2`, but for the three
//! digests the Animica wire format actually uses.

use crate::error::CryptoError;
use dcrypt::algorithms::hash::keccak::Keccak256;
use dcrypt::algorithms::hash::sha3::{Sha3_256, Sha3_512};
use dcrypt::algorithms::hash::HashFunction as DcryptHashFunction;
use dcrypt::algorithms::ByteSerializable;

/// The primary consensus hash: sha3-256, used for TxID, HeaderHash, and
/// canonical receipt/event digests. Always 32 bytes.
pub fn sha3_256(message: &[u8]) -> Result<[u8; 32], CryptoError> {
    let digest = Sha3_256::digest(message).map_err(|e| CryptoError::OperationFailed(e.to_string()))?;
    let bytes = digest.to_bytes();
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::OperationFailed("sha3_256 digest had unexpected length".into()))
}

/// The extended-domain-separation hash: sha3-512. Not part of the
/// consensus hash contract; available to callers that need a longer
/// digest. Always 64 bytes.
pub fn sha3_512(message: &[u8]) -> Result<[u8; 64], CryptoError> {
    let digest = Sha3_512::digest(message).map_err(|e| CryptoError::OperationFailed(e.to_string()))?;
    let bytes = digest.to_bytes();
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::OperationFailed("sha3_512 digest had unexpected length".into()))
}

/// The contract-facing digest exposed through the `hash` capability.
/// Always 32 bytes.
pub fn keccak256(message: &[u8]) -> Result<[u8; 32], CryptoError> {
    let digest = Keccak256::digest(message).map_err(|e| CryptoError::OperationFailed(e.to_string()))?;
    let bytes = digest.to_bytes();
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::OperationFailed("keccak256 digest had unexpected length".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha3_256_is_deterministic() {
        let a = sha3_256(b"animica").unwrap();
        let b = sha3_256(b"animica").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_inputs_diverge() {
        let a = sha3_256(b"animica").unwrap();
        let b = sha3_256(b"Animica").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn keccak256_is_32_bytes() {
        let h = keccak256(b"contract").unwrap();
        assert_eq!(h.len(), 32);
    }
}
