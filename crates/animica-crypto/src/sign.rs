//! Post-quantum signature oracle boundary.
//!
//! Dilithium3/SPHINCS+ are treated as external oracles satisfying a fixed
//! byte contract (`PqSignature{alg_id, pubkey, sig}`); this module supplies
//! the default, concrete oracle for `alg_id == 1` (Dilithium3 / ML-DSA-65)
//! backed by `dcrypt`, following the same key/signature wrapper shape as
//! `MldsaScheme`. `alg_id == 2` (SPHINCS+-SHAKE-128s) is left to a
//! host-supplied [`PqVerifier`] implementation — no SPHINCS+ primitive was
//! available in the retrieved `dcrypt` usage to ground a default on.

use crate::error::CryptoError;
use dcrypt::api::Signature as DcryptSignatureTrait;
use dcrypt::sign::dilithium::{
    Dilithium3, DilithiumPublicKey, DilithiumSecretKey, DilithiumSignatureData,
};
use dcrypt::algorithms::ByteSerializable;

/// `alg_id` for Dilithium3 (ML-DSA-65), the default-implemented scheme.
pub const ALG_DILITHIUM3: u16 = 1;
/// `alg_id` for SPHINCS+-SHAKE-128s. No default implementation ships here;
/// a host must supply one via [`PqVerifier`].
pub const ALG_SPHINCS_SHAKE_128S: u16 = 2;

/// A keypair for the default Dilithium3 oracle, used by tests and by
/// tooling that needs to produce signed fixtures.
pub struct Dilithium3KeyPair {
    /// The public key bytes, suitable for a `PqSignature.pubkey` field.
    pub public_key: Vec<u8>,
    secret_key: Vec<u8>,
}

impl Dilithium3KeyPair {
    /// Generates a fresh keypair using the OS RNG.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut rng = rand::rngs::OsRng;
        let (pk, sk) = Dilithium3::keypair(&mut rng)
            .map_err(|e| CryptoError::OperationFailed(e.to_string()))?;
        Ok(Self {
            public_key: pk.to_bytes().to_vec(),
            secret_key: sk.to_bytes().to_vec(),
        })
    }

    /// Signs `message`, producing bytes suitable for a `PqSignature.sig`
    /// field.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let sk = DilithiumSecretKey::from_bytes(&self.secret_key)
            .map_err(|e| CryptoError::InvalidMaterial(e.to_string()))?;
        let sig = Dilithium3::sign(message, &sk)
            .map_err(|e| CryptoError::OperationFailed(e.to_string()))?;
        Ok(sig.to_bytes().to_vec())
    }
}

/// A pluggable verifier for the PQ signature oracle contract. Hosts may
/// supply additional `alg_id`s (e.g. SPHINCS+) without this crate needing
/// to change.
pub trait PqVerifier {
    /// Verifies `sig` over `message` under `pubkey`, for the scheme named
    /// by `alg_id`. Returns `Ok(true)`/`Ok(false)` for a well-formed
    /// verification outcome, or `Err` if the scheme or material is
    /// unsupported/malformed.
    fn verify(
        &self,
        alg_id: u16,
        pubkey: &[u8],
        message: &[u8],
        sig: &[u8],
    ) -> Result<bool, CryptoError>;
}

/// The default oracle: verifies Dilithium3 (`alg_id == 1`) using `dcrypt`;
/// every other `alg_id` is reported unsupported.
#[derive(Default, Clone, Copy)]
pub struct DefaultPqVerifier;

impl PqVerifier for DefaultPqVerifier {
    fn verify(
        &self,
        alg_id: u16,
        pubkey: &[u8],
        message: &[u8],
        sig: &[u8],
    ) -> Result<bool, CryptoError> {
        match alg_id {
            ALG_DILITHIUM3 => {
                let pk = DilithiumPublicKey::from_bytes(pubkey)
                    .map_err(|e| CryptoError::InvalidMaterial(e.to_string()))?;
                let signature = DilithiumSignatureData::from_bytes(sig)
                    .map_err(|e| CryptoError::InvalidMaterial(e.to_string()))?;
                match Dilithium3::verify(message, &signature, &pk) {
                    Ok(()) => Ok(true),
                    Err(_) => Ok(false),
                }
            }
            other => Err(CryptoError::UnsupportedAlgorithm(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dilithium3_sign_and_verify_round_trip() {
        let kp = Dilithium3KeyPair::generate().unwrap();
        let msg = b"animica/tx/sign/v1 payload bytes";
        let sig = kp.sign(msg).unwrap();
        let verifier = DefaultPqVerifier;
        let ok = verifier
            .verify(ALG_DILITHIUM3, &kp.public_key, msg, &sig)
            .unwrap();
        assert!(ok);
    }

    #[test]
    fn tampered_message_fails_verification() {
        let kp = Dilithium3KeyPair::generate().unwrap();
        let sig = kp.sign(b"original").unwrap();
        let verifier = DefaultPqVerifier;
        let ok = verifier
            .verify(ALG_DILITHIUM3, &kp.public_key, b"tampered", &sig)
            .unwrap();
        assert!(!ok);
    }

    #[test]
    fn unsupported_algorithm_is_reported() {
        let verifier = DefaultPqVerifier;
        let err = verifier
            .verify(ALG_SPHINCS_SHAKE_128S, &[], b"m", &[])
            .unwrap_err();
        assert_eq!(err, CryptoError::UnsupportedAlgorithm(ALG_SPHINCS_SHAKE_128S));
    }
}
