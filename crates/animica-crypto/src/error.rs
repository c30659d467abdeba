//! Error types for `animica-crypto`.

use animica_codec::ErrorCode;
use thiserror::Error;

/// Errors raised by hashing or PQ signature oracle operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The underlying `dcrypt` operation failed.
    #[error("cryptographic operation failed: {0}")]
    OperationFailed(String),
    /// A key, signature, or commitment did not have the expected shape.
    #[error("invalid key or signature material: {0}")]
    InvalidMaterial(String),
    /// An `alg_id` value did not name a supported PQ signature scheme.
    #[error("unsupported PQ signature algorithm id: {0}")]
    UnsupportedAlgorithm(u16),
}

impl ErrorCode for CryptoError {
    fn code(&self) -> &'static str {
        match self {
            Self::OperationFailed(_) => "CRYPTO_OPERATION_FAILED",
            Self::InvalidMaterial(_) => "CRYPTO_INVALID_MATERIAL",
            Self::UnsupportedAlgorithm(_) => "CRYPTO_UNSUPPORTED_ALGORITHM",
        }
    }
}
