//! Error types for SignBytes construction and hashing.

use animica_codec::{EncodeError, ErrorCode};
use thiserror::Error;

/// Errors raised while constructing or hashing a SignBytes envelope.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignBytesError {
    /// The requested domain is not in the closed registry.
    #[error("unknown sign domain: {0}")]
    UnknownDomain(String),
    /// `chain_id` was negative.
    #[error("chain_id must be a non-negative integer")]
    NegativeChainId,
    /// The payload (or `extra`) nested more than 1000 levels deep.
    #[error("maximum nesting depth exceeded")]
    NestingTooDeep,
    /// The canonical CBOR encoder rejected the payload.
    #[error("payload is not encodable as canonical CBOR: {0}")]
    Encode(#[from] EncodeError),
    /// The requested digest name was not `sha3_256` or `sha3_512`.
    #[error("unsupported digest: {0}")]
    UnsupportedDigest(String),
    /// The underlying hash primitive failed.
    #[error("hash computation failed: {0}")]
    HashFailed(String),
}

impl ErrorCode for SignBytesError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownDomain(_) => "SIGNBYTES_UNKNOWN_DOMAIN",
            Self::NegativeChainId => "SIGNBYTES_NEGATIVE_CHAIN_ID",
            Self::NestingTooDeep => "SIGNBYTES_NESTING_TOO_DEEP",
            Self::Encode(_) => "SIGNBYTES_ENCODE_FAILED",
            Self::UnsupportedDigest(_) => "SIGNBYTES_UNSUPPORTED_DIGEST",
            Self::HashFailed(_) => "SIGNBYTES_HASH_FAILED",
        }
    }
}
