//! Error types for canonical CBOR encoding and decoding.

use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
///
/// Defined here (rather than in a higher-level crate) because `animica-codec`
/// sits at the bottom of the dependency graph; every other crate in the
/// workspace re-exports this trait instead of redefining it.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Errors raised while encoding a [`crate::Value`] into canonical CBOR bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A map key was not an integer, byte string, or text string.
    #[error("map key type not permitted: must be int, bytes, or text")]
    UnsupportedMapKey,
    /// Two map entries encoded to identical key bytes.
    #[error("duplicate map keys after canonicalization")]
    DuplicateMapKey,
    /// An integer's magnitude could not be represented.
    #[error("integer magnitude too large to encode")]
    IntegerOverflow,
}

impl ErrorCode for EncodeError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedMapKey => "CBOR_ENCODE_BAD_MAP_KEY",
            Self::DuplicateMapKey => "CBOR_ENCODE_DUPLICATE_KEY",
            Self::IntegerOverflow => "CBOR_ENCODE_INT_OVERFLOW",
        }
    }
}

/// Errors raised while decoding canonical CBOR bytes into a [`crate::Value`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The input ended before an item was fully read.
    #[error("unexpected end of input")]
    Truncated,
    /// An indefinite-length item was encountered; only definite lengths are allowed.
    #[error("indefinite-length items are not allowed")]
    IndefiniteLength,
    /// A tag outside the bignum set {2, 3} was encountered.
    #[error("disallowed CBOR tag: {0}")]
    DisallowedTag(u64),
    /// A bignum tag's payload was not itself a byte string.
    #[error("bignum tag payload must be a byte string")]
    BignumNotBytes,
    /// A bignum's magnitude byte string was empty.
    #[error("invalid (empty) bignum magnitude")]
    InvalidBignum,
    /// Map keys were not in strictly increasing canonical (encoded-byte) order.
    #[error("map keys are not in strictly increasing canonical order")]
    NonCanonicalMapOrder,
    /// The same key appeared twice in a map.
    #[error("duplicate map key")]
    DuplicateMapKey,
    /// A decoded map key was not an integer, byte string, or text string.
    #[error("unsupported map key type at decode")]
    UnsupportedMapKey,
    /// A text string's bytes were not valid UTF-8.
    #[error("invalid UTF-8 in text string")]
    InvalidUtf8,
    /// A float or a simple value other than null/true/false was encountered.
    #[error("floating point or simple values are not allowed")]
    DisallowedSimpleOrFloat,
    /// The initial byte named a major type outside 0..=7 (unreachable in practice).
    #[error("unknown major type")]
    UnknownMajorType,
    /// Bytes remained after the top-level item was fully decoded.
    #[error("trailing bytes after top-level item")]
    TrailingBytes,
}

impl ErrorCode for DecodeError {
    fn code(&self) -> &'static str {
        match self {
            Self::Truncated => "CBOR_DECODE_TRUNCATED",
            Self::IndefiniteLength => "CBOR_DECODE_INDEFINITE_LENGTH",
            Self::DisallowedTag(_) => "CBOR_DECODE_DISALLOWED_TAG",
            Self::BignumNotBytes => "CBOR_DECODE_BIGNUM_NOT_BYTES",
            Self::InvalidBignum => "CBOR_DECODE_INVALID_BIGNUM",
            Self::NonCanonicalMapOrder => "CBOR_DECODE_NONCANONICAL_MAP_ORDER",
            Self::DuplicateMapKey => "CBOR_DECODE_DUPLICATE_KEY",
            Self::UnsupportedMapKey => "CBOR_DECODE_BAD_MAP_KEY",
            Self::InvalidUtf8 => "CBOR_DECODE_BAD_UTF8",
            Self::DisallowedSimpleOrFloat => "CBOR_DECODE_DISALLOWED_SIMPLE",
            Self::UnknownMajorType => "CBOR_DECODE_UNKNOWN_MAJOR",
            Self::TrailingBytes => "CBOR_DECODE_TRAILING_BYTES",
        }
    }
}
