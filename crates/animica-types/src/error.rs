//! Error types for the transaction, receipt, header, and block data model.

pub use animica_codec::ErrorCode;
use animica_codec::DecodeError as CborDecodeError;
use animica_codec::Value;
use thiserror::Error;

/// Raised when a typed value is constructed with a field outside its
/// allowed shape (wrong length, out-of-range number, empty required bytes).
/// Carries a single stable reason code rather than a variant per field, so
/// callers match on `reason` instead of growing a new enum arm per check.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid construction: {reason}")]
pub struct InvalidConstruction {
    /// Stable ASCII reason code, e.g. `"address_length"`, `"gas_limit_zero"`.
    pub reason: &'static str,
}

impl InvalidConstruction {
    /// Builds an error carrying `reason`.
    pub fn new(reason: &'static str) -> Self {
        InvalidConstruction { reason }
    }
}

impl ErrorCode for InvalidConstruction {
    fn code(&self) -> &'static str {
        self.reason
    }
}

/// Errors raised while decoding a typed value (`Tx`, `Header`, `Block`, ...)
/// from a canonical-CBOR [`animica_codec::Value`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypesDecodeError {
    /// The underlying canonical CBOR bytes failed to decode.
    #[error("CBOR decode failed: {0}")]
    Cbor(#[from] CborDecodeError),
    /// A required map field was missing.
    #[error("missing field: {0}")]
    MissingField(&'static str),
    /// A field had the wrong `Value` shape (e.g. expected bytes, found int).
    #[error("wrong field type: {0}")]
    WrongType(&'static str),
    /// The top-level `v` version tag was not the one supported version.
    #[error("unsupported version: {0}")]
    UnsupportedVersion(u64),
    /// A `payload.t` discriminant did not name a known `TxKind`.
    #[error("unknown tx kind tag: {0}")]
    UnknownKind(u64),
    /// A decoded field violated a construction invariant (length, range).
    #[error("invalid field: {0}")]
    InvalidConstruction(#[from] InvalidConstruction),
    /// A map contained a field name outside the canonical set or its alias
    /// table.
    #[error("unknown field: {0}")]
    UnknownField(String),
}

impl ErrorCode for TypesDecodeError {
    fn code(&self) -> &'static str {
        match self {
            Self::Cbor(_) => "TYPES_DECODE_BAD_CBOR",
            Self::MissingField(_) => "TYPES_DECODE_MISSING_FIELD",
            Self::WrongType(_) => "TYPES_DECODE_WRONG_TYPE",
            Self::UnsupportedVersion(_) => "TYPES_DECODE_BAD_VERSION",
            Self::UnknownKind(_) => "TYPES_DECODE_UNKNOWN_KIND",
            Self::InvalidConstruction(e) => e.code(),
            Self::UnknownField(_) => "TYPES_DECODE_UNKNOWN_FIELD",
        }
    }
}

/// Rejects any map key in `v` outside `known`, the same check
/// [`crate::header::Header::from_value`] performs inline against its alias
/// table. Shared here so `tx`, `block`, and `receipt` decoding can mirror it
/// without re-deriving the loop at each call site.
pub(crate) fn reject_unknown_fields(v: &Value, known: &[&str]) -> Result<(), TypesDecodeError> {
    let pairs = match v {
        Value::Map(pairs) => pairs,
        _ => return Ok(()),
    };
    for (k, _) in pairs {
        let key = k.as_text().ok_or(TypesDecodeError::WrongType("map_key"))?;
        if !known.contains(&key) {
            return Err(TypesDecodeError::UnknownField(key.to_string()));
        }
    }
    Ok(())
}
