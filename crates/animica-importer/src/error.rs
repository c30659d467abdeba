//! Error types for block decoding and persistence. These are distinct
//! from [`crate::importer::ImportCode`]: they represent failures the
//! importer cannot classify into `ORPHAN`/`INVALID`/etc. on its own and
//! instead propagates as `INVALID` with a reason, or as a hard backend
//! failure from the block store.

pub use animica_types::error::ErrorCode;
use animica_types::TypesDecodeError;
use thiserror::Error;

/// Failures while decoding a block, or while reading/writing the block
/// store.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The block's canonical-CBOR bytes (or pre-decoded map) failed to
    /// decode into the typed model.
    #[error("block decode failed: {0}")]
    Decode(#[from] TypesDecodeError),
    /// The header or block could not be re-encoded to compute its hash.
    #[error("not encodable: {0}")]
    NotEncodable(&'static str),
    /// The block store's backend failed (I/O, corruption).
    #[error("block store backend error: {0}")]
    Store(String),
}

impl ErrorCode for ImportError {
    fn code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "IMPORT_BAD_CBOR",
            Self::NotEncodable(_) => "IMPORT_NOT_ENCODABLE",
            Self::Store(_) => "IMPORT_STORE_ERROR",
        }
    }
}
