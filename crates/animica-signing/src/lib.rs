//! # Animica SignBytes & hashing
//!
//! Domain-separated canonical bytes for signing and hashing transactions
//! and headers, built on `animica-codec`'s deterministic CBOR and
//! `animica-crypto`'s hash primitives.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]

mod domain;
mod envelope;
/// Error types for SignBytes construction.
pub mod error;
mod hashing;

pub use domain::{
    is_known_domain, DOM_HEADER_HASH_V1, DOM_HEADER_SIGN_V1, DOM_TX_HASH_V1, DOM_TX_SIGN_V1,
};
pub use envelope::{signbytes, signbytes_checked, signbytes_header, signbytes_tx};
pub use error::SignBytesError;
pub use hashing::{hash_signbytes, header_hash, tx_hash, Digest};
