//! # Animica canonical CBOR codec
//!
//! A deterministic, dependency-free subset of RFC 8949 CBOR: the value
//! universe is restricted to null, bool, arbitrary-precision integers
//! (bignum tags 2/3 beyond 64 bits), byte strings, UTF-8 text strings,
//! arrays, and maps keyed by int/bytes/text with deterministic ordering.
//! Floats, indefinite-length items, and all other tags are rejected on
//! both encode and decode.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]

mod decode;
mod encode;
/// Error types and the workspace-wide `ErrorCode` trait.
pub mod error;
mod int;
mod value;

pub use decode::decode;
pub use encode::encode;
pub use error::{DecodeError, EncodeError, ErrorCode};
pub use int::Int;
pub use value::Value;
