//! # Animica crypto
//!
//! Hash primitives (`sha3_256`, `sha3_512`, `keccak256`) and the
//! post-quantum signature oracle boundary (`PqVerifier`) that the rest of
//! the workspace builds signing and content-addressing on top of.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]

/// Errors for hashing and PQ signature operations.
pub mod error;
mod hash;
mod sign;

pub use error::CryptoError;
pub use hash::{keccak256, sha3_256, sha3_512};
pub use sign::{
    DefaultPqVerifier, Dilithium3KeyPair, PqVerifier, ALG_DILITHIUM3, ALG_SPHINCS_SHAKE_128S,
};
