//! # Animica data model
//!
//! The canonical-CBOR-backed data types shared across the runtime:
//! addresses, amounts, access lists, PQ signatures, transactions, receipts,
//! headers, and blocks. Every type here round-trips byte-identically
//! through its `to_value`/`from_value` pair and, where applicable, exposes
//! the content hashes (`UnsignedHash`, `TxID`, `HeaderHash`) used elsewhere
//! in the runtime.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]

mod access;
mod address;
mod amount;
mod block;
/// Error types for the data model.
pub mod error;
mod header;
mod receipt;
mod signature;
mod tx;

pub use access::AccessEntry;
pub use address::{Address, ADDRESS_LEN};
pub use amount::Amount;
pub use block::Block;
pub use error::{InvalidConstruction, TypesDecodeError};
pub use header::{Header, SEED_MAX_LEN, THETA_MAX};
pub use receipt::{Log, Receipt, ReceiptStatus, TOPIC_LEN};
pub use signature::{PqSignature, PUBKEY_MAX, SIG_MAX};
pub use tx::{CallPayload, DeployPayload, Tx, TransferPayload, TxKind, TxPayload, UnsignedTx};
