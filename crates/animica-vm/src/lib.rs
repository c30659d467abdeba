//! # Animica contract VM
//!
//! A deterministic contract execution engine: deploy bytes decode directly
//! into a closed-form [`Program`] AST (decoding untrusted bytes into this
//! type IS the forbidden-source check), entrypoints run against an
//! [`ExecutionFrame`] and a [`Host`] capability surface, and every
//! operation is charged against a [`gas::GasMeter`] built from the
//! workspace-wide gas schedule.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]

mod calldata;
pub mod contracts;
/// Error types for the contract VM.
pub mod error;
mod frame;
/// The gas schedule and meter.
pub mod gas;
mod host;
mod interpreter;
mod program;

pub use calldata::CallData;
pub use error::VmError;
pub use frame::{ExecutionFrame, TxEnv};
pub use host::{DefaultHost, Host};
pub use interpreter::{call, Val};
pub use program::{EntryPoint, Expr, Program, Stmt, MAX_BODY_LEN, MAX_EXPR_DEPTH};
