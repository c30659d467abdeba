//! The contract VM's error taxonomy.

pub use animica_types::error::ErrorCode;
use thiserror::Error;

/// All ways a deployment or a transaction's execution frame can fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VmError {
    /// A deployed program referenced an opcode, jump target, or resource
    /// outside the closed capability surface, or was otherwise malformed.
    #[error("program validation failed: {0}")]
    ValidationError(&'static str),
    /// The contract called `abi.revert` or a `require` guard failed.
    #[error("execution reverted: {0}")]
    Revert(String),
    /// The gas meter was exhausted before the frame completed.
    #[error("out of gas")]
    OutOfGas,
    /// A storage slot contained bytes that could not be interpreted under
    /// the encoding the caller requested.
    #[error("invalid storage encoding: {0}")]
    InvalidStorage(&'static str),
    /// The host did not provide a capability the frame required.
    #[error("capability unavailable: {0}")]
    CapabilityUnavailable(&'static str),
    /// `read_result` was called before its task's availability block.
    #[error("no result yet for task")]
    NoResultYet,
}

impl ErrorCode for VmError {
    fn code(&self) -> &'static str {
        match self {
            Self::ValidationError(_) => "VM_VALIDATION_ERROR",
            Self::Revert(_) => "VM_REVERT",
            Self::OutOfGas => "VM_OUT_OF_GAS",
            Self::InvalidStorage(_) => "VM_INVALID_STORAGE",
            Self::CapabilityUnavailable(_) => "VM_CAPABILITY_UNAVAILABLE",
            Self::NoResultYet => "VM_NO_RESULT_YET",
        }
    }
}
