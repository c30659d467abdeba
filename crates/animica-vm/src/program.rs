//! The typed contract program: a closed-form expression/statement AST and
//! the forbidden-source analyzer that decodes it from untrusted deploy
//! bytes.
//!
//! A deployed contract's `code` is the canonical CBOR encoding of a
//! [`Program`]. Because every node type is a fixed, closed set of variants
//! tied one-to-one with the capability surface (storage, events, hash,
//! abi, treasury, syscalls — see the crate's capability module), decoding
//! untrusted bytes into this type IS the forbidden-source check: any byte
//! sequence that doesn't decode into one of these variants is rejected
//! before a single instruction runs.

use crate::error::VmError;
use animica_codec::Value;

/// Maximum nesting depth of an [`Expr`] tree, enforced during decode.
pub const MAX_EXPR_DEPTH: usize = 32;
/// Maximum number of statements in one entrypoint body.
pub const MAX_BODY_LEN: usize = 4_096;
/// Maximum number of entrypoints in one program.
pub const MAX_ENTRYPOINTS: usize = 256;
/// Maximum byte length of an entrypoint selector.
pub const MAX_SELECTOR_LEN: usize = 64;

/// An expression: a pure, side-effect-free computation over arguments,
/// locals, storage reads, and TxEnv lookups.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    /// A literal byte string.
    LitBytes(Vec<u8>),
    /// A literal unsigned integer.
    LitInt(u64),
    /// A literal boolean.
    LitBool(bool),
    /// The `n`th call argument.
    Arg(u8),
    /// The local variable at slot `n`.
    Local(u8),
    /// Reads the current contract's storage at the byte key `Expr`
    /// evaluates to. Unset keys evaluate to empty bytes.
    StorageGet(Box<Expr>),
    /// Checked addition of two integer-valued expressions.
    Add(Box<Expr>, Box<Expr>),
    /// The address that initiated this call.
    CallerAddress,
    /// The address of the contract currently executing.
    ContractAddress,
    /// The current block height.
    BlockHeight,
    /// The chain this transaction targets.
    ChainId,
    /// A digest of a byte-valued expression: 0=sha3_256, 1=sha3_512,
    /// 2=keccak256.
    Hash(u8, Box<Expr>),
    /// The treasury balance of the address a byte-valued expression
    /// evaluates to.
    TreasuryBalance(Box<Expr>),
}

/// A statement: one effectful step of an entrypoint body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stmt {
    /// Binds the value of an expression to a local slot.
    SetLocal(u8, Expr),
    /// Writes a value into the current contract's storage.
    StorageSet(Expr, Expr),
    /// Deletes a key from the current contract's storage.
    StorageDelete(Expr),
    /// Appends an event to the frame's event buffer: a name plus ordered
    /// `(key, value)` fields.
    Emit(Vec<u8>, Vec<(Vec<u8>, Expr)>),
    /// Aborts the frame with `Revert(reason)` unless `cond` evaluates
    /// truthy (a nonzero int, `true`, or non-empty bytes).
    Require(Expr, Vec<u8>),
    /// Enqueues an AI compute job and binds its deterministic `task_id` to
    /// a local slot.
    AiEnqueue {
        /// Model identifier.
        model: Expr,
        /// Request payload.
        prompt: Expr,
        /// Local slot receiving the returned `task_id` bytes.
        dest_local: u8,
    },
    /// Reads a previously enqueued task's result, binding `(status,
    /// output)` to two local slots. Fails with [`VmError::NoResultYet`]
    /// before the task's availability block.
    ReadResult {
        /// The task id to read.
        task_id: Expr,
        /// Local slot receiving the status bytes.
        status_local: u8,
        /// Local slot receiving the output bytes.
        output_local: u8,
    },
    /// Ends the entrypoint, yielding an expression as the call's return
    /// value.
    Return(Expr),
    /// Unconditionally aborts the frame with `Revert(reason)`.
    Revert(Vec<u8>),
    /// Debits the current contract's treasury account and credits `to`.
    TreasuryTransfer {
        /// Recipient address bytes.
        to: Expr,
        /// Amount to transfer, as a non-negative integer expression.
        amount: Expr,
    },
    /// Pins a data-availability blob under a namespace, binding the
    /// returned commitment bytes to a local slot.
    BlobPin {
        /// Namespace id.
        ns: Expr,
        /// Raw blob bytes.
        data: Expr,
        /// Local slot receiving the commitment bytes.
        dest_local: u8,
    },
    /// Verifies a zk proof, binding the boolean result to a local slot.
    ZkVerify {
        /// Serialized circuit/program bytes.
        circuit: Expr,
        /// Proof bytes.
        proof: Expr,
        /// Public input bytes.
        public: Expr,
        /// Local slot receiving the result as `LitBool`.
        dest_local: u8,
    },
    /// Draws `n` deterministic bytes, binding them to a local slot.
    RandomBytes {
        /// Number of bytes requested.
        n: Expr,
        /// Local slot receiving the bytes.
        dest_local: u8,
    },
    /// Enqueues a quantum compute job and binds its deterministic
    /// `task_id` to a local slot.
    QuantumEnqueue {
        /// Serialized circuit description.
        circuit: Expr,
        /// Requested shot count.
        shots: Expr,
        /// Local slot receiving the returned `task_id` bytes.
        dest_local: u8,
    },
}

/// One callable entrypoint: a selector, its declared argument count, and
/// its body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryPoint {
    /// The selector bytes a [`crate::calldata::CallData`] dispatches on.
    pub selector: Vec<u8>,
    /// Number of arguments this entrypoint expects.
    pub params: u8,
    /// The statements executed in order when this entrypoint is called.
    pub body: Vec<Stmt>,
}

/// A deployed contract: its entrypoints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Program {
    /// Entrypoints, keyed on decode by their selector.
    pub entrypoints: Vec<EntryPoint>,
}

impl Expr {
    fn to_value(&self) -> Value {
        match self {
            Expr::LitBytes(b) => tagged(0, Value::bytes(b.clone())),
            Expr::LitInt(n) => tagged(1, Value::uint(*n)),
            Expr::LitBool(b) => tagged(2, Value::Bool(*b)),
            Expr::Arg(n) => tagged(3, Value::uint(*n as u64)),
            Expr::Local(n) => tagged(4, Value::uint(*n as u64)),
            Expr::StorageGet(inner) => tagged(5, inner.to_value()),
            Expr::Add(a, b) => tagged(6, Value::Array(vec![a.to_value(), b.to_value()])),
            Expr::CallerAddress => tagged(7, Value::Null),
            Expr::ContractAddress => tagged(8, Value::Null),
            Expr::BlockHeight => tagged(9, Value::Null),
            Expr::ChainId => tagged(10, Value::Null),
            Expr::Hash(alg, inner) => tagged(11, Value::Array(vec![Value::uint(*alg as u64), inner.to_value()])),
            Expr::TreasuryBalance(addr) => tagged(12, addr.to_value()),
        }
    }

    fn from_value(v: &Value, depth: usize) -> Result<Self, VmError> {
        if depth > MAX_EXPR_DEPTH {
            return Err(VmError::ValidationError("expr_too_deep"));
        }
        let (tag, inner) = untag(v)?;
        match tag {
            0 => Ok(Expr::LitBytes(
                inner.as_bytes().ok_or(VmError::ValidationError("expr_bad_shape"))?.to_vec(),
            )),
            1 => Ok(Expr::LitInt(
                inner
                    .as_int()
                    .and_then(|i| i.to_u64())
                    .ok_or(VmError::ValidationError("expr_bad_shape"))?,
            )),
            2 => match inner {
                Value::Bool(b) => Ok(Expr::LitBool(*b)),
                _ => Err(VmError::ValidationError("expr_bad_shape")),
            },
            3 => Ok(Expr::Arg(small_u8(inner)?)),
            4 => Ok(Expr::Local(small_u8(inner)?)),
            5 => Ok(Expr::StorageGet(Box::new(Expr::from_value(inner, depth + 1)?))),
            6 => {
                let items = inner.as_array().ok_or(VmError::ValidationError("expr_bad_shape"))?;
                if items.len() != 2 {
                    return Err(VmError::ValidationError("expr_bad_shape"));
                }
                let a = Expr::from_value(&items[0], depth + 1)?;
                let b = Expr::from_value(&items[1], depth + 1)?;
                Ok(Expr::Add(Box::new(a), Box::new(b)))
            }
            7 => Ok(Expr::CallerAddress),
            8 => Ok(Expr::ContractAddress),
            9 => Ok(Expr::BlockHeight),
            10 => Ok(Expr::ChainId),
            11 => {
                let items = inner.as_array().ok_or(VmError::ValidationError("expr_bad_shape"))?;
                if items.len() != 2 {
                    return Err(VmError::ValidationError("expr_bad_shape"));
                }
                let alg = small_u8(&items[0])?;
                if alg > 2 {
                    return Err(VmError::ValidationError("expr_unknown_hash_alg"));
                }
                Ok(Expr::Hash(alg, Box::new(Expr::from_value(&items[1], depth + 1)?)))
            }
            12 => Ok(Expr::TreasuryBalance(Box::new(Expr::from_value(inner, depth + 1)?))),
            _ => Err(VmError::ValidationError("expr_unknown_tag")),
        }
    }
}

impl Stmt {
    fn to_value(&self) -> Value {
        match self {
            Stmt::SetLocal(slot, e) => {
                tagged(0, Value::Array(vec![Value::uint(*slot as u64), e.to_value()]))
            }
            Stmt::StorageSet(k, v) => tagged(1, Value::Array(vec![k.to_value(), v.to_value()])),
            Stmt::StorageDelete(k) => tagged(2, k.to_value()),
            Stmt::Emit(name, fields) => {
                let fields_v = fields
                    .iter()
                    .map(|(k, e)| Value::Array(vec![Value::bytes(k.clone()), e.to_value()]))
                    .collect();
                tagged(3, Value::Array(vec![Value::bytes(name.clone()), Value::Array(fields_v)]))
            }
            Stmt::Require(cond, reason) => {
                tagged(4, Value::Array(vec![cond.to_value(), Value::bytes(reason.clone())]))
            }
            Stmt::AiEnqueue { model, prompt, dest_local } => tagged(
                5,
                Value::Array(vec![model.to_value(), prompt.to_value(), Value::uint(*dest_local as u64)]),
            ),
            Stmt::ReadResult { task_id, status_local, output_local } => tagged(
                6,
                Value::Array(vec![
                    task_id.to_value(),
                    Value::uint(*status_local as u64),
                    Value::uint(*output_local as u64),
                ]),
            ),
            Stmt::Return(e) => tagged(7, e.to_value()),
            Stmt::Revert(reason) => tagged(8, Value::bytes(reason.clone())),
            Stmt::TreasuryTransfer { to, amount } => {
                tagged(9, Value::Array(vec![to.to_value(), amount.to_value()]))
            }
            Stmt::BlobPin { ns, data, dest_local } => tagged(
                10,
                Value::Array(vec![ns.to_value(), data.to_value(), Value::uint(*dest_local as u64)]),
            ),
            Stmt::ZkVerify { circuit, proof, public, dest_local } => tagged(
                11,
                Value::Array(vec![
                    circuit.to_value(),
                    proof.to_value(),
                    public.to_value(),
                    Value::uint(*dest_local as u64),
                ]),
            ),
            Stmt::RandomBytes { n, dest_local } => {
                tagged(12, Value::Array(vec![n.to_value(), Value::uint(*dest_local as u64)]))
            }
            Stmt::QuantumEnqueue { circuit, shots, dest_local } => tagged(
                13,
                Value::Array(vec![circuit.to_value(), shots.to_value(), Value::uint(*dest_local as u64)]),
            ),
        }
    }

    fn from_value(v: &Value) -> Result<Self, VmError> {
        let (tag, inner) = untag(v)?;
        let arr = |n: usize| -> Result<&[Value], VmError> {
            let items = inner.as_array().ok_or(VmError::ValidationError("stmt_bad_shape"))?;
            if items.len() != n {
                return Err(VmError::ValidationError("stmt_bad_shape"));
            }
            Ok(items)
        };
        match tag {
            0 => {
                let items = arr(2)?;
                let slot = small_u8(&items[0])?;
                let e = Expr::from_value(&items[1], 0)?;
                Ok(Stmt::SetLocal(slot, e))
            }
            1 => {
                let items = arr(2)?;
                Ok(Stmt::StorageSet(Expr::from_value(&items[0], 0)?, Expr::from_value(&items[1], 0)?))
            }
            2 => Ok(Stmt::StorageDelete(Expr::from_value(inner, 0)?)),
            3 => {
                let items = arr(2)?;
                let name = items[0].as_bytes().ok_or(VmError::ValidationError("stmt_bad_shape"))?.to_vec();
                let fields_arr = items[1].as_array().ok_or(VmError::ValidationError("stmt_bad_shape"))?;
                let mut fields = Vec::with_capacity(fields_arr.len());
                for f in fields_arr {
                    let pair = f.as_array().ok_or(VmError::ValidationError("stmt_bad_shape"))?;
                    if pair.len() != 2 {
                        return Err(VmError::ValidationError("stmt_bad_shape"));
                    }
                    let k = pair[0].as_bytes().ok_or(VmError::ValidationError("stmt_bad_shape"))?.to_vec();
                    let e = Expr::from_value(&pair[1], 0)?;
                    fields.push((k, e));
                }
                Ok(Stmt::Emit(name, fields))
            }
            4 => {
                let items = arr(2)?;
                let cond = Expr::from_value(&items[0], 0)?;
                let reason = items[1].as_bytes().ok_or(VmError::ValidationError("stmt_bad_shape"))?.to_vec();
                Ok(Stmt::Require(cond, reason))
            }
            5 => {
                let items = arr(3)?;
                Ok(Stmt::AiEnqueue {
                    model: Expr::from_value(&items[0], 0)?,
                    prompt: Expr::from_value(&items[1], 0)?,
                    dest_local: small_u8(&items[2])?,
                })
            }
            6 => {
                let items = arr(3)?;
                Ok(Stmt::ReadResult {
                    task_id: Expr::from_value(&items[0], 0)?,
                    status_local: small_u8(&items[1])?,
                    output_local: small_u8(&items[2])?,
                })
            }
            7 => Ok(Stmt::Return(Expr::from_value(inner, 0)?)),
            8 => Ok(Stmt::Revert(
                inner.as_bytes().ok_or(VmError::ValidationError("stmt_bad_shape"))?.to_vec(),
            )),
            9 => {
                let items = arr(2)?;
                Ok(Stmt::TreasuryTransfer {
                    to: Expr::from_value(&items[0], 0)?,
                    amount: Expr::from_value(&items[1], 0)?,
                })
            }
            10 => {
                let items = arr(3)?;
                Ok(Stmt::BlobPin {
                    ns: Expr::from_value(&items[0], 0)?,
                    data: Expr::from_value(&items[1], 0)?,
                    dest_local: small_u8(&items[2])?,
                })
            }
            11 => {
                let items = arr(4)?;
                Ok(Stmt::ZkVerify {
                    circuit: Expr::from_value(&items[0], 0)?,
                    proof: Expr::from_value(&items[1], 0)?,
                    public: Expr::from_value(&items[2], 0)?,
                    dest_local: small_u8(&items[3])?,
                })
            }
            12 => {
                let items = arr(2)?;
                Ok(Stmt::RandomBytes { n: Expr::from_value(&items[0], 0)?, dest_local: small_u8(&items[1])? })
            }
            13 => {
                let items = arr(3)?;
                Ok(Stmt::QuantumEnqueue {
                    circuit: Expr::from_value(&items[0], 0)?,
                    shots: Expr::from_value(&items[1], 0)?,
                    dest_local: small_u8(&items[2])?,
                })
            }
            _ => Err(VmError::ValidationError("stmt_unknown_tag")),
        }
    }
}

impl EntryPoint {
    fn to_value(&self) -> Value {
        Value::Map(vec![
            (Value::text("selector"), Value::bytes(self.selector.clone())),
            (Value::text("params"), Value::uint(self.params as u64)),
            (
                Value::text("body"),
                Value::Array(self.body.iter().map(Stmt::to_value).collect()),
            ),
        ])
    }

    fn from_value(v: &Value) -> Result<Self, VmError> {
        let selector = v
            .map_get_text("selector")
            .and_then(|x| x.as_bytes())
            .ok_or(VmError::ValidationError("entrypoint_missing_selector"))?
            .to_vec();
        if selector.is_empty() || selector.len() > MAX_SELECTOR_LEN {
            return Err(VmError::ValidationError("entrypoint_selector_length"));
        }
        let params = v
            .map_get_text("params")
            .and_then(|x| x.as_int())
            .and_then(|i| i.to_u64())
            .ok_or(VmError::ValidationError("entrypoint_missing_params"))?;
        let params: u8 = params.try_into().map_err(|_| VmError::ValidationError("entrypoint_params_range"))?;
        let body_v = v
            .map_get_text("body")
            .and_then(|x| x.as_array())
            .ok_or(VmError::ValidationError("entrypoint_missing_body"))?;
        if body_v.len() > MAX_BODY_LEN {
            return Err(VmError::ValidationError("entrypoint_body_too_long"));
        }
        let body = body_v.iter().map(Stmt::from_value).collect::<Result<Vec<_>, _>>()?;
        Ok(EntryPoint { selector, params, body })
    }
}

impl Program {
    /// Encodes this program to its canonical `Value` shape (what a
    /// `DeployPayload.code` carries, CBOR-encoded).
    pub fn to_value(&self) -> Value {
        Value::Map(vec![(
            Value::text("entrypoints"),
            Value::Array(self.entrypoints.iter().map(EntryPoint::to_value).collect()),
        )])
    }

    /// Encodes this program to canonical CBOR bytes, suitable for a
    /// `DeployPayload.code` field.
    pub fn to_cbor(&self) -> Result<Vec<u8>, animica_codec::EncodeError> {
        animica_codec::encode(&self.to_value())
    }

    /// Decodes and validates untrusted deploy bytes into a `Program`. This
    /// is the forbidden-source analyzer: any byte sequence that does not
    /// decode into a well-formed tree of the closed [`Expr`]/[`Stmt`]
    /// variants above is rejected here, before a single instruction runs.
    pub fn analyze(code: &[u8]) -> Result<Self, VmError> {
        let v = animica_codec::decode(code).map_err(|_| VmError::ValidationError("program_bad_cbor"))?;
        let entrypoints_v = v
            .map_get_text("entrypoints")
            .and_then(|x| x.as_array())
            .ok_or(VmError::ValidationError("program_missing_entrypoints"))?;
        if entrypoints_v.is_empty() || entrypoints_v.len() > MAX_ENTRYPOINTS {
            return Err(VmError::ValidationError("program_entrypoint_count"));
        }
        let entrypoints = entrypoints_v
            .iter()
            .map(EntryPoint::from_value)
            .collect::<Result<Vec<_>, _>>()?;
        let mut seen = std::collections::HashSet::new();
        for ep in &entrypoints {
            if !seen.insert(ep.selector.clone()) {
                return Err(VmError::ValidationError("program_duplicate_selector"));
            }
        }
        Ok(Program { entrypoints })
    }

    /// Finds the entrypoint matching `selector`, if any.
    pub fn find(&self, selector: &[u8]) -> Option<&EntryPoint> {
        self.entrypoints.iter().find(|ep| ep.selector == selector)
    }
}

fn tagged(tag: u64, inner: Value) -> Value {
    Value::Map(vec![(Value::text("t"), Value::uint(tag)), (Value::text("v"), inner)])
}

fn untag(v: &Value) -> Result<(u64, &Value), VmError> {
    let tag = v
        .map_get_text("t")
        .and_then(|x| x.as_int())
        .and_then(|i| i.to_u64())
        .ok_or(VmError::ValidationError("node_missing_tag"))?;
    let inner = v.map_get_text("v").ok_or(VmError::ValidationError("node_missing_value"))?;
    Ok((tag, inner))
}

fn small_u8(v: &Value) -> Result<u8, VmError> {
    let n = v.as_int().and_then(|i| i.to_u64()).ok_or(VmError::ValidationError("expected_small_int"))?;
    n.try_into().map_err(|_| VmError::ValidationError("int_out_of_range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn trivial_program() -> Program {
        Program {
            entrypoints: vec![EntryPoint {
                selector: b"get".to_vec(),
                params: 0,
                body: vec![Stmt::Return(Expr::LitInt(0))],
            }],
        }
    }

    #[test]
    fn round_trips_through_cbor() {
        let p = trivial_program();
        let bytes = p.to_cbor().unwrap();
        let decoded = Program::analyze(&bytes).unwrap();
        assert_eq!(decoded, p);
    }

    #[test]
    fn unknown_expr_tag_rejected() {
        let bogus_expr = Value::Map(vec![(Value::text("t"), Value::uint(99)), (Value::text("v"), Value::Null)]);
        let bogus_stmt = Value::Map(vec![(Value::text("t"), Value::uint(7)), (Value::text("v"), bogus_expr)]);
        let program = Value::Map(vec![(
            Value::text("entrypoints"),
            Value::Array(vec![Value::Map(vec![
                (Value::text("selector"), Value::bytes(b"x".to_vec())),
                (Value::text("params"), Value::uint(0)),
                (Value::text("body"), Value::Array(vec![bogus_stmt])),
            ])]),
        )]);
        let bytes = animica_codec::encode(&program).unwrap();
        let err = Program::analyze(&bytes).unwrap_err();
        assert_eq!(err.code(), "VM_VALIDATION_ERROR");
    }

    #[test]
    fn duplicate_selectors_rejected() {
        let ep = EntryPoint { selector: b"dup".to_vec(), params: 0, body: vec![Stmt::Return(Expr::LitInt(1))] };
        let p = Program { entrypoints: vec![ep.clone(), ep] };
        let bytes = p.to_cbor().unwrap();
        assert!(Program::analyze(&bytes).is_err());
    }

    #[test]
    fn find_locates_entrypoint_by_selector() {
        let p = trivial_program();
        assert!(p.find(b"get").is_some());
        assert!(p.find(b"missing").is_none());
    }
}
