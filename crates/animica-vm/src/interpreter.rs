//! Evaluates a [`Program`]'s selected entrypoint against a host and an
//! execution frame, charging gas per [`crate::gas`] as it goes.

use crate::error::VmError;
use crate::frame::ExecutionFrame;
use crate::gas;
use crate::host::Host;
use crate::program::{EntryPoint, Expr, Program, Stmt};
use animica_codec::Value;
use animica_types::{Address, Amount, Log};
use std::collections::HashMap;

/// A runtime value: what an [`Expr`] evaluates to, or what a local slot
/// holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Val {
    /// A byte string.
    Bytes(Vec<u8>),
    /// An unsigned integer.
    Int(u64),
    /// A boolean.
    Bool(bool),
}

impl Val {
    /// Byte-string view. An integer converts to its minimal big-endian
    /// magnitude (empty for zero), matching how contracts persist counters
    /// to storage.
    fn as_bytes(&self) -> Result<Vec<u8>, VmError> {
        match self {
            Val::Bytes(b) => Ok(b.clone()),
            Val::Int(n) => {
                let full = n.to_be_bytes();
                let first_nonzero = full.iter().position(|&b| b != 0).unwrap_or(full.len());
                Ok(full[first_nonzero..].to_vec())
            }
            _ => Err(VmError::ValidationError("expected_bytes_value")),
        }
    }

    /// Integer view. A byte string parses as a big-endian magnitude
    /// (empty reads as zero), matching the minimal-BE counter encoding.
    fn as_int(&self) -> Result<u64, VmError> {
        match self {
            Val::Int(n) => Ok(*n),
            Val::Bytes(b) => {
                if b.len() > 8 {
                    return Err(VmError::InvalidStorage("int_too_wide"));
                }
                let mut buf = [0u8; 8];
                let start = 8 - b.len();
                buf[start..].copy_from_slice(b);
                Ok(u64::from_be_bytes(buf))
            }
            _ => Err(VmError::ValidationError("expected_int_value")),
        }
    }

    fn truthy(&self) -> bool {
        match self {
            Val::Bytes(b) => !b.is_empty(),
            Val::Int(n) => *n != 0,
            Val::Bool(b) => *b,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Val::Bytes(b) => Value::bytes(b.clone()),
            Val::Int(n) => Value::uint(*n),
            Val::Bool(b) => Value::Bool(*b),
        }
    }

    /// Normalizes this value to bytes for an event field: bytes pass
    /// through unchanged, a bool becomes a single `0x01`/`0x00` byte, and
    /// an int becomes its minimal big-endian magnitude with zero written
    /// as a single `0x00` byte rather than the empty string `as_bytes`
    /// would give. Event data is a canonical `<bytes,bytes>` map, never a
    /// CBOR int or bool, so this is distinct from `to_value`.
    fn to_event_bytes(&self) -> Vec<u8> {
        match self {
            Val::Bytes(b) => b.clone(),
            Val::Bool(b) => vec![*b as u8],
            Val::Int(0) => vec![0],
            Val::Int(n) => {
                let full = n.to_be_bytes();
                let first_nonzero = full.iter().position(|&b| b != 0).unwrap_or(full.len());
                full[first_nonzero..].to_vec()
            }
        }
    }

    fn from_arg(v: &Value) -> Result<Self, VmError> {
        match v {
            Value::Bytes(b) => Ok(Val::Bytes(b.clone())),
            Value::Bool(b) => Ok(Val::Bool(*b)),
            Value::Int(i) => i
                .to_u64()
                .map(Val::Int)
                .ok_or(VmError::ValidationError("arg_int_out_of_range")),
            _ => Err(VmError::ValidationError("arg_unsupported_shape")),
        }
    }

    fn address(&self) -> Result<Address, VmError> {
        Address::from_slice(&self.as_bytes()?).map_err(|_| VmError::ValidationError("expected_address_value"))
    }

    fn amount(&self) -> Result<Amount, VmError> {
        Amount::from_be_bytes(&self.as_bytes()?).map_err(|_| VmError::ValidationError("expected_amount_value"))
    }
}

/// Runs `selector` against `program` inside `frame`, using `host` for
/// storage, treasury, and syscall effects. On success, returns the
/// entrypoint's return value (`Value::Null` if it fell off the end
/// without a `Return`).
pub fn call(
    host: &mut dyn Host,
    frame: &mut ExecutionFrame,
    program: &Program,
    selector: &[u8],
    args: &[Value],
) -> Result<Value, VmError> {
    let entry = program
        .find(selector)
        .ok_or(VmError::ValidationError("entrypoint_not_found"))?;
    if args.len() != entry.params as usize {
        return Err(VmError::ValidationError("entrypoint_arity_mismatch"));
    }
    let mut call_args = Vec::with_capacity(args.len());
    for a in args {
        call_args.push(Val::from_arg(a)?);
    }
    let mut locals: HashMap<u8, Val> = HashMap::new();
    let mut ctx = Ctx { host, frame, args: call_args, locals: &mut locals };
    run_body(&mut ctx, &entry.body)
}

struct Ctx<'a> {
    host: &'a mut dyn Host,
    frame: &'a mut ExecutionFrame,
    args: Vec<Val>,
    locals: &'a mut HashMap<u8, Val>,
}

fn run_body(ctx: &mut Ctx<'_>, body: &[Stmt]) -> Result<Value, VmError> {
    for stmt in body {
        if let Some(v) = exec_stmt(ctx, stmt)? {
            return Ok(v);
        }
    }
    Ok(Value::Null)
}

fn exec_stmt(ctx: &mut Ctx<'_>, stmt: &Stmt) -> Result<Option<Value>, VmError> {
    match stmt {
        Stmt::SetLocal(slot, e) => {
            let v = eval(ctx, e)?;
            ctx.locals.insert(*slot, v);
            Ok(None)
        }
        Stmt::StorageSet(k, v) => {
            let key = eval(ctx, k)?.as_bytes()?.to_vec();
            let value = eval(ctx, v)?.as_bytes()?.to_vec();
            let cold = ctx.frame.touch(&key);
            ctx.frame
                .gas
                .consume(if cold { gas::STORAGE_WRITE_COLD } else { gas::STORAGE_WRITE_WARM })?;
            ctx.frame.stage_set(key, value);
            Ok(None)
        }
        Stmt::StorageDelete(k) => {
            let key = eval(ctx, k)?.as_bytes()?.to_vec();
            ctx.frame.touch(&key);
            ctx.frame.gas.consume(gas::STORAGE_DELETE)?;
            ctx.frame.stage_delete(key);
            Ok(None)
        }
        Stmt::Emit(name, fields) => {
            let mut data_fields = Vec::with_capacity(fields.len());
            let mut byte_len = name.len();
            for (k, e) in fields {
                let v = eval(ctx, e)?;
                let encoded = v.to_event_bytes();
                byte_len += k.len() + encoded.len();
                data_fields.push((Value::bytes(k.clone()), Value::bytes(encoded)));
            }
            ctx.frame
                .gas
                .consume(gas::EVENT_BASE + gas::EVENT_PER_BYTE * byte_len as u64)?;
            let data = animica_codec::encode(&Value::Map(data_fields))
                .map_err(|_| VmError::ValidationError("event_encode_failed"))?;
            let topic = hash_topic(name)?;
            let contract = ctx.frame.env.contract_address;
            ctx.frame.emit(Log::new(contract, vec![topic], data));
            Ok(None)
        }
        Stmt::Require(cond, reason) => {
            let v = eval(ctx, cond)?;
            if !v.truthy() {
                return Err(VmError::Revert(String::from_utf8_lossy(reason).into_owned()));
            }
            Ok(None)
        }
        Stmt::Return(e) => {
            let v = eval(ctx, e)?;
            Ok(Some(v.to_value()))
        }
        Stmt::Revert(reason) => Err(VmError::Revert(String::from_utf8_lossy(reason).into_owned())),
        Stmt::TreasuryTransfer { to, amount } => {
            let to_addr = eval(ctx, to)?.address()?;
            let amt = eval(ctx, amount)?.amount()?;
            ctx.frame.gas.consume(gas::TREASURY_OP)?;
            let from = ctx.frame.env.contract_address;
            ctx.host.treasury_transfer(&from, &to_addr, &amt)?;
            Ok(None)
        }
        Stmt::AiEnqueue { model, prompt, dest_local } => {
            let model_b = eval(ctx, model)?.as_bytes()?.to_vec();
            let prompt_b = eval(ctx, prompt)?.as_bytes()?.to_vec();
            ctx.frame.gas.consume(gas::SYSCALL_BASE)?;
            let task_id = ctx.host.ai_enqueue(&ctx.frame.env, &model_b, &prompt_b)?;
            ctx.locals.insert(*dest_local, Val::Bytes(task_id));
            Ok(None)
        }
        Stmt::QuantumEnqueue { circuit, shots, dest_local } => {
            let circuit_b = eval(ctx, circuit)?.as_bytes()?.to_vec();
            let shots_n = eval(ctx, shots)?.as_int()?;
            ctx.frame.gas.consume(gas::SYSCALL_BASE)?;
            let task_id = ctx.host.quantum_enqueue(&ctx.frame.env, &circuit_b, shots_n)?;
            ctx.locals.insert(*dest_local, Val::Bytes(task_id));
            Ok(None)
        }
        Stmt::ReadResult { task_id, status_local, output_local } => {
            let id = eval(ctx, task_id)?.as_bytes()?.to_vec();
            ctx.frame.gas.consume(gas::SYSCALL_BASE)?;
            let (status, output) = ctx.host.read_result(&id, ctx.frame.env.block_height)?;
            ctx.locals.insert(*status_local, Val::Bytes(status));
            ctx.locals.insert(*output_local, Val::Bytes(output));
            Ok(None)
        }
        Stmt::BlobPin { ns, data, dest_local } => {
            let ns_n = eval(ctx, ns)?.as_int()?;
            let ns_n: u32 = ns_n.try_into().map_err(|_| VmError::ValidationError("ns_out_of_range"))?;
            let data_b = eval(ctx, data)?.as_bytes()?.to_vec();
            ctx.frame.gas.consume(gas::SYSCALL_BASE)?;
            let commitment = ctx.host.blob_pin(&ns_n.to_be_bytes(), &data_b)?;
            ctx.locals.insert(*dest_local, Val::Bytes(commitment));
            Ok(None)
        }
        Stmt::ZkVerify { circuit, proof, public, dest_local } => {
            let circuit_b = eval(ctx, circuit)?.as_bytes()?.to_vec();
            let proof_b = eval(ctx, proof)?.as_bytes()?.to_vec();
            let public_b = eval(ctx, public)?.as_bytes()?.to_vec();
            ctx.frame.gas.consume(gas::SYSCALL_BASE)?;
            let ok = ctx.host.zk_verify(&circuit_b, &proof_b, &public_b)?;
            ctx.locals.insert(*dest_local, Val::Bool(ok));
            Ok(None)
        }
        Stmt::RandomBytes { n, dest_local } => {
            let n_val = eval(ctx, n)?.as_int()?;
            let n_usize: usize = n_val.try_into().map_err(|_| VmError::ValidationError("n_out_of_range"))?;
            ctx.frame.gas.consume(gas::SYSCALL_BASE)?;
            let draw_index = ctx.locals.len() as u64;
            let bytes = ctx.host.random_bytes(&ctx.frame.env, draw_index, n_usize)?;
            ctx.locals.insert(*dest_local, Val::Bytes(bytes));
            Ok(None)
        }
    }
}

fn eval(ctx: &mut Ctx<'_>, e: &Expr) -> Result<Val, VmError> {
    match e {
        Expr::LitBytes(b) => Ok(Val::Bytes(b.clone())),
        Expr::LitInt(n) => Ok(Val::Int(*n)),
        Expr::LitBool(b) => Ok(Val::Bool(*b)),
        Expr::Arg(n) => ctx
            .args
            .get(*n as usize)
            .cloned()
            .ok_or(VmError::ValidationError("arg_slot_out_of_range")),
        Expr::Local(n) => ctx
            .locals
            .get(n)
            .cloned()
            .ok_or(VmError::ValidationError("local_slot_unset")),
        Expr::StorageGet(inner) => {
            let key = eval(ctx, inner)?.as_bytes()?.to_vec();
            let cold = ctx.frame.touch(&key);
            ctx.frame
                .gas
                .consume(if cold { gas::STORAGE_READ_COLD } else { gas::STORAGE_READ_WARM })?;
            let staged = ctx.frame.staged_get(&key);
            let bytes = match staged {
                Some(Some(v)) => v.to_vec(),
                Some(None) => Vec::new(),
                None => ctx.host.storage_get(&ctx.frame.env.contract_address, &key),
            };
            Ok(Val::Bytes(bytes))
        }
        Expr::Add(a, b) => {
            ctx.frame.gas.consume(gas::ARITH_BASE)?;
            let av = eval(ctx, a)?.as_int()?;
            let bv = eval(ctx, b)?.as_int()?;
            let sum = av.checked_add(bv).ok_or(VmError::Revert("add_overflow".to_string()))?;
            Ok(Val::Int(sum))
        }
        Expr::CallerAddress => Ok(Val::Bytes(ctx.frame.env.caller.as_bytes().to_vec())),
        Expr::ContractAddress => Ok(Val::Bytes(ctx.frame.env.contract_address.as_bytes().to_vec())),
        Expr::BlockHeight => Ok(Val::Int(ctx.frame.env.block_height)),
        Expr::ChainId => Ok(Val::Int(ctx.frame.env.chain_id)),
        Expr::Hash(alg, inner) => {
            let bytes = eval(ctx, inner)?.as_bytes()?.to_vec();
            ctx.frame
                .gas
                .consume(gas::HASH_BASE + gas::HASH_PER_BYTE * bytes.len() as u64)?;
            let digest = match alg {
                0 => animica_crypto::sha3_256(&bytes).map(|d| d.to_vec()),
                1 => animica_crypto::sha3_512(&bytes).map(|d| d.to_vec()),
                2 => animica_crypto::keccak256(&bytes).map(|d| d.to_vec()),
                _ => return Err(VmError::ValidationError("expr_unknown_hash_alg")),
            };
            Ok(Val::Bytes(digest.map_err(|_| VmError::CapabilityUnavailable("hash"))?))
        }
        Expr::TreasuryBalance(addr) => {
            let a = eval(ctx, addr)?.address()?;
            ctx.frame.gas.consume(gas::TREASURY_OP)?;
            Ok(Val::Bytes(ctx.host.treasury_balance(&a).as_be_bytes().to_vec()))
        }
    }
}

fn hash_topic(name: &[u8]) -> Result<[u8; 32], VmError> {
    animica_crypto::sha3_256(name).map_err(|_| VmError::CapabilityUnavailable("hash"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::TxEnv;
    use crate::host::DefaultHost;
    use crate::program::EntryPoint;

    fn env() -> TxEnv {
        TxEnv {
            chain_id: 1,
            block_height: 1,
            block_timestamp: 0,
            tx_hash: [0u8; 32],
            caller: Address::from_bytes([1u8; 32]),
            contract_address: Address::from_bytes([2u8; 32]),
            block_beacon: vec![3u8; 32],
        }
    }

    #[test]
    fn returns_literal() {
        let program = Program {
            entrypoints: vec![EntryPoint { selector: b"get".to_vec(), params: 0, body: vec![Stmt::Return(Expr::LitInt(42))] }],
        };
        let mut host = DefaultHost::new();
        let mut frame = ExecutionFrame::new(env(), 1_000_000);
        let out = call(&mut host, &mut frame, &program, b"get", &[]).unwrap();
        assert_eq!(out, Value::uint(42));
    }

    #[test]
    fn arity_mismatch_rejected() {
        let program = Program {
            entrypoints: vec![EntryPoint { selector: b"f".to_vec(), params: 1, body: vec![Stmt::Return(Expr::LitInt(0))] }],
        };
        let mut host = DefaultHost::new();
        let mut frame = ExecutionFrame::new(env(), 1_000_000);
        assert!(call(&mut host, &mut frame, &program, b"f", &[]).is_err());
    }

    #[test]
    fn require_failure_reverts() {
        let program = Program {
            entrypoints: vec![EntryPoint {
                selector: b"f".to_vec(),
                params: 0,
                body: vec![Stmt::Require(Expr::LitBool(false), b"nope".to_vec())],
            }],
        };
        let mut host = DefaultHost::new();
        let mut frame = ExecutionFrame::new(env(), 1_000_000);
        let err = call(&mut host, &mut frame, &program, b"f", &[]).unwrap_err();
        assert!(matches!(err, VmError::Revert(ref r) if r == "nope"));
    }

    #[test]
    fn storage_round_trips_within_frame() {
        let program = Program {
            entrypoints: vec![EntryPoint {
                selector: b"f".to_vec(),
                params: 0,
                body: vec![
                    Stmt::StorageSet(Expr::LitBytes(b"k".to_vec()), Expr::LitBytes(b"v".to_vec())),
                    Stmt::Return(Expr::StorageGet(Box::new(Expr::LitBytes(b"k".to_vec())))),
                ],
            }],
        };
        let mut host = DefaultHost::new();
        let mut frame = ExecutionFrame::new(env(), 1_000_000);
        let out = call(&mut host, &mut frame, &program, b"f", &[]).unwrap();
        assert_eq!(out, Value::bytes(b"v".to_vec()));
    }

    /// (S7) An `ai_enqueue` at height N reads back `NoResultYet` within the
    /// same block; at N+1 the same `task_id` resolves, and the receipt
    /// shape (the returned output, and the emitted event bytes) is
    /// byte-identical across independent reruns from the same pre-state.
    fn ai_roundtrip_program() -> Program {
        Program {
            entrypoints: vec![
                EntryPoint {
                    selector: b"ai_request".to_vec(),
                    params: 2,
                    body: vec![
                        Stmt::AiEnqueue { model: Expr::Arg(0), prompt: Expr::Arg(1), dest_local: 0 },
                        Stmt::Emit(b"AIRequested".to_vec(), vec![(b"task_id".to_vec(), Expr::Local(0))]),
                        Stmt::Return(Expr::Local(0)),
                    ],
                },
                EntryPoint {
                    selector: b"ai_read".to_vec(),
                    params: 1,
                    body: vec![
                        Stmt::ReadResult { task_id: Expr::Arg(0), status_local: 0, output_local: 1 },
                        Stmt::Emit(
                            b"AIResult".to_vec(),
                            vec![(b"status".to_vec(), Expr::Local(0)), (b"output".to_vec(), Expr::Local(1))],
                        ),
                        Stmt::Return(Expr::Local(1)),
                    ],
                },
            ],
        }
    }

    #[test]
    fn ai_enqueue_then_read_result_fails_same_block_then_succeeds_next_block() {
        let program = ai_roundtrip_program();
        let mut host = DefaultHost::new();

        let mut enqueue_frame = ExecutionFrame::new(env(), 1_000_000);
        let task_id_value = call(
            &mut host,
            &mut enqueue_frame,
            &program,
            b"ai_request",
            &[Value::bytes(b"demo/model".to_vec()), Value::bytes(b"hi".to_vec())],
        )
        .unwrap();
        let task_id = task_id_value.as_bytes().unwrap().to_vec();
        let (_staged, events) = enqueue_frame.into_effects();
        assert_eq!(events.len(), 1);

        let mut same_block_frame = ExecutionFrame::new(env(), 1_000_000);
        let err = call(&mut host, &mut same_block_frame, &program, b"ai_read", &[Value::bytes(task_id.clone())])
            .unwrap_err();
        assert!(matches!(err, VmError::NoResultYet));

        let next_env = TxEnv { block_height: env().block_height + 1, ..env() };
        let mut next_block_frame = ExecutionFrame::new(next_env, 1_000_000);
        let out_a =
            call(&mut host, &mut next_block_frame, &program, b"ai_read", &[Value::bytes(task_id.clone())]).unwrap();
        let (_staged_a, events_a) = next_block_frame.into_effects();

        let next_env2 = TxEnv { block_height: env().block_height + 1, ..env() };
        let mut rerun_frame = ExecutionFrame::new(next_env2, 1_000_000);
        let out_b = call(&mut host, &mut rerun_frame, &program, b"ai_read", &[Value::bytes(task_id)]).unwrap();
        let (_staged_b, events_b) = rerun_frame.into_effects();

        assert_eq!(out_a, out_b);
        assert_eq!(events_a, events_b);
    }
}
