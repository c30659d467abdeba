//! A reference counter contract: `inc(by)` accumulates into a single
//! storage slot using the minimal unsigned big-endian encoding (`0x05` for
//! the value 5, not a fixed-width signed encoding), `get()` reads it back.

use crate::program::{EntryPoint, Expr, Program, Stmt};

const VALUE_KEY: &[u8] = b"value";

/// Builds the counter program: `inc` at arity 1, `get` at arity 0.
pub fn program() -> Program {
    let inc = EntryPoint {
        selector: b"inc".to_vec(),
        params: 1,
        body: vec![
            Stmt::SetLocal(
                0,
                Expr::Add(Box::new(Expr::StorageGet(Box::new(Expr::LitBytes(VALUE_KEY.to_vec())))), Box::new(Expr::Arg(0))),
            ),
            Stmt::StorageSet(Expr::LitBytes(VALUE_KEY.to_vec()), Expr::Local(0)),
            Stmt::Emit(
                b"Inc".to_vec(),
                vec![(b"by".to_vec(), Expr::Arg(0)), (b"value".to_vec(), Expr::Local(0))],
            ),
            Stmt::Return(Expr::Local(0)),
        ],
    };
    let get = EntryPoint {
        selector: b"get".to_vec(),
        params: 0,
        body: vec![Stmt::Return(Expr::StorageGet(Box::new(Expr::LitBytes(VALUE_KEY.to_vec()))))],
    };
    Program { entrypoints: vec![inc, get] }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{ExecutionFrame, TxEnv};
    use crate::host::DefaultHost;
    use crate::interpreter::call;
    use animica_codec::Value;
    use animica_types::Address;

    fn env() -> TxEnv {
        TxEnv {
            chain_id: 1,
            block_height: 1,
            block_timestamp: 0,
            tx_hash: [0u8; 32],
            caller: Address::from_bytes([1u8; 32]),
            contract_address: Address::from_bytes([2u8; 32]),
            block_beacon: vec![0u8; 32],
        }
    }

    #[test]
    fn inc_then_get_round_trips_minimal_be() {
        let p = program();
        let mut host = DefaultHost::new();
        let mut frame = ExecutionFrame::new(env(), 10_000_000);
        let ret = call(&mut host, &mut frame, &p, b"inc", &[Value::uint(5)]).unwrap();
        assert_eq!(ret, Value::uint(5));
        let (staged, events) = frame.into_effects();
        host.commit(&env().contract_address, staged);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, animica_codec::encode(&Value::Map(vec![
            (Value::bytes(b"by".to_vec()), Value::bytes(vec![5u8])),
            (Value::bytes(b"value".to_vec()), Value::bytes(vec![5u8])),
        ])).unwrap());

        let mut frame2 = ExecutionFrame::new(env(), 10_000_000);
        let out = call(&mut host, &mut frame2, &p, b"get", &[]).unwrap();
        assert_eq!(out, Value::bytes(vec![5u8]));
    }

    #[test]
    fn reexecution_is_byte_identical() {
        let p = program();
        let run = || {
            let mut host = DefaultHost::new();
            let mut frame = ExecutionFrame::new(env(), 10_000_000);
            let ret = call(&mut host, &mut frame, &p, b"inc", &[Value::uint(5)]).unwrap();
            let gas_used = frame.gas.used();
            let (staged, events) = frame.into_effects();
            (ret, gas_used, staged, events)
        };
        let a = run();
        let b = run();
        assert_eq!(a.0, b.0);
        assert_eq!(a.1, b.1);
        assert_eq!(a.2, b.2);
        assert_eq!(a.3, b.3);
    }
}
