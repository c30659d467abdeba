//! The execution frame: the transaction-scoped inputs and the staging area
//! a single call's effects accumulate into before they are committed or
//! discarded.

use crate::gas::GasMeter;
use animica_types::{Address, Log};
use std::collections::{BTreeMap, HashSet};

/// Read-only context available to every expression and statement in a
/// frame. Built once per transaction from the block and transaction under
/// execution.
#[derive(Clone, Debug)]
pub struct TxEnv {
    /// The chain this transaction targets.
    pub chain_id: u64,
    /// Height of the block this transaction executes in.
    pub block_height: u64,
    /// Timestamp of the block this transaction executes in.
    pub block_timestamp: u64,
    /// The hash of the executing transaction.
    pub tx_hash: [u8; 32],
    /// The address that signed and submitted the transaction.
    pub caller: Address,
    /// The contract address this call executes against.
    pub contract_address: Address,
    /// The block's randomness beacon, mixed into `random_bytes` draws.
    pub block_beacon: Vec<u8>,
}

/// One call's execution frame.
///
/// Storage writes land in `staged` first and are visible to reads within
/// the same frame (read-your-writes), but are only merged into the host's
/// committed storage when the frame finishes successfully. A failed frame
/// discards `staged` and its `events` entirely, per the commit/discard rule.
pub struct ExecutionFrame {
    /// The transaction-scoped read-only inputs.
    pub env: TxEnv,
    /// The gas meter charged for every operation in this frame.
    pub gas: GasMeter,
    staged: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    warm: HashSet<Vec<u8>>,
    events: Vec<Log>,
}

impl ExecutionFrame {
    /// Opens a fresh frame with `gas_limit` gas available and no staged
    /// writes or events.
    pub fn new(env: TxEnv, gas_limit: u64) -> Self {
        ExecutionFrame { env, gas: GasMeter::new(gas_limit), staged: BTreeMap::new(), warm: HashSet::new(), events: Vec::new() }
    }

    /// Records a pending write to `key`, visible to subsequent reads in
    /// this frame.
    pub fn stage_set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.staged.insert(key, Some(value));
    }

    /// Records a pending delete of `key`, visible to subsequent reads in
    /// this frame.
    pub fn stage_delete(&mut self, key: Vec<u8>) {
        self.staged.insert(key, None);
    }

    /// Looks up `key` in the staging area only. `Some(None)` means staged
    /// as deleted; `None` means no staged write exists for this key yet
    /// (fall through to committed storage).
    pub fn staged_get(&self, key: &[u8]) -> Option<Option<&[u8]>> {
        self.staged.get(key).map(|v| v.as_deref())
    }

    /// Marks `key` as accessed this frame, returning `true` the first time
    /// (a cold access) and `false` on every subsequent access (warm).
    pub fn touch(&mut self, key: &[u8]) -> bool {
        self.warm.insert(key.to_vec())
    }

    /// Appends a log to this frame's event buffer.
    pub fn emit(&mut self, log: Log) {
        self.events.push(log);
    }

    /// The events recorded so far, in emission order.
    pub fn events(&self) -> &[Log] {
        &self.events
    }

    /// Consumes the frame, returning its staged writes and events for the
    /// caller to merge into committed state on success.
    pub fn into_effects(self) -> (BTreeMap<Vec<u8>, Option<Vec<u8>>>, Vec<Log>) {
        (self.staged, self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> TxEnv {
        TxEnv {
            chain_id: 1,
            block_height: 10,
            block_timestamp: 0,
            tx_hash: [1u8; 32],
            caller: Address::from_bytes([2u8; 32]),
            contract_address: Address::from_bytes([3u8; 32]),
            block_beacon: vec![4u8; 32],
        }
    }

    #[test]
    fn staged_writes_are_read_your_writes() {
        let mut f = ExecutionFrame::new(env(), 1_000_000);
        assert_eq!(f.staged_get(b"k"), None);
        f.stage_set(b"k".to_vec(), b"v".to_vec());
        assert_eq!(f.staged_get(b"k"), Some(Some(&b"v"[..])));
        f.stage_delete(b"k".to_vec());
        assert_eq!(f.staged_get(b"k"), Some(None));
    }

    #[test]
    fn touch_reports_cold_once_then_warm() {
        let mut f = ExecutionFrame::new(env(), 1_000_000);
        assert!(f.touch(b"k"));
        assert!(!f.touch(b"k"));
    }

    #[test]
    fn into_effects_carries_staged_and_events() {
        let mut f = ExecutionFrame::new(env(), 1_000_000);
        f.stage_set(b"k".to_vec(), b"v".to_vec());
        f.emit(Log::new(Address::from_bytes([9u8; 32]), vec![], Vec::new()));
        let (staged, events) = f.into_effects();
        assert_eq!(staged.get(&b"k".to_vec()), Some(&Some(b"v".to_vec())));
        assert_eq!(events.len(), 1);
    }
}
