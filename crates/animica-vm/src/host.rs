//! The host boundary: committed storage, the treasury ledger, and the
//! off-chain compute/randomness/DA/zk syscalls a frame cannot implement on
//! its own.
//!
//! Everything here is deterministic by construction: the same sequence of
//! calls against the same committed state produces byte-identical results,
//! which is what lets two honest nodes replay a block to the same receipts.

use crate::error::VmError;
use crate::frame::TxEnv;
use animica_types::{Address, Amount};
use std::collections::BTreeMap;

fn hash256(data: &[u8]) -> Result<[u8; 32], VmError> {
    animica_crypto::sha3_256(data).map_err(|_| VmError::CapabilityUnavailable("hash"))
}

/// The capability surface a frame's interpreter calls out to for anything
/// beyond pure computation over arguments and locals.
pub trait Host {
    /// Reads `key` from `contract`'s committed storage. Missing keys read
    /// as empty bytes, never an error.
    fn storage_get(&self, contract: &Address, key: &[u8]) -> Vec<u8>;

    /// The committed treasury balance of `addr`.
    fn treasury_balance(&self, addr: &Address) -> Amount;

    /// Debits `amount` from `from` and credits it to `to`. Fails with
    /// [`VmError::Revert`] if `from` does not hold at least `amount`.
    fn treasury_transfer(&mut self, from: &Address, to: &Address, amount: &Amount) -> Result<(), VmError>;

    /// Pins `data` under namespace `ns`, returning a commitment.
    fn blob_pin(&mut self, ns: &[u8], data: &[u8]) -> Result<Vec<u8>, VmError>;

    /// Enqueues an AI compute job, returning its deterministic `task_id`.
    fn ai_enqueue(&mut self, env: &TxEnv, model: &[u8], prompt: &[u8]) -> Result<Vec<u8>, VmError>;

    /// Enqueues a quantum compute job, returning its deterministic
    /// `task_id`.
    fn quantum_enqueue(&mut self, env: &TxEnv, circuit: &[u8], shots: u64) -> Result<Vec<u8>, VmError>;

    /// Reads a previously enqueued task's `(status, output)`. Fails with
    /// [`VmError::NoResultYet`] before the task's availability height.
    fn read_result(&self, task_id: &[u8], current_height: u64) -> Result<(Vec<u8>, Vec<u8>), VmError>;

    /// Verifies a zk proof against a circuit and public input.
    fn zk_verify(&self, circuit: &[u8], proof: &[u8], public: &[u8]) -> Result<bool, VmError>;

    /// Draws `n` deterministic bytes, bound to the frame's beacon, tx
    /// hash, and a per-frame draw counter so repeated draws in one call
    /// diverge.
    fn random_bytes(&self, env: &TxEnv, draw_index: u64, n: usize) -> Result<Vec<u8>, VmError>;
}

#[derive(Clone)]
struct Task {
    enqueued_at_height: u64,
    status: Vec<u8>,
    output: Vec<u8>,
}

/// An in-memory deterministic [`Host`] implementation: committed storage,
/// a treasury ledger, and a task table simulating off-chain compute
/// results, all keyed so that replaying the same block sequence produces
/// the same reads.
#[derive(Default)]
pub struct DefaultHost {
    storage: BTreeMap<(Address, Vec<u8>), Vec<u8>>,
    treasury: BTreeMap<Address, Amount>,
    tasks: BTreeMap<Vec<u8>, Task>,
}

impl DefaultHost {
    /// Opens an empty host with no storage, zero balances, and no tasks.
    pub fn new() -> Self {
        DefaultHost::default()
    }

    /// Credits `addr` with `amount`, for seeding test/genesis balances.
    pub fn credit(&mut self, addr: Address, amount: Amount) {
        let entry = self.treasury.entry(addr).or_insert_with(Amount::zero);
        if let Some(sum) = entry.checked_add(&amount) {
            *entry = sum;
        }
    }

    /// Commits a frame's staged writes into this host's storage for
    /// `contract`. Called once a frame finishes successfully.
    pub fn commit(&mut self, contract: &Address, staged: BTreeMap<Vec<u8>, Option<Vec<u8>>>) {
        for (key, value) in staged {
            match value {
                Some(v) => {
                    self.storage.insert((*contract, key), v);
                }
                None => {
                    self.storage.remove(&(*contract, key));
                }
            }
        }
    }

    fn task_id(env: &TxEnv, kind: &[u8], payload: &[u8]) -> Result<Vec<u8>, VmError> {
        let mut preimage = Vec::with_capacity(8 + 8 + 32 + 32 + kind.len() + payload.len());
        preimage.extend_from_slice(&env.chain_id.to_be_bytes());
        preimage.extend_from_slice(&env.block_height.to_be_bytes());
        preimage.extend_from_slice(&env.tx_hash);
        preimage.extend_from_slice(env.caller.as_bytes());
        preimage.extend_from_slice(kind);
        preimage.extend_from_slice(payload);
        Ok(hash256(&preimage)?.to_vec())
    }
}

impl Host for DefaultHost {
    fn storage_get(&self, contract: &Address, key: &[u8]) -> Vec<u8> {
        self.storage.get(&(*contract, key.to_vec())).cloned().unwrap_or_default()
    }

    fn treasury_balance(&self, addr: &Address) -> Amount {
        self.treasury.get(addr).cloned().unwrap_or_else(Amount::zero)
    }

    fn treasury_transfer(&mut self, from: &Address, to: &Address, amount: &Amount) -> Result<(), VmError> {
        let from_balance = self.treasury_balance(from);
        let next_from = from_balance
            .checked_sub(amount)
            .ok_or_else(|| VmError::Revert("treasury_insufficient_balance".to_string()))?;
        let to_balance = self.treasury_balance(to);
        let next_to = to_balance
            .checked_add(amount)
            .ok_or_else(|| VmError::Revert("treasury_balance_overflow".to_string()))?;
        self.treasury.insert(*from, next_from);
        self.treasury.insert(*to, next_to);
        Ok(())
    }

    fn blob_pin(&mut self, ns: &[u8], data: &[u8]) -> Result<Vec<u8>, VmError> {
        let mut preimage = Vec::with_capacity(ns.len() + data.len());
        preimage.extend_from_slice(ns);
        preimage.extend_from_slice(data);
        Ok(hash256(&preimage)?.to_vec())
    }

    fn ai_enqueue(&mut self, env: &TxEnv, model: &[u8], prompt: &[u8]) -> Result<Vec<u8>, VmError> {
        let mut payload = Vec::with_capacity(model.len() + prompt.len());
        payload.extend_from_slice(model);
        payload.extend_from_slice(prompt);
        let task_id = Self::task_id(env, b"ai", &payload)?;
        let output = hash256(&task_id)?.to_vec();
        self.tasks.insert(
            task_id.clone(),
            Task { enqueued_at_height: env.block_height, status: b"ok".to_vec(), output },
        );
        Ok(task_id)
    }

    fn quantum_enqueue(&mut self, env: &TxEnv, circuit: &[u8], shots: u64) -> Result<Vec<u8>, VmError> {
        let mut payload = Vec::with_capacity(circuit.len() + 8);
        payload.extend_from_slice(circuit);
        payload.extend_from_slice(&shots.to_be_bytes());
        let task_id = Self::task_id(env, b"quantum", &payload)?;
        let output = hash256(&task_id)?.to_vec();
        self.tasks.insert(
            task_id.clone(),
            Task { enqueued_at_height: env.block_height, status: b"ok".to_vec(), output },
        );
        Ok(task_id)
    }

    fn read_result(&self, task_id: &[u8], current_height: u64) -> Result<(Vec<u8>, Vec<u8>), VmError> {
        let task = self.tasks.get(task_id).ok_or(VmError::NoResultYet)?;
        if current_height <= task.enqueued_at_height {
            return Err(VmError::NoResultYet);
        }
        Ok((task.status.clone(), task.output.clone()))
    }

    fn zk_verify(&self, circuit: &[u8], proof: &[u8], public: &[u8]) -> Result<bool, VmError> {
        let mut preimage = Vec::with_capacity(circuit.len() + public.len());
        preimage.extend_from_slice(circuit);
        preimage.extend_from_slice(public);
        Ok(hash256(&preimage)?.to_vec() == proof)
    }

    fn random_bytes(&self, env: &TxEnv, draw_index: u64, n: usize) -> Result<Vec<u8>, VmError> {
        let mut out = Vec::with_capacity(n);
        let mut counter: u64 = 0;
        while out.len() < n {
            let mut preimage = Vec::with_capacity(env.block_beacon.len() + 32 + 16);
            preimage.extend_from_slice(&env.block_beacon);
            preimage.extend_from_slice(&env.tx_hash);
            preimage.extend_from_slice(&draw_index.to_be_bytes());
            preimage.extend_from_slice(&counter.to_be_bytes());
            out.extend_from_slice(&hash256(&preimage)?);
            counter += 1;
        }
        out.truncate(n);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(height: u64) -> TxEnv {
        TxEnv {
            chain_id: 7,
            block_height: height,
            block_timestamp: 0,
            tx_hash: [9u8; 32],
            caller: Address::from_bytes([1u8; 32]),
            contract_address: Address::from_bytes([2u8; 32]),
            block_beacon: vec![5u8; 32],
        }
    }

    #[test]
    fn storage_defaults_to_empty() {
        let h = DefaultHost::new();
        let addr = Address::from_bytes([1u8; 32]);
        assert_eq!(h.storage_get(&addr, b"missing"), Vec::<u8>::new());
    }

    #[test]
    fn commit_persists_staged_writes() {
        let mut h = DefaultHost::new();
        let addr = Address::from_bytes([1u8; 32]);
        let mut staged = BTreeMap::new();
        staged.insert(b"k".to_vec(), Some(b"v".to_vec()));
        h.commit(&addr, staged);
        assert_eq!(h.storage_get(&addr, b"k"), b"v".to_vec());
    }

    #[test]
    fn treasury_transfer_moves_balance() {
        let mut h = DefaultHost::new();
        let a = Address::from_bytes([1u8; 32]);
        let b = Address::from_bytes([2u8; 32]);
        h.credit(a, Amount::from_u64(100));
        h.treasury_transfer(&a, &b, &Amount::from_u64(40)).unwrap();
        assert_eq!(h.treasury_balance(&a).to_u128(), Some(60));
        assert_eq!(h.treasury_balance(&b).to_u128(), Some(40));
    }

    #[test]
    fn treasury_transfer_rejects_insufficient_balance() {
        let mut h = DefaultHost::new();
        let a = Address::from_bytes([1u8; 32]);
        let b = Address::from_bytes([2u8; 32]);
        assert!(h.treasury_transfer(&a, &b, &Amount::from_u64(1)).is_err());
    }

    #[test]
    fn read_result_fails_same_block_then_succeeds_next_block() {
        let mut h = DefaultHost::new();
        let task_id = h.ai_enqueue(&env(10), b"animica/tiny-v1", b"hello").unwrap();
        assert!(matches!(h.read_result(&task_id, 10), Err(VmError::NoResultYet)));
        assert!(h.read_result(&task_id, 11).is_ok());
    }

    #[test]
    fn random_bytes_is_deterministic_and_diverges_per_draw() {
        let h = DefaultHost::new();
        let e = env(1);
        let a = h.random_bytes(&e, 0, 16).unwrap();
        let b = h.random_bytes(&e, 0, 16).unwrap();
        let c = h.random_bytes(&e, 1, 16).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn zk_verify_accepts_matching_proof_and_rejects_tampered() {
        let h = DefaultHost::new();
        let circuit = b"circuit".to_vec();
        let public = b"public".to_vec();
        let mut preimage = circuit.clone();
        preimage.extend_from_slice(&public);
        let proof = animica_crypto::sha3_256(&preimage).unwrap().to_vec();
        assert!(h.zk_verify(&circuit, &proof, &public).unwrap());
        assert!(!h.zk_verify(&circuit, b"bogus", &public).unwrap());
    }
}
