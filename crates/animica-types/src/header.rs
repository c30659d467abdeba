//! The block header: canonical fields, a decode-only alias table for
//! snake/camel casing tolerance, and the SignBytes/HeaderHash contract.

use crate::error::{InvalidConstruction, TypesDecodeError};
use animica_codec::Value;

/// Upper bound on `theta`, enforced as a structural sanity check.
pub const THETA_MAX: u64 = 1_000_000_000_000;
/// Upper bound, in bytes, on `mix_seed` and `nonce`.
pub const SEED_MAX_LEN: usize = 64;

/// The canonical field names, in the order they're always re-encoded. Each
/// inner slice after the first element lists decode-only aliases accepted
/// for that field (snake_case is canonical; camelCase and a couple of
/// historical spellings are tolerated on decode only).
const FIELD_ALIASES: &[(&str, &[&str])] = &[
    ("chain_id", &["chainId"]),
    ("height", &[]),
    ("parent_hash", &["parentHash", "prev_hash", "prevHash"]),
    ("timestamp", &[]),
    ("state_root", &["stateRoot"]),
    ("txs_root", &["txsRoot"]),
    ("receipts_root", &["receiptsRoot"]),
    ("proofs_root", &["proofsRoot"]),
    ("da_root", &["daRoot"]),
    ("theta", &[]),
    ("mix_seed", &["mixSeed"]),
    ("nonce", &[]),
];

fn lookup_aliased<'a>(v: &'a Value, canonical: &str) -> Option<&'a Value> {
    if let Some(found) = v.map_get_text(canonical) {
        return Some(found);
    }
    let (_, aliases) = FIELD_ALIASES.iter().find(|(name, _)| *name == canonical)?;
    aliases.iter().find_map(|alias| v.map_get_text(alias))
}

/// A block header. Every 32-byte root field is exactly 32 bytes; `theta` is
/// bounded; `mix_seed`/`nonce` are bounded to [`SEED_MAX_LEN`] bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    /// The chain this header belongs to.
    pub chain_id: u64,
    /// The block height, 0 for genesis.
    pub height: u64,
    /// HeaderHash of the parent block (all-zero for genesis).
    pub parent_hash: [u8; 32],
    /// Block timestamp (unit is policy, not specified by the core).
    pub timestamp: u64,
    /// Post-execution state root.
    pub state_root: [u8; 32],
    /// Root committing to the block's transactions.
    pub txs_root: [u8; 32],
    /// Root committing to the block's receipts.
    pub receipts_root: [u8; 32],
    /// Root committing to attached proofs.
    pub proofs_root: [u8; 32],
    /// Root committing to data-availability pins.
    pub da_root: [u8; 32],
    /// Consensus-weight parameter, bounded to [`THETA_MAX`].
    pub theta: u64,
    /// Mixing seed for deterministic randomness, bounded to
    /// [`SEED_MAX_LEN`] bytes.
    pub mix_seed: Vec<u8>,
    /// Header nonce, bounded to [`SEED_MAX_LEN`] bytes.
    pub nonce: Vec<u8>,
}

impl Header {
    /// Builds a `Header`, validating all structural invariants.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chain_id: u64,
        height: u64,
        parent_hash: [u8; 32],
        timestamp: u64,
        state_root: [u8; 32],
        txs_root: [u8; 32],
        receipts_root: [u8; 32],
        proofs_root: [u8; 32],
        da_root: [u8; 32],
        theta: u64,
        mix_seed: Vec<u8>,
        nonce: Vec<u8>,
    ) -> Result<Self, InvalidConstruction> {
        if theta > THETA_MAX {
            return Err(InvalidConstruction::new("theta_out_of_range"));
        }
        if mix_seed.len() > SEED_MAX_LEN {
            return Err(InvalidConstruction::new("mix_seed_too_long"));
        }
        if nonce.len() > SEED_MAX_LEN {
            return Err(InvalidConstruction::new("nonce_too_long"));
        }
        Ok(Header {
            chain_id,
            height,
            parent_hash,
            timestamp,
            state_root,
            txs_root,
            receipts_root,
            proofs_root,
            da_root,
            theta,
            mix_seed,
            nonce,
        })
    }

    /// The canonical map shape, always emitted with canonical snake_case
    /// field names regardless of which aliases were accepted on decode.
    pub fn to_value(&self) -> Value {
        Value::Map(vec![
            (Value::text("chain_id"), Value::uint(self.chain_id)),
            (Value::text("height"), Value::uint(self.height)),
            (Value::text("parent_hash"), Value::bytes(self.parent_hash.to_vec())),
            (Value::text("timestamp"), Value::uint(self.timestamp)),
            (Value::text("state_root"), Value::bytes(self.state_root.to_vec())),
            (Value::text("txs_root"), Value::bytes(self.txs_root.to_vec())),
            (Value::text("receipts_root"), Value::bytes(self.receipts_root.to_vec())),
            (Value::text("proofs_root"), Value::bytes(self.proofs_root.to_vec())),
            (Value::text("da_root"), Value::bytes(self.da_root.to_vec())),
            (Value::text("theta"), Value::uint(self.theta)),
            (Value::text("mix_seed"), Value::bytes(self.mix_seed.clone())),
            (Value::text("nonce"), Value::bytes(self.nonce.clone())),
        ])
    }

    /// Decodes a `Header` from a map, tolerating the documented alias
    /// spellings for each field. Unknown fields outside the canonical set
    /// and its aliases are rejected.
    pub fn from_value(v: &Value) -> Result<Self, TypesDecodeError> {
        let pairs = match v {
            Value::Map(pairs) => pairs,
            _ => return Err(TypesDecodeError::WrongType("header")),
        };
        for (k, _) in pairs {
            let key = k.as_text().ok_or(TypesDecodeError::WrongType("header_key"))?;
            let known = FIELD_ALIASES
                .iter()
                .any(|(name, aliases)| *name == key || aliases.contains(&key));
            if !known {
                return Err(TypesDecodeError::UnknownField(key.to_string()));
            }
        }

        let u64_field = |name: &'static str| -> Result<u64, TypesDecodeError> {
            lookup_aliased(v, name)
                .and_then(|x| x.as_int())
                .and_then(|i| i.to_u64())
                .ok_or(TypesDecodeError::MissingField(name))
        };
        let hash32_field = |name: &'static str| -> Result<[u8; 32], TypesDecodeError> {
            let bytes = lookup_aliased(v, name)
                .and_then(|x| x.as_bytes())
                .ok_or(TypesDecodeError::MissingField(name))?;
            bytes
                .try_into()
                .map_err(|_| InvalidConstruction::new("header_root_length").into())
        };
        let bytes_field = |name: &'static str| -> Result<Vec<u8>, TypesDecodeError> {
            Ok(lookup_aliased(v, name)
                .and_then(|x| x.as_bytes())
                .ok_or(TypesDecodeError::MissingField(name))?
                .to_vec())
        };

        let chain_id = u64_field("chain_id")?;
        let height = u64_field("height")?;
        let parent_hash = hash32_field("parent_hash")?;
        let timestamp = u64_field("timestamp")?;
        let state_root = hash32_field("state_root")?;
        let txs_root = hash32_field("txs_root")?;
        let receipts_root = hash32_field("receipts_root")?;
        let proofs_root = hash32_field("proofs_root")?;
        let da_root = hash32_field("da_root")?;
        let theta = u64_field("theta")?;
        let mix_seed = bytes_field("mix_seed")?;
        let nonce = bytes_field("nonce")?;

        Ok(Header::new(
            chain_id,
            height,
            parent_hash,
            timestamp,
            state_root,
            txs_root,
            receipts_root,
            proofs_root,
            da_root,
            theta,
            mix_seed,
            nonce,
        )?)
    }

    /// SignBytes for this header under `animica/header/sign/v1`.
    pub fn sign_bytes(&self) -> Result<Vec<u8>, animica_signing::SignBytesError> {
        animica_signing::signbytes_header(self.to_value(), self.chain_id)
    }

    /// HeaderHash: sha3_256 of this header's SignBytes.
    pub fn header_hash(&self) -> Result<[u8; 32], InvalidConstruction> {
        let sb = self
            .sign_bytes()
            .map_err(|_| InvalidConstruction::new("header_not_encodable"))?;
        animica_crypto::sha3_256(&sb).map_err(|_| InvalidConstruction::new("hash_failed"))
    }
}
