//! Decode, link, persist, and update fork choice for incoming blocks.
//!
//! This is intentionally a thin pipeline: chainId match, height continuity,
//! parent existence, and the structural bounds already enforced by
//! [`animica_types::Header::new`]. Heavier consensus checks (PoIES scoring,
//! proof verification, DA sampling) are out of scope here.

use crate::error::ImportError;
use crate::fork_choice::{ForkChoice, HeadCandidate};
use crate::store::BlockStore;
use animica_types::{Block, TypesDecodeError};
use std::sync::Mutex;

/// The outcome classification for a single [`BlockImporter::import_block`]
/// call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportCode {
    /// The block was linked, persisted, and fork choice was updated.
    Accepted,
    /// A block with this hash was already persisted.
    Duplicate,
    /// The block's parent is not known to this importer.
    Orphan,
    /// The block failed a chainId, linkage, or structural check.
    Invalid,
}

/// The result of importing one block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportResult {
    /// The classification of this import attempt.
    pub code: ImportCode,
    /// The block's height, when known (absent for some `Invalid` cases).
    pub height: Option<u64>,
    /// The block's `HeaderHash`, when known.
    pub hash: Option<[u8; 32]>,
    /// Whether the canonical head changed as a result of this import.
    pub head_changed: bool,
    /// A human-readable reason, present for `Invalid`/`Duplicate`/`Orphan`.
    pub reason: Option<String>,
}

impl ImportResult {
    fn accepted(height: u64, hash: [u8; 32], head_changed: bool) -> Self {
        ImportResult { code: ImportCode::Accepted, height: Some(height), hash: Some(hash), head_changed, reason: None }
    }

    fn duplicate(height: u64, hash: [u8; 32], head_changed: bool, reason: &str) -> Self {
        ImportResult {
            code: ImportCode::Duplicate,
            height: Some(height),
            hash: Some(hash),
            head_changed,
            reason: Some(reason.to_string()),
        }
    }

    fn orphan(height: u64, hash: [u8; 32], reason: &str) -> Self {
        ImportResult {
            code: ImportCode::Orphan,
            height: Some(height),
            hash: Some(hash),
            head_changed: false,
            reason: Some(reason.to_string()),
        }
    }

    fn invalid(height: Option<u64>, hash: Option<[u8; 32]>, reason: impl Into<String>) -> Self {
        ImportResult { code: ImportCode::Invalid, height, hash, head_changed: false, reason: Some(reason.into()) }
    }
}

/// Decodes and links incoming blocks against one chain's block store and
/// fork choice tracker.
///
/// Single-writer by construction: `import_block` takes `&self` but guards
/// the fork-choice tracker behind a [`Mutex`], so concurrent imports
/// serialize on fork-choice updates the same way they'd serialize on the
/// block store's own write transactions (§5).
pub struct BlockImporter<S: BlockStore> {
    chain_id: u64,
    store: S,
    fork_choice: Mutex<ForkChoice>,
}

impl<S: BlockStore> BlockImporter<S> {
    /// Opens an importer for `chain_id` backed by `store`, with a fresh
    /// fork-choice tracker.
    pub fn new(chain_id: u64, store: S) -> Self {
        BlockImporter { chain_id, store, fork_choice: Mutex::new(ForkChoice::new()) }
    }

    /// The current canonical head, or `None` before genesis.
    pub fn head(&self) -> Result<Option<(u64, [u8; 32])>, ImportError> {
        self.store.canonical_head()
    }

    /// Decodes `raw` canonical-CBOR bytes into a [`Block`].
    pub fn decode_block(raw: &[u8]) -> Result<Block, ImportError> {
        let v = animica_codec::decode(raw).map_err(|e| ImportError::Decode(TypesDecodeError::from(e)))?;
        Ok(Block::from_value(&v)?)
    }

    /// Imports a block from canonical-CBOR bytes. See
    /// [`Self::import_decoded`] for the decoded-block entry point.
    pub fn import_block(&self, raw: &[u8]) -> Result<ImportResult, ImportError> {
        let block = match Self::decode_block(raw) {
            Ok(b) => b,
            Err(e) => return Ok(ImportResult::invalid(None, None, e.to_string())),
        };
        self.import_decoded(block)
    }

    /// Imports an already-decoded [`Block`], running the full
    /// decode-adjacent pipeline: duplicate check, chainId check,
    /// genesis/linkage, header sanity, persistence, tx indexing, and fork
    /// choice.
    pub fn import_decoded(&self, block: Block) -> Result<ImportResult, ImportError> {
        let header = &block.header;
        let hash = match header.header_hash() {
            Ok(h) => h,
            Err(e) => return Ok(ImportResult::invalid(Some(header.height), None, e.to_string())),
        };

        if self.store.get_header(&hash)?.is_some() {
            let head_changed = self.consider(header.height, hash);
            self.maybe_update_canonical_head()?;
            return Ok(ImportResult::duplicate(header.height, hash, head_changed, "duplicate"));
        }

        if header.chain_id != self.chain_id {
            return Ok(ImportResult::invalid(
                None,
                None,
                format!("chainId mismatch: got {}, expected {}", header.chain_id, self.chain_id),
            ));
        }

        if header.height == 0 {
            if self.store.canonical_head()?.is_some() {
                return Ok(ImportResult::duplicate(0, hash, false, "genesis already exists"));
            }
            self.store.put_header_and_block(hash, &block)?;
            self.store.set_canonical_head(0, hash)?;
            let mut fc = self.lock_fork_choice();
            fc.reset();
            fc.consider(HeadCandidate::new(0, hash));
            drop(fc);
            self.index_txs(&block, 0)?;
            return Ok(ImportResult::accepted(0, hash, true));
        }

        let parent = self.store.get_header(&header.parent_hash)?;
        let parent = match parent {
            Some(p) => p,
            None => return Ok(ImportResult::orphan(header.height, hash, "missing parent")),
        };
        if header.height != parent.height + 1 {
            return Ok(ImportResult::invalid(
                Some(header.height),
                Some(hash),
                format!("height continuity failed: got {}, parent at {}", header.height, parent.height),
            ));
        }
        self.store.put_header_and_block(hash, &block)?;
        self.index_txs(&block, header.height)?;

        let head_changed = self.consider(header.height, hash);
        self.maybe_update_canonical_head()?;
        Ok(ImportResult::accepted(header.height, hash, head_changed))
    }

    fn index_txs(&self, block: &Block, height: u64) -> Result<(), ImportError> {
        for (index, tx) in block.txs.iter().enumerate() {
            if let Ok(txid) = tx.txid() {
                self.store.index_tx(txid, height, index as u32)?;
            }
        }
        Ok(())
    }

    fn consider(&self, height: u64, hash: [u8; 32]) -> bool {
        self.lock_fork_choice().consider(HeadCandidate::new(height, hash))
    }

    fn maybe_update_canonical_head(&self) -> Result<(), ImportError> {
        let best = self.lock_fork_choice().best();
        let best = match best {
            Some(b) => b,
            None => return Ok(()),
        };
        let current = self.store.canonical_head()?;
        if current != Some((best.height, best.hash)) {
            self.store.set_canonical_head(best.height, best.hash)?;
        }
        Ok(())
    }

    fn lock_fork_choice(&self) -> std::sync::MutexGuard<'_, ForkChoice> {
        self.fork_choice.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
