//! The content-addressed block store: `header_by_hash`, `block_by_hash`,
//! `head`, and a `txid -> (height, index)` index. None of this is part of
//! consensus; any backend is valid so long as it preserves atomicity and
//! single-writer discipline (§5).

use crate::error::ImportError;
use animica_types::{Block, Header, TypesDecodeError};
use redb::{Database, ReadableTable, TableDefinition};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const HEADERS: TableDefinition<&[u8; 32], &[u8]> = TableDefinition::new("HEADERS");
const BLOCKS: TableDefinition<&[u8; 32], &[u8]> = TableDefinition::new("BLOCKS");
const HEAD: TableDefinition<&[u8; 1], &[u8; 40]> = TableDefinition::new("HEAD");
const TX_INDEX: TableDefinition<&[u8; 32], &[u8; 12]> = TableDefinition::new("TX_INDEX");

const HEAD_KEY: [u8; 1] = *b"H";

fn backend_err(e: impl std::fmt::Display) -> ImportError {
    ImportError::Store(e.to_string())
}

fn decode_header(bytes: &[u8]) -> Result<Header, ImportError> {
    let v = animica_codec::decode(bytes).map_err(|e| ImportError::Decode(TypesDecodeError::from(e)))?;
    Ok(Header::from_value(&v)?)
}

fn encode_header(header: &Header) -> Result<Vec<u8>, ImportError> {
    animica_codec::encode(&header.to_value()).map_err(|_| ImportError::NotEncodable("header"))
}

/// The persistence surface the importer needs: look up headers by hash,
/// persist a header+block pair, and read/update the canonical head and
/// transaction index.
pub trait BlockStore {
    /// Looks up a previously-persisted header by its `HeaderHash`.
    fn get_header(&self, hash: &[u8; 32]) -> Result<Option<Header>, ImportError>;

    /// Persists `header` and `block` together, keyed by `hash`. Only
    /// called by the importer after confirming the hash is new.
    fn put_header_and_block(&self, hash: [u8; 32], block: &Block) -> Result<(), ImportError>;

    /// The current canonical head, or `None` before genesis.
    fn canonical_head(&self) -> Result<Option<(u64, [u8; 32])>, ImportError>;

    /// Atomically updates the canonical head.
    fn set_canonical_head(&self, height: u64, hash: [u8; 32]) -> Result<(), ImportError>;

    /// Records `txid -> (height, index)` in the transaction index.
    fn index_tx(&self, txid: [u8; 32], height: u64, index: u32) -> Result<(), ImportError>;

    /// Looks up a transaction's `(height, index)` by its `TxID`.
    fn lookup_tx(&self, txid: &[u8; 32]) -> Result<Option<(u64, u32)>, ImportError>;
}

/// A `redb`-backed [`BlockStore`]: a single embedded database file holding
/// headers, blocks, the head pointer, and the tx index.
pub struct RedbBlockStore {
    db: Database,
}

impl RedbBlockStore {
    /// Opens (creating if absent) a `redb` database at `path` and ensures
    /// all tables exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ImportError> {
        let db = Database::create(path).map_err(backend_err)?;
        let w = db.begin_write().map_err(backend_err)?;
        {
            w.open_table(HEADERS).map_err(backend_err)?;
            w.open_table(BLOCKS).map_err(backend_err)?;
            w.open_table(HEAD).map_err(backend_err)?;
            w.open_table(TX_INDEX).map_err(backend_err)?;
        }
        w.commit().map_err(backend_err)?;
        Ok(RedbBlockStore { db })
    }
}

impl BlockStore for RedbBlockStore {
    fn get_header(&self, hash: &[u8; 32]) -> Result<Option<Header>, ImportError> {
        let r = self.db.begin_read().map_err(backend_err)?;
        let t = r.open_table(HEADERS).map_err(backend_err)?;
        match t.get(hash).map_err(backend_err)? {
            Some(bytes) => Ok(Some(decode_header(bytes.value())?)),
            None => Ok(None),
        }
    }

    fn put_header_and_block(&self, hash: [u8; 32], block: &Block) -> Result<(), ImportError> {
        let header_bytes = encode_header(&block.header)?;
        let block_bytes = block.to_cbor().map_err(|_| ImportError::NotEncodable("block"))?;

        let w = self.db.begin_write().map_err(backend_err)?;
        {
            let mut headers = w.open_table(HEADERS).map_err(backend_err)?;
            headers.insert(&hash, header_bytes.as_slice()).map_err(backend_err)?;
            let mut blocks = w.open_table(BLOCKS).map_err(backend_err)?;
            blocks.insert(&hash, block_bytes.as_slice()).map_err(backend_err)?;
        }
        w.commit().map_err(backend_err)
    }

    fn canonical_head(&self) -> Result<Option<(u64, [u8; 32])>, ImportError> {
        let r = self.db.begin_read().map_err(backend_err)?;
        let t = r.open_table(HEAD).map_err(backend_err)?;
        match t.get(&HEAD_KEY).map_err(backend_err)? {
            Some(v) => {
                let bytes = v.value();
                let mut height_buf = [0u8; 8];
                height_buf.copy_from_slice(&bytes[0..8]);
                let mut hash = [0u8; 32];
                hash.copy_from_slice(&bytes[8..40]);
                Ok(Some((u64::from_be_bytes(height_buf), hash)))
            }
            None => Ok(None),
        }
    }

    fn set_canonical_head(&self, height: u64, hash: [u8; 32]) -> Result<(), ImportError> {
        let mut buf = [0u8; 40];
        buf[0..8].copy_from_slice(&height.to_be_bytes());
        buf[8..40].copy_from_slice(&hash);
        let w = self.db.begin_write().map_err(backend_err)?;
        {
            let mut t = w.open_table(HEAD).map_err(backend_err)?;
            t.insert(&HEAD_KEY, &buf).map_err(backend_err)?;
        }
        w.commit().map_err(backend_err)
    }

    fn index_tx(&self, txid: [u8; 32], height: u64, index: u32) -> Result<(), ImportError> {
        let mut buf = [0u8; 12];
        buf[0..8].copy_from_slice(&height.to_be_bytes());
        buf[8..12].copy_from_slice(&index.to_be_bytes());
        let w = self.db.begin_write().map_err(backend_err)?;
        {
            let mut t = w.open_table(TX_INDEX).map_err(backend_err)?;
            t.insert(&txid, &buf).map_err(backend_err)?;
        }
        w.commit().map_err(backend_err)
    }

    fn lookup_tx(&self, txid: &[u8; 32]) -> Result<Option<(u64, u32)>, ImportError> {
        let r = self.db.begin_read().map_err(backend_err)?;
        let t = r.open_table(TX_INDEX).map_err(backend_err)?;
        match t.get(txid).map_err(backend_err)? {
            Some(v) => {
                let bytes = v.value();
                let mut height_buf = [0u8; 8];
                height_buf.copy_from_slice(&bytes[0..8]);
                let mut index_buf = [0u8; 4];
                index_buf.copy_from_slice(&bytes[8..12]);
                Ok(Some((u64::from_be_bytes(height_buf), u32::from_be_bytes(index_buf))))
            }
            None => Ok(None),
        }
    }
}

fn lock<'a, T>(m: &'a Mutex<T>) -> MutexGuard<'a, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// An in-memory [`BlockStore`], for tests and for ephemeral/devnet use
/// where persistence across restarts is not required.
#[derive(Default)]
pub struct MemoryBlockStore {
    headers: Mutex<BTreeMap<[u8; 32], Header>>,
    blocks: Mutex<BTreeMap<[u8; 32], Block>>,
    head: Mutex<Option<(u64, [u8; 32])>>,
    tx_index: Mutex<BTreeMap<[u8; 32], (u64, u32)>>,
}

impl MemoryBlockStore {
    /// Opens an empty store.
    pub fn new() -> Self {
        MemoryBlockStore::default()
    }
}

impl BlockStore for MemoryBlockStore {
    fn get_header(&self, hash: &[u8; 32]) -> Result<Option<Header>, ImportError> {
        Ok(lock(&self.headers).get(hash).cloned())
    }

    fn put_header_and_block(&self, hash: [u8; 32], block: &Block) -> Result<(), ImportError> {
        lock(&self.headers).insert(hash, block.header.clone());
        lock(&self.blocks).insert(hash, block.clone());
        Ok(())
    }

    fn canonical_head(&self) -> Result<Option<(u64, [u8; 32])>, ImportError> {
        Ok(*lock(&self.head))
    }

    fn set_canonical_head(&self, height: u64, hash: [u8; 32]) -> Result<(), ImportError> {
        *lock(&self.head) = Some((height, hash));
        Ok(())
    }

    fn index_tx(&self, txid: [u8; 32], height: u64, index: u32) -> Result<(), ImportError> {
        lock(&self.tx_index).insert(txid, (height, index));
        Ok(())
    }

    fn lookup_tx(&self, txid: &[u8; 32]) -> Result<Option<(u64, u32)>, ImportError> {
        Ok(lock(&self.tx_index).get(txid).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use animica_types::Header;

    fn sample_header(height: u64, parent: [u8; 32]) -> Header {
        Header::new(1337, height, parent, 0, [0u8; 32], [0u8; 32], [0u8; 32], [0u8; 32], [0u8; 32], 0, Vec::new(), Vec::new()).unwrap()
    }

    #[test]
    fn memory_store_round_trips_header_and_head() {
        let store = MemoryBlockStore::new();
        let header = sample_header(0, [0u8; 32]);
        let block = Block::new(header.clone(), Vec::new(), None, None);
        let hash = [7u8; 32];
        store.put_header_and_block(hash, &block).unwrap();
        assert_eq!(store.get_header(&hash).unwrap(), Some(header));
        assert_eq!(store.canonical_head().unwrap(), None);
        store.set_canonical_head(0, hash).unwrap();
        assert_eq!(store.canonical_head().unwrap(), Some((0, hash)));
    }

    #[test]
    fn memory_store_tx_index_round_trips() {
        let store = MemoryBlockStore::new();
        let txid = [9u8; 32];
        assert_eq!(store.lookup_tx(&txid).unwrap(), None);
        store.index_tx(txid, 3, 1).unwrap();
        assert_eq!(store.lookup_tx(&txid).unwrap(), Some((3, 1)));
    }

    #[test]
    fn redb_store_round_trips_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blocks.redb");
        let header = sample_header(0, [0u8; 32]);
        let block = Block::new(header.clone(), Vec::new(), None, None);
        let hash = [3u8; 32];
        {
            let store = RedbBlockStore::open(&path).unwrap();
            store.put_header_and_block(hash, &block).unwrap();
            store.set_canonical_head(0, hash).unwrap();
        }
        let store = RedbBlockStore::open(&path).unwrap();
        assert_eq!(store.get_header(&hash).unwrap(), Some(header));
        assert_eq!(store.canonical_head().unwrap(), Some((0, hash)));
    }
}
