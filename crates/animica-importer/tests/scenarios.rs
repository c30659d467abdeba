//! End-to-end block-import scenarios: genesis import and duplicate
//! re-import, orphan linkage, and fork-choice tie-break at equal height.

use animica_importer::{better, BlockImporter, HeadCandidate, ImportCode, MemoryBlockStore};
use animica_types::{Block, Header};

const CHAIN_ID: u64 = 1337;

#[allow(clippy::too_many_arguments)]
fn header(height: u64, parent_hash: [u8; 32], timestamp: u64) -> Header {
    Header::new(
        CHAIN_ID,
        height,
        parent_hash,
        timestamp,
        [0u8; 32],
        [0u8; 32],
        [0u8; 32],
        [0u8; 32],
        [0u8; 32],
        0,
        Vec::new(),
        Vec::new(),
    )
    .expect("sample header within bounds")
}

fn block(height: u64, parent_hash: [u8; 32], timestamp: u64) -> Block {
    Block::new(header(height, parent_hash, timestamp), Vec::new(), None, None)
}

/// (S3) Genesis import accepts and sets the head; re-importing the same
/// bytes reports DUPLICATE with no head change.
#[test]
fn genesis_import_then_duplicate_reimport() {
    let importer = BlockImporter::new(CHAIN_ID, MemoryBlockStore::new());
    let genesis = block(0, [0u8; 32], 0);
    let genesis_hash = genesis.header.header_hash().expect("genesis hash");

    let first = importer.import_decoded(genesis.clone()).expect("import succeeds");
    assert_eq!(first.code, ImportCode::Accepted);
    assert_eq!(first.hash, Some(genesis_hash));
    assert!(first.head_changed);
    assert_eq!(importer.head().expect("head lookup"), Some((0, genesis_hash)));

    let second = importer.import_decoded(genesis).expect("import succeeds");
    assert_eq!(second.code, ImportCode::Duplicate);
    assert!(!second.head_changed);
    assert_eq!(importer.head().expect("head lookup"), Some((0, genesis_hash)));
}

/// (S4) A height=1 block with the wrong parent hash is reported ORPHAN.
/// After genesis lands, re-importing the same block with the correct
/// parent hash is ACCEPTED and moves the head.
#[test]
fn orphan_then_genesis_then_correctly_linked_child() {
    let importer = BlockImporter::new(CHAIN_ID, MemoryBlockStore::new());

    let wrong_parent = [0xaau8; 32];
    let dangling = block(1, wrong_parent, 1);
    let orphan_result = importer.import_decoded(dangling).expect("import succeeds");
    assert_eq!(orphan_result.code, ImportCode::Orphan);
    assert_eq!(importer.head().expect("head lookup"), None);

    let genesis = block(0, [0u8; 32], 0);
    let genesis_hash = genesis.header.header_hash().expect("genesis hash");
    let genesis_result = importer.import_decoded(genesis).expect("import succeeds");
    assert_eq!(genesis_result.code, ImportCode::Accepted);

    let child = block(1, genesis_hash, 1);
    let child_hash = child.header.header_hash().expect("child hash");
    let child_result = importer.import_decoded(child).expect("import succeeds");
    assert_eq!(child_result.code, ImportCode::Accepted);
    assert!(child_result.head_changed);
    assert_eq!(importer.head().expect("head lookup"), Some((1, child_hash)));
}

/// (S5) Two competing headers at the same height both feed fork choice;
/// the one with the larger big-endian hash value wins.
#[test]
fn fork_choice_tie_break_prefers_larger_hash_at_equal_height() {
    let importer = BlockImporter::new(CHAIN_ID, MemoryBlockStore::new());
    let genesis = block(0, [0u8; 32], 0);
    let genesis_hash = genesis.header.header_hash().expect("genesis hash");
    importer.import_decoded(genesis).expect("genesis import succeeds");

    let left = block(1, genesis_hash, 10);
    let right = block(1, genesis_hash, 20);
    let left_hash = left.header.header_hash().expect("left hash");
    let right_hash = right.header.header_hash().expect("right hash");
    assert_ne!(left_hash, right_hash, "timestamps must diverge the header hash");

    importer.import_decoded(left).expect("import succeeds");
    importer.import_decoded(right).expect("import succeeds");

    let winner = if better(&HeadCandidate::new(1, right_hash), &HeadCandidate::new(1, left_hash)) {
        right_hash
    } else {
        left_hash
    };
    assert_eq!(importer.head().expect("head lookup"), Some((1, winner)));
}
