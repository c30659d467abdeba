//! The Animica node binary: boots structured logging, resolves
//! configuration, and offers a block-import CLI against a `redb`-backed
//! block store.

mod config;

use animica_importer::{BlockImporter, ImportCode, RedbBlockStore};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::ConfigOverrides;
use std::path::PathBuf;

/// Animica node: block import and chain state inspection.
#[derive(Parser, Debug)]
#[command(name = "animica-node", about = "Animica node")]
struct Cli {
    /// Overrides the chain ID this node imports blocks for.
    #[arg(long, global = true)]
    chain_id: Option<u64>,
    /// Overrides the data directory holding this node's block store.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Path to a TOML config file, read before env vars and defaults apply.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Imports every `.cbor` file in a directory, in filename order.
    Import {
        /// Directory containing canonical-CBOR block files.
        block_dir: PathBuf,
    },
    /// Prints the current canonical head, if any.
    Head,
}

fn main() -> Result<()> {
    animica_telemetry::init_tracing()?;

    let cli = Cli::parse();
    let cfg = config::load(ConfigOverrides { chain_id: cli.chain_id, data_dir: cli.data_dir, config_file: cli.config })
        .context("loading node configuration")?;

    tracing::info!(chain_id = cfg.chain_id, data_dir = %cfg.data_dir.display(), "starting animica-node");
    std::fs::create_dir_all(&cfg.data_dir).context("creating data directory")?;

    let store = RedbBlockStore::open(cfg.db_path()).context("opening block store")?;
    let importer = BlockImporter::new(cfg.chain_id, store);

    match cli.command {
        Command::Import { block_dir } => run_import(&importer, &block_dir),
        Command::Head => {
            print_head(&importer)?;
            Ok(())
        }
    }
}

fn run_import(importer: &BlockImporter<RedbBlockStore>, block_dir: &std::path::Path) -> Result<()> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(block_dir)
        .with_context(|| format!("reading block directory {}", block_dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "cbor"))
        .collect();
    entries.sort();

    for path in entries {
        let raw = std::fs::read(&path).with_context(|| format!("reading block file {}", path.display()))?;
        let result = importer.import_block(&raw).with_context(|| format!("importing block file {}", path.display()))?;
        match result.code {
            ImportCode::Accepted => tracing::info!(file = %path.display(), height = ?result.height, hash = ?result.hash, "block accepted"),
            ImportCode::Duplicate => tracing::warn!(file = %path.display(), "block already present"),
            ImportCode::Orphan => tracing::warn!(file = %path.display(), reason = ?result.reason, "block orphaned, missing parent"),
            ImportCode::Invalid => tracing::error!(file = %path.display(), reason = ?result.reason, "block rejected"),
        }
    }
    print_head(importer)
}

fn print_head(importer: &BlockImporter<RedbBlockStore>) -> Result<()> {
    match importer.head().context("reading canonical head")? {
        Some((height, hash)) => println!("head: height={height} hash={}", hex::encode(hash)),
        None => println!("head: none (no blocks imported yet)"),
    }
    Ok(())
}
