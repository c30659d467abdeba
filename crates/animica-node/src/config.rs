//! Layered node configuration: CLI flags override `ANIMICA_*` environment
//! variables, which override a TOML config file, which override built-in
//! defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The chain ID used by the bundled devnet genesis.
pub const DEVNET_CHAIN_ID: u64 = 1337;
/// The default data directory, relative to the current working directory.
pub const DEFAULT_DATA_DIR: &str = "./animica-data";
/// The filename of the block store within the data directory.
pub const DB_FILENAME: &str = "animica.db";

/// Failures while loading or validating node configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read from disk.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// The path that failed to read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The config file's contents were not valid TOML for this schema.
    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        /// The path that failed to parse.
        path: PathBuf,
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
    /// An `ANIMICA_*` environment variable held a value of the wrong shape.
    #[error("invalid value for {var}: {value}")]
    InvalidEnv {
        /// The environment variable name.
        var: &'static str,
        /// The value that failed to parse.
        value: String,
    },
}

impl animica_importer::ErrorCode for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            Self::ReadFile { .. } => "NODE_CONFIG_READ_FAILED",
            Self::ParseFile { .. } => "NODE_CONFIG_PARSE_FAILED",
            Self::InvalidEnv { .. } => "NODE_CONFIG_BAD_ENV",
        }
    }
}

/// The subset of the TOML config file this loader understands. Any field
/// not present falls back to the built-in default.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    chain_id: Option<u64>,
    data_dir: Option<PathBuf>,
}

/// Explicit overrides from CLI flags, applied with the highest precedence.
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    /// Overrides the chain ID.
    pub chain_id: Option<u64>,
    /// Overrides the data directory.
    pub data_dir: Option<PathBuf>,
    /// Overrides the config file path to read before env/defaults apply.
    pub config_file: Option<PathBuf>,
}

/// Resolved node configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// The chain this node imports and validates blocks for.
    pub chain_id: u64,
    /// The directory holding this node's block store and other state.
    pub data_dir: PathBuf,
}

impl Config {
    /// The path to this node's block store file.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILENAME)
    }
}

fn env_u64(var: &'static str) -> Result<Option<u64>, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value }),
        Err(_) => Ok(None),
    }
}

fn load_file(path: &Path) -> Result<FileConfig, ConfigError> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&contents).map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

/// Loads configuration with precedence: `overrides` (CLI flags) > `ANIMICA_*`
/// environment variables > the TOML file at `overrides.config_file` (if
/// any) > built-in defaults.
pub fn load(overrides: ConfigOverrides) -> Result<Config, ConfigError> {
    let file = match &overrides.config_file {
        Some(path) => load_file(path)?,
        None => FileConfig::default(),
    };

    let chain_id = overrides
        .chain_id
        .or(env_u64("ANIMICA_CHAIN_ID")?)
        .or(file.chain_id)
        .unwrap_or(DEVNET_CHAIN_ID);

    let data_dir = overrides
        .data_dir
        .or_else(|| std::env::var("ANIMICA_DATA_DIR").ok().map(PathBuf::from))
        .or(file.data_dir)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

    Ok(Config { chain_id, data_dir })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_with_no_overrides_and_no_env() {
        let cfg = load(ConfigOverrides::default()).unwrap();
        assert_eq!(cfg.chain_id, DEVNET_CHAIN_ID);
        assert_eq!(cfg.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
    }

    #[test]
    fn explicit_overrides_win_over_everything() {
        let overrides = ConfigOverrides {
            chain_id: Some(42),
            data_dir: Some(PathBuf::from("/tmp/explicit")),
            config_file: None,
        };
        let cfg = load(overrides).unwrap();
        assert_eq!(cfg.chain_id, 42);
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/explicit"));
    }

    #[test]
    fn file_values_apply_when_present_and_no_higher_precedence_source_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("animica.toml");
        std::fs::write(&path, "chain_id = 7\ndata_dir = \"/tmp/from-file\"\n").unwrap();

        let overrides = ConfigOverrides { chain_id: None, data_dir: None, config_file: Some(path) };
        let cfg = load(overrides).unwrap();
        assert_eq!(cfg.chain_id, 7);
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/from-file"));
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults_without_erroring() {
        let overrides = ConfigOverrides { chain_id: None, data_dir: None, config_file: Some(PathBuf::from("/nonexistent/animica.toml")) };
        let cfg = load(overrides).unwrap();
        assert_eq!(cfg.chain_id, DEVNET_CHAIN_ID);
    }

    #[test]
    fn db_path_joins_data_dir_and_filename() {
        let cfg = Config { chain_id: 1337, data_dir: PathBuf::from("/tmp/animica") };
        assert_eq!(cfg.db_path(), PathBuf::from("/tmp/animica/animica.db"));
    }
}
