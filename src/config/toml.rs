//! TOML configuration file parsing
//!
//! A configuration file holds any subset of the run settings. Sizes and
//! durations may be written either as integers (bytes / seconds) or as strings
//! with units:
//!
//! ```toml
//! path = "/mnt/data/bench.bin"
//! test_type = "RAND_READ"
//! file_size = "2G"
//! block_size = 4096
//! queue_depth = 8
//! duration = "30s"
//! warmup = 3
//! direct = true
//! ```

use super::cli::Cli;
use super::cli_convert::{parse_duration, parse_size};
use super::{
    BenchConfig, TestType, DEFAULT_BLOCK_SIZE, DEFAULT_DURATION_SECS, DEFAULT_FILE_SIZE,
    DEFAULT_QUEUE_DEPTH, DEFAULT_WARMUP_SECS,
};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Numeric setting given either as a plain integer or as a string with units
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum UnitValue {
    Plain(u64),
    Text(String),
}

impl UnitValue {
    fn as_size(&self) -> Result<u64> {
        match self {
            UnitValue::Plain(v) => Ok(*v),
            UnitValue::Text(s) => parse_size(s),
        }
    }

    fn as_seconds(&self) -> Result<u64> {
        match self {
            UnitValue::Plain(v) => Ok(*v),
            UnitValue::Text(s) => parse_duration(s),
        }
    }
}

/// Contents of a TOML configuration file; every setting is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub path: Option<PathBuf>,
    pub test_type: Option<TestType>,
    pub file_size: Option<UnitValue>,
    pub block_size: Option<UnitValue>,
    pub queue_depth: Option<usize>,
    pub duration: Option<UnitValue>,
    pub warmup: Option<UnitValue>,
    pub direct: Option<bool>,
}

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<ConfigFile> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<ConfigFile> {
    let config: ConfigFile = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Build the run configuration: defaults, then the file, then CLI flags
pub fn merge_cli_with_config(cli: &Cli, file: ConfigFile) -> Result<BenchConfig> {
    let path = cli
        .target
        .clone()
        .or(file.path)
        .context("Target path required (positional PATH or `path` in the config file)")?;

    let test_type = cli.test_type.or(file.test_type).unwrap_or(TestType::SeqWrite);

    let file_size = match (&cli.file_size, &file.file_size) {
        (Some(s), _) => parse_size(s).context("Invalid file size")?,
        (None, Some(v)) => v.as_size().context("Invalid file_size in config file")?,
        (None, None) => DEFAULT_FILE_SIZE,
    };

    let block_size = match (&cli.block_size, &file.block_size) {
        (Some(s), _) => parse_size(s).context("Invalid block size")?,
        (None, Some(v)) => v.as_size().context("Invalid block_size in config file")?,
        (None, None) => DEFAULT_BLOCK_SIZE,
    };

    let duration_secs = match (&cli.duration, &file.duration) {
        (Some(s), _) => parse_duration(s).context("Invalid duration")?,
        (None, Some(v)) => v.as_seconds().context("Invalid duration in config file")?,
        (None, None) => DEFAULT_DURATION_SECS,
    };

    let warmup_secs = match (&cli.warmup, &file.warmup) {
        (Some(s), _) => parse_duration(s).context("Invalid warmup")?,
        (None, Some(v)) => v.as_seconds().context("Invalid warmup in config file")?,
        (None, None) => DEFAULT_WARMUP_SECS,
    };

    let queue_depth = cli
        .queue_depth
        .or(file.queue_depth)
        .unwrap_or(DEFAULT_QUEUE_DEPTH);

    // --direct can only switch direct IO on; the file may also enable it
    let direct = cli.direct || file.direct.unwrap_or(false);

    Ok(BenchConfig {
        path,
        test_type,
        file_size,
        block_size,
        queue_depth,
        duration_secs,
        warmup_secs,
        direct,
    })
}

/// Load the optional config file named on the command line and merge the CLI into it
pub fn build_config(cli: &Cli) -> Result<BenchConfig> {
    let file = match &cli.config {
        Some(path) => parse_toml_file(path)?,
        None => ConfigFile::default(),
    };

    merge_cli_with_config(cli, file)
}
