use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::cli::Cli;
use crate::policy::MinDelta;
use crate::scan::filter::ScanFilter;

/// Interval the latest userscript settled on.
pub const DEFAULT_MIN_DELTA: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid minimum interval '{value}': {source}")]
    InvalidMinDelta {
        value: String,
        source: humantime::DurationError,
    },
}

/// On-disk shape of config.toml. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    min_delta: Option<String>,
    db_path: Option<PathBuf>,
    filter: ScanFilter,
}

pub struct Config {
    pub min_delta: MinDelta,
    pub db_path: Option<PathBuf>,
    pub filter: ScanFilter,
    pub json_output: bool,
    pub verbose: bool,
}

/// Default config file location (~/.config/galdiff/config.toml or platform equivalent)
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "galdiff")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn parse_min_delta(value: &str) -> Result<MinDelta, ConfigError> {
    humantime::parse_duration(value.trim())
        .map(MinDelta::from_duration)
        .map_err(|source| ConfigError::InvalidMinDelta {
            value: value.to_string(),
            source,
        })
}

impl Config {
    /// Merge config.toml (explicit path, else the default location if it
    /// exists) with command line overrides.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => load_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => load_file(&path)?,
                _ => FileConfig::default(),
            },
        };

        let min_delta = match cli.min_delta.as_deref().or(file.min_delta.as_deref()) {
            Some(value) => parse_min_delta(value)?,
            None => MinDelta::from_duration(DEFAULT_MIN_DELTA),
        };

        Ok(Config {
            min_delta,
            db_path: cli.db.clone().or(file.db_path),
            filter: file.filter,
            json_output: cli.json,
            verbose: cli.verbose,
        })
    }
}

fn load_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse_file(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_file(text: &str) -> Result<FileConfig, toml::de::Error> {
    toml::from_str(text)
}
