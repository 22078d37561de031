use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io { source: io::Error, path: PathBuf },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        source: toml::de::Error,
        path: PathBuf,
    },
    #[error("invalid value in config {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
    #[error("invalid channel target {input:?}: {reason}")]
    Target { input: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
