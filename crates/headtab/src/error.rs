//! Error types
//!
//! Runtime engine operations never fail: a missing precondition is logged
//! and skipped. Only loading and validating configuration can fail.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse container config")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize container config")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;
