//! # Replication Error Types
//!
//! The engine core itself never propagates errors: contract
//! violations abort, invalid indices are skipped. What can fail is
//! the startup configuration.

use thiserror::Error;

/// Errors loading or validating the replication configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML for the expected schema.
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of its accepted range.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// The offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}
