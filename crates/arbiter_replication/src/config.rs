//! # Replication Configuration
//!
//! Tunables of the delta pool engine. Loaded once at startup from a
//! TOML file when one is given; every field has a production default,
//! so a missing or partial file is fine.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Engine tunables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicationConfig {
    /// How many partitions the side array is diffed in. One partition
    /// is compared per tick; higher values spread the cost of huge
    /// maps over more ticks.
    pub side_partitions: u32,

    /// Height drift, in world units, a *moving* plane may accumulate
    /// before a correction is sent. Clients interpolate smaller
    /// differences away on their own.
    pub plane_skip_limit: f64,

    /// Range of a full-volume sound. Quieter sounds reach
    /// proportionally less far; silencing reaches everyone.
    pub sound_max_distance: f64,

    /// Milliseconds for a delta's priority score to double.
    pub age_double_ms: u32,

    /// Doubling period for sound deltas; they must not wait.
    pub sound_age_double_ms: u32,

    /// Default ack threshold in milliseconds. 0 means an unacked
    /// delta is eligible for resend at the very next rating pass; the
    /// transport layer may push RTT-based values per pool.
    pub ack_threshold_ms: u32,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            side_partitions: 2,
            plane_skip_limit: 40.0,
            sound_max_distance: 2025.0,
            age_double_ms: 1000,
            sound_age_double_ms: 1,
            ack_threshold_ms: 0,
        }
    }
}

impl ReplicationConfig {
    /// Loads the configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.side_partitions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "side_partitions",
                reason: "must be at least 1".into(),
            });
        }
        if self.sound_max_distance <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "sound_max_distance",
                reason: "must be positive".into(),
            });
        }
        if self.plane_skip_limit < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "plane_skip_limit",
                reason: "must not be negative".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ReplicationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.side_partitions, 2);
        assert_eq!(config.plane_skip_limit, 40.0);
        assert_eq!(config.ack_threshold_ms, 0);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: ReplicationConfig =
            toml::from_str("side_partitions = 4\nsound_max_distance = 1000.0").unwrap();
        assert_eq!(config.side_partitions, 4);
        assert_eq!(config.sound_max_distance, 1000.0);
        assert_eq!(config.age_double_ms, 1000);
    }

    #[test]
    fn test_validate_rejects_zero_partitions() {
        let config = ReplicationConfig {
            side_partitions: 0,
            ..ReplicationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(crate::error::ConfigError::InvalidValue { field: "side_partitions", .. })
        ));
    }

    #[test]
    fn test_roundtrip() {
        let config = ReplicationConfig::default();
        let text = toml::to_string(&config).unwrap();
        let back: ReplicationConfig = toml::from_str(&text).unwrap();
        assert_eq!(config, back);
    }
}
