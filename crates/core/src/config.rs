//! LeaseSet timing and size parameters

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;

/// Upper bound on leases in one LeaseSet (the count byte allows more, the network does not)
pub const MAX_NUM_LEASES: usize = 16;

/// LeaseSet configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseSetConfig {
    /// Lifetime of an inbound tunnel, in seconds
    #[serde(default = "default_expiration_timeout")]
    pub tunnel_expiration_timeout_secs: u64,

    /// How long before tunnel expiry a lease stops being advertised, in seconds
    #[serde(default = "default_expiration_threshold")]
    pub tunnel_expiration_threshold_secs: u64,

    /// Inbound tunnels advertised in a locally built LeaseSet
    #[serde(default = "default_max_leases")]
    pub max_leases: usize,

    /// Largest encoded LeaseSet we will build
    #[serde(default = "default_max_buffer_size")]
    pub max_buffer_size: usize,

    /// Random milliseconds added to each lease end date
    #[serde(default = "default_max_jitter_ms")]
    pub max_jitter_ms: u64,
}

fn default_expiration_timeout() -> u64 {
    660
}

fn default_expiration_threshold() -> u64 {
    60
}

fn default_max_leases() -> usize {
    5
}

fn default_max_buffer_size() -> usize {
    3072
}

fn default_max_jitter_ms() -> u64 {
    5
}

impl Default for LeaseSetConfig {
    fn default() -> Self {
        Self {
            tunnel_expiration_timeout_secs: default_expiration_timeout(),
            tunnel_expiration_threshold_secs: default_expiration_threshold(),
            max_leases: default_max_leases(),
            max_buffer_size: default_max_buffer_size(),
            max_jitter_ms: default_max_jitter_ms(),
        }
    }
}

impl LeaseSetConfig {
    /// Parse a JSON config, filling missing fields with defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file, or use defaults when the file doesn't exist
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json(&content)?;
        info!("Loaded LeaseSet config from {:?}", path);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_leases == 0 || self.max_leases > MAX_NUM_LEASES {
            return Err(ConfigError::Invalid(format!(
                "max_leases must be between 1 and {}, got {}",
                MAX_NUM_LEASES, self.max_leases
            )));
        }
        if self.tunnel_expiration_threshold_secs >= self.tunnel_expiration_timeout_secs {
            return Err(ConfigError::Invalid(format!(
                "expiration threshold {}s must be below the tunnel lifetime {}s",
                self.tunnel_expiration_threshold_secs, self.tunnel_expiration_timeout_secs
            )));
        }
        Ok(())
    }

    pub fn expiration_threshold_ms(&self) -> u64 {
        self.tunnel_expiration_threshold_secs.saturating_mul(1000)
    }

    /// End date (ms) for a lease on a tunnel created at `creation_time_secs`, before jitter
    pub fn lease_end_date_ms(&self, creation_time_secs: u64) -> u64 {
        creation_time_secs
            .saturating_add(self.tunnel_expiration_timeout_secs)
            .saturating_sub(self.tunnel_expiration_threshold_secs)
            .saturating_mul(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LeaseSetConfig::default();
        assert_eq!(config.tunnel_expiration_timeout_secs, 660);
        assert_eq!(config.tunnel_expiration_threshold_secs, 60);
        assert_eq!(config.max_leases, 5);
        assert_eq!(config.max_buffer_size, 3072);
        assert_eq!(config.max_jitter_ms, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = LeaseSetConfig::from_json(r#"{"max_leases": 3}"#).unwrap();
        assert_eq!(config.max_leases, 3);
        assert_eq!(config.tunnel_expiration_timeout_secs, 660);
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(LeaseSetConfig::from_json("{}").unwrap(), LeaseSetConfig::default());
    }

    #[test]
    fn test_rejects_too_many_leases() {
        let err = LeaseSetConfig::from_json(r#"{"max_leases": 17}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_threshold_beyond_lifetime() {
        let err = LeaseSetConfig::from_json(
            r#"{"tunnel_expiration_timeout_secs": 60, "tunnel_expiration_threshold_secs": 60}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = LeaseSetConfig::from_json("{max_leases:").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_lease_end_date() {
        let config = LeaseSetConfig::default();
        assert_eq!(config.lease_end_date_ms(1_000), (1_000 + 660 - 60) * 1000);
        assert_eq!(config.expiration_threshold_ms(), 60_000);
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let path = std::env::temp_dir().join("gatecraft-missing-config-4b1d.json");
        let config = LeaseSetConfig::load_from(&path).unwrap();
        assert_eq!(config, LeaseSetConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!(
            "gatecraft-config-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, r#"{"max_jitter_ms": 0}"#).unwrap();
        let config = LeaseSetConfig::load_from(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config.max_jitter_ms, 0);
    }
}
