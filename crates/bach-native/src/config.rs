//! Runtime configuration

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::MAX_CONTEXT_DEPTH;
use crate::gas::{cost, GasConfig};

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// JSON could not be parsed
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Gas ratio negative or not finite
    #[error("invalid gas ratio: {0}")]
    InvalidGasRatio(f64),

    /// Call depth bound of zero
    #[error("max call depth must be at least 1")]
    InvalidCallDepth,
}

/// Native runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeConfig {
    /// Gas pre-charged by every dispatch and the floor of every method cost
    #[serde(default = "default_basic_gas")]
    pub basic_gas: u64,
    /// Multiplier applied to a method's raw gas
    #[serde(default = "default_gas_ratio")]
    pub gas_ratio: f64,
    /// Maximum depth of the call context stack
    #[serde(default = "default_max_call_depth")]
    pub max_call_depth: usize,
    /// Storage cost table
    #[serde(default)]
    pub storage: GasConfig,
}

fn default_basic_gas() -> u64 {
    cost::BASIC_GAS
}

fn default_gas_ratio() -> f64 {
    cost::GAS_RATIO
}

fn default_max_call_depth() -> usize {
    MAX_CONTEXT_DEPTH
}

impl Default for NativeConfig {
    fn default() -> Self {
        Self {
            basic_gas: default_basic_gas(),
            gas_ratio: default_gas_ratio(),
            max_call_depth: default_max_call_depth(),
            storage: GasConfig::default(),
        }
    }
}

impl NativeConfig {
    /// Parse and validate a JSON config; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: NativeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.gas_ratio.is_finite() || self.gas_ratio < 0.0 {
            return Err(ConfigError::InvalidGasRatio(self.gas_ratio));
        }
        if self.max_call_depth == 0 {
            return Err(ConfigError::InvalidCallDepth);
        }
        Ok(())
    }

    /// Final gas of a method: `basic_gas + raw_gas * gas_ratio`, truncated
    pub fn method_gas(&self, raw_gas: u64) -> u64 {
        (self.basic_gas as f64 + raw_gas as f64 * self.gas_ratio) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NativeConfig::default();
        assert_eq!(config.basic_gas, 21000);
        assert_eq!(config.gas_ratio, 1.0);
        assert_eq!(config.max_call_depth, 128);
        assert_eq!(config.storage, GasConfig::default());
    }

    #[test]
    fn test_method_gas() {
        let config = NativeConfig::default();
        assert_eq!(config.method_gas(29000), 50000);
        assert_eq!(config.method_gas(0), 21000);

        let halved = NativeConfig {
            gas_ratio: 0.5,
            ..Default::default()
        };
        assert_eq!(halved.method_gas(29001), 21000 + 14500);
    }

    #[test]
    fn test_from_json_defaults() {
        let config = NativeConfig::from_json("{}").unwrap();
        assert_eq!(config, NativeConfig::default());
    }

    #[test]
    fn test_from_json_overrides() {
        let config = NativeConfig::from_json(
            r#"{"basic_gas": 30000, "max_call_depth": 16, "storage": {"read_cost_per_byte": 5}}"#,
        )
        .unwrap();
        assert_eq!(config.basic_gas, 30000);
        assert_eq!(config.gas_ratio, 1.0);
        assert_eq!(config.max_call_depth, 16);
        assert_eq!(config.storage.read_cost_per_byte, 5);
        assert_eq!(config.storage.read_cost_flat, 1000);
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(
            NativeConfig::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            NativeConfig::from_json(r#"{"gas_ratio": -1.0}"#),
            Err(ConfigError::InvalidGasRatio(_))
        ));
        assert!(matches!(
            NativeConfig::from_json(r#"{"max_call_depth": 0}"#),
            Err(ConfigError::InvalidCallDepth)
        ));
    }

    #[test]
    fn test_roundtrip_json() {
        let config = NativeConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(NativeConfig::from_json(&json).unwrap(), config);
    }
}
