//! Configuration system for ACBP.
//!
//! Load engine configuration from TOML or YAML to control the enumeration
//! guardrail, bit reduction and parallelism without code changes, and parse
//! model documents into [`ModelDeclaration`] trees.
//!
//! # Examples
//!
//! Load configuration from a TOML string:
//!
//! ```
//! use acbp_config::{BitReduction, EngineConfig, EnumerationThreads};
//!
//! let config = EngineConfig::from_toml_str(r#"
//!     enumeration_limit_bits = 16
//!     bit_reduction = "off"
//!     enumeration_threads = "auto"
//! "#).unwrap();
//!
//! assert_eq!(config.enumeration_limit_bits, 16);
//! assert_eq!(config.bit_reduction, BitReduction::Off);
//! assert_eq!(config.enumeration_threads, EnumerationThreads::Auto);
//! ```
//!
//! Use the defaults when the file is missing:
//!
//! ```
//! use acbp_config::EngineConfig;
//!
//! let config = EngineConfig::load("acbp.toml").unwrap_or_default();
//! assert_eq!(config.enumeration_limit_bits, 22);
//! ```

mod model_source;

#[cfg(test)]
mod tests;

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use acbp_core::ModelDeclaration;
pub use model_source::{ModelFormat, ModelSource};

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Largest effective bit width the enumerator accepts.
    #[serde(default = "default_enumeration_limit_bits")]
    pub enumeration_limit_bits: u32,

    /// Largest category space scanned exactly when estimating `n_eff`.
    #[serde(default = "default_category_scan_limit")]
    pub category_scan_limit: u64,

    /// Whether proven bit reductions shrink the enumerated mask space.
    #[serde(default)]
    pub bit_reduction: BitReduction,

    /// Worker threads for decision-space enumeration.
    #[serde(default)]
    pub enumeration_threads: EnumerationThreads,

    /// Invalid records kept by the observation audit.
    #[serde(default = "default_audit_sample_size")]
    pub audit_sample_size: usize,
}

fn default_enumeration_limit_bits() -> u32 {
    22
}

fn default_category_scan_limit() -> u64 {
    1_000_000
}

fn default_audit_sample_size() -> usize {
    10
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enumeration_limit_bits: default_enumeration_limit_bits(),
            category_scan_limit: default_category_scan_limit(),
            bit_reduction: BitReduction::default(),
            enumeration_threads: EnumerationThreads::default(),
            audit_sample_size: default_audit_sample_size(),
        }
    }
}

impl EngineConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist, contains invalid TOML, or fails
    /// validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()
    }

    /// Sets the guardrail limit.
    pub fn with_enumeration_limit_bits(mut self, bits: u32) -> Self {
        self.enumeration_limit_bits = bits;
        self
    }

    /// Sets the exact-scan limit for category counting.
    pub fn with_category_scan_limit(mut self, limit: u64) -> Self {
        self.category_scan_limit = limit;
        self
    }

    pub fn with_bit_reduction(mut self, mode: BitReduction) -> Self {
        self.bit_reduction = mode;
        self
    }

    pub fn with_enumeration_threads(mut self, threads: EnumerationThreads) -> Self {
        self.enumeration_threads = threads;
        self
    }

    pub fn with_audit_sample_size(mut self, size: usize) -> Self {
        self.audit_sample_size = size;
        self
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.enumeration_limit_bits > acbp_core::MAX_WIDTH {
            return Err(ConfigError::Invalid(format!(
                "enumeration_limit_bits {} exceeds the {}-bit mask",
                self.enumeration_limit_bits,
                acbp_core::MAX_WIDTH
            )));
        }
        if self.enumeration_threads == EnumerationThreads::Count(0) {
            return Err(ConfigError::Invalid(
                "enumeration_threads count must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Bit reduction mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BitReduction {
    /// Apply reductions proven from the rule set.
    #[default]
    Proven,

    /// Enumerate the full declared width.
    Off,
}

/// Enumeration thread count configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumerationThreads {
    /// Use the global rayon pool.
    Auto,

    /// Serial enumeration.
    #[default]
    None,

    /// Dedicated pool with a specific number of threads.
    Count(usize),
}

impl EnumerationThreads {
    /// Returns true when enumeration should be sharded.
    pub fn is_parallel(&self) -> bool {
        !matches!(self, EnumerationThreads::None | EnumerationThreads::Count(1))
    }
}
