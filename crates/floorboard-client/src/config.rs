//! Client configuration
//!
//! Defaults match the stock resident app. A TOML file may override any
//! subset of fields:
//!
//! ```toml
//! scroll_threshold = 32.0
//! subscription_buffer = 8
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tunables for the client layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Distance from the bottom, in display units, still counted as "at the newest message"
    pub scroll_threshold: f64,
    /// Bounded capacity of each live subscription's channel
    pub subscription_buffer: usize,
    /// Soft cap shown in the composer's character counter
    pub message_soft_cap: usize,
    /// Length after which the counter is highlighted
    pub message_warn_len: usize,
    pub username_min_len: usize,
    pub username_max_len: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            scroll_threshold: 20.0,
            subscription_buffer: 16,
            message_soft_cap: 1000,
            message_warn_len: 500,
            username_min_len: 3,
            username_max_len: 20,
        }
    }
}

impl ClientConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.scroll_threshold.is_finite() || self.scroll_threshold < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "scroll_threshold must be a non-negative number, got {}",
                self.scroll_threshold
            )));
        }
        if self.subscription_buffer == 0 {
            return Err(ConfigError::Invalid("subscription_buffer must be at least 1".to_string()));
        }
        if self.message_warn_len > self.message_soft_cap {
            return Err(ConfigError::Invalid(
                "message_warn_len must not exceed message_soft_cap".to_string(),
            ));
        }
        if self.username_min_len == 0 || self.username_min_len > self.username_max_len {
            return Err(ConfigError::Invalid(format!(
                "username length bounds {}..={} are invalid",
                self.username_min_len, self.username_max_len
            )));
        }
        Ok(())
    }
}

/// Builder for [`ClientConfig`]
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scroll_threshold(mut self, threshold: f64) -> Self {
        self.config.scroll_threshold = threshold;
        self
    }

    pub fn subscription_buffer(mut self, capacity: usize) -> Self {
        self.config.subscription_buffer = capacity;
        self
    }

    /// Set the counter's soft cap and warning length together
    pub fn message_limits(mut self, warn_len: usize, soft_cap: usize) -> Self {
        self.config.message_warn_len = warn_len;
        self.config.message_soft_cap = soft_cap;
        self
    }

    pub fn username_bounds(mut self, min: usize, max: usize) -> Self {
        self.config.username_min_len = min;
        self.config.username_max_len = max;
        self
    }

    /// Validate and return the configuration
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
