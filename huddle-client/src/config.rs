//! Configuration for Huddle channel handles.
//!
//! Configuration is loaded from a TOML file or built in code:
//!
//! ```toml
//! [cache]
//! message_cache_size = 50
//!
//! [history]
//! max_messages_per_batch = 100
//!
//! [typing]
//! interval_ms = 5000
//! ```
//!
//! Every section and key is optional.

use huddle_types::MAX_MESSAGES_PER_BATCH;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Largest accepted per-channel message cache.
pub const MAX_MESSAGE_CACHE_SIZE: usize = 100_000;

/// Root configuration for a channel handle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Message cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// History paging configuration.
    #[serde(default)]
    pub history: HistoryConfig,
    /// Typing indicator configuration.
    #[serde(default)]
    pub typing: TypingConfig,
}

/// Message cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CacheConfig {
    /// Messages kept per channel (default: 0, caching disabled).
    #[serde(default = "default_message_cache_size")]
    pub message_cache_size: usize,
}

/// History paging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistoryConfig {
    /// Messages requested per remote call (default: 100, also the maximum).
    #[serde(default = "default_max_messages_per_batch")]
    pub max_messages_per_batch: usize,
}

/// Typing indicator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TypingConfig {
    /// Delay between repeated typing indicators in milliseconds (default: 5000).
    #[serde(default = "default_typing_interval_ms")]
    pub interval_ms: u64,
}

// Default value functions
fn default_message_cache_size() -> usize {
    0
}

fn default_max_messages_per_batch() -> usize {
    MAX_MESSAGES_PER_BATCH
}

fn default_typing_interval_ms() -> u64 {
    5000 // 5 seconds
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            message_cache_size: default_message_cache_size(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_messages_per_batch: default_max_messages_per_batch(),
        }
    }
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_typing_interval_ms(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or holds
    /// invalid values.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be parsed or holds invalid values.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: PathBuf::from("<inline>"),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a cache size above
    /// [`MAX_MESSAGE_CACHE_SIZE`], a batch size of zero or above
    /// [`MAX_MESSAGES_PER_BATCH`], or a zero typing interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let cache_size = self.cache.message_cache_size;
        if cache_size > MAX_MESSAGE_CACHE_SIZE {
            return Err(ConfigError::Invalid {
                field: "cache.message_cache_size",
                reason: format!("must be at most {MAX_MESSAGE_CACHE_SIZE}, got {cache_size}"),
            });
        }
        let batch = self.history.max_messages_per_batch;
        if batch == 0 || batch > MAX_MESSAGES_PER_BATCH {
            return Err(ConfigError::Invalid {
                field: "history.max_messages_per_batch",
                reason: format!("must be between 1 and {MAX_MESSAGES_PER_BATCH}, got {batch}"),
            });
        }
        if self.typing.interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "typing.interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Copy of `self` with every value pulled into its accepted range.
    ///
    /// Used where a config cannot be rejected, such as handle construction.
    pub fn clamped(&self) -> Self {
        let mut config = self.clone();
        config.cache.message_cache_size =
            config.cache.message_cache_size.min(MAX_MESSAGE_CACHE_SIZE);
        config.history.max_messages_per_batch = config
            .history
            .max_messages_per_batch
            .clamp(1, MAX_MESSAGES_PER_BATCH);
        config.typing.interval_ms = config.typing.interval_ms.max(1);
        config
    }

    /// Set the per-channel message cache size. Zero disables caching.
    pub fn with_message_cache_size(mut self, size: usize) -> Self {
        self.cache.message_cache_size = size;
        self
    }

    /// Set the remote page size.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.history.max_messages_per_batch = size;
        self
    }

    /// Set the typing indicator repeat interval.
    pub fn with_typing_interval(mut self, interval: Duration) -> Self {
        self.typing.interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Typing indicator repeat interval.
    pub fn typing_interval(&self) -> Duration {
        Duration::from_millis(self.typing.interval_ms)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
    /// A value is out of range.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Dotted key of the offending value.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}
