//! Chunked encoding configuration
//!
//! # Features
//! - `serde` support for serialization/deserialization
//! - Default values for all parameters
//! - Configuration values via [`ChunkedEncodingConfig`]
//! - Static configuration via [`StaticConfigProvider`]
//! - Hot-reload configuration via [`HotReloadConfigProvider`]
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use s3s_chunked::config::{ChunkedConfigProvider, ChunkedEncodingConfig, HotReloadConfigProvider};
//!
//! let provider = Arc::new(HotReloadConfigProvider::default());
//! assert_eq!(provider.snapshot().chunk_size, 128 * 1024);
//!
//! let mut config = ChunkedEncodingConfig::default();
//! config.chunk_size = 64 * 1024;
//! provider.update(Arc::new(config));
//! assert_eq!(provider.snapshot().chunk_size, 64 * 1024);
//! ```

use crate::error::ConfigError;

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

/// Default chunk size (128 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 128 * 1024;

/// Chunked encoding configuration provider.
///
/// Callers take one snapshot per request so that every value used for a
/// single payload comes from the same configuration.
pub trait ChunkedConfigProvider: Send + Sync + 'static {
    /// Returns a snapshot of the current configuration.
    fn snapshot(&self) -> Arc<ChunkedEncodingConfig>;
}

/// Chunked encoding configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct ChunkedEncodingConfig {
    /// Number of payload bytes per non-terminal chunk.
    ///
    /// The last data chunk may be shorter.
    ///
    /// Default: 128 KiB
    pub chunk_size: usize,

    /// Whether the zero-length terminal chunk (and the trailer block after it)
    /// is produced.
    ///
    /// Disable this only when another layer appends the terminal chunk.
    ///
    /// Default: `true`
    pub add_empty_trailing_chunk: bool,
}

impl Default for ChunkedEncodingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            add_empty_trailing_chunk: true,
        }
    }
}

impl ChunkedEncodingConfig {
    /// Creates a validated configuration with the given chunk size.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidChunkSize`] if `chunk_size` is zero.
    pub fn with_chunk_size(chunk_size: usize) -> Result<Self, ConfigError> {
        let config = Self {
            chunk_size,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration values.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidChunkSize`] if `chunk_size` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize(self.chunk_size));
        }
        Ok(())
    }
}

/// Static configuration provider.
#[derive(Debug)]
pub struct StaticConfigProvider {
    inner: Arc<ChunkedEncodingConfig>,
}

impl StaticConfigProvider {
    /// Creates a new static configuration provider.
    #[must_use]
    pub fn new(config: Arc<ChunkedEncodingConfig>) -> Self {
        Self { inner: config }
    }
}

impl Default for StaticConfigProvider {
    fn default() -> Self {
        Self::new(Arc::new(ChunkedEncodingConfig::default()))
    }
}

impl ChunkedConfigProvider for StaticConfigProvider {
    fn snapshot(&self) -> Arc<ChunkedEncodingConfig> {
        Arc::clone(&self.inner)
    }
}

/// Hot-reload configuration provider.
///
/// Reads are lock-free; [`update`](Self::update) swaps the whole
/// configuration atomically.
#[derive(Debug)]
pub struct HotReloadConfigProvider {
    inner: ArcSwap<ChunkedEncodingConfig>,
}

impl HotReloadConfigProvider {
    /// Creates a new hot-reload configuration provider.
    #[must_use]
    pub fn new(config: Arc<ChunkedEncodingConfig>) -> Self {
        Self {
            inner: ArcSwap::from(config),
        }
    }

    /// Updates the configuration atomically.
    pub fn update(&self, config: Arc<ChunkedEncodingConfig>) {
        self.inner.store(config);
    }
}

impl Default for HotReloadConfigProvider {
    fn default() -> Self {
        Self::new(Arc::new(ChunkedEncodingConfig::default()))
    }
}

impl ChunkedConfigProvider for HotReloadConfigProvider {
    fn snapshot(&self) -> Arc<ChunkedEncodingConfig> {
        self.inner.load_full()
    }
}
