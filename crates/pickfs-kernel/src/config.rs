//! Provider configuration.
//!
//! Static settings come from `config.toml`; the two debug toggles the
//! control surface flips at runtime live in [`ProviderFlags`].

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::paths;
use crate::store::DEFAULT_SEED_COUNT;

/// Default number of entries returned as "recent".
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Default streaming pipe depth, in chunks.
pub const DEFAULT_PIPE_CAPACITY: usize = 16;

/// Default streaming chunk size (64KB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Configuration for provider initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Start with the buffered (temp file) transfer strategy.
    pub buffer_locally: bool,
    /// Start with the authentication gate open.
    pub authenticated: bool,
    /// How many entries `recent` returns.
    pub recent_limit: usize,
    /// Streaming pipe depth, in chunks.
    pub pipe_capacity: usize,
    /// Streaming chunk size in bytes.
    pub chunk_size: usize,
    /// Default size of the synthetic tree.
    pub seed_count: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            buffer_locally: false,
            authenticated: true,
            recent_limit: DEFAULT_RECENT_LIMIT,
            pipe_capacity: DEFAULT_PIPE_CAPACITY,
            chunk_size: DEFAULT_CHUNK_SIZE,
            seed_count: DEFAULT_SEED_COUNT,
        }
    }
}

impl ProviderConfig {
    /// Load from the default config file. A missing file yields defaults.
    pub fn load() -> Result<Self> {
        let path = paths::config_file();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from an explicit TOML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Failed to parse config {}", path.display()))
    }

    /// Parse TOML text. Unset keys keep their defaults.
    pub fn parse(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        Ok(config)
    }

    /// Streaming sizes for the transfer bridge.
    pub fn transfer_settings(&self) -> TransferSettings {
        TransferSettings {
            pipe_capacity: self.pipe_capacity.max(1),
            chunk_size: self.chunk_size.max(1),
        }
    }
}

/// Streaming pipe sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferSettings {
    pub pipe_capacity: usize,
    pub chunk_size: usize,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            pipe_capacity: DEFAULT_PIPE_CAPACITY,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Debug toggles that can be flipped while the provider is live.
#[derive(Debug)]
pub struct ProviderFlags {
    buffer_locally: AtomicBool,
    authenticated: AtomicBool,
}

impl Default for ProviderFlags {
    fn default() -> Self {
        Self::from_config(&ProviderConfig::default())
    }
}

impl ProviderFlags {
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            buffer_locally: AtomicBool::new(config.buffer_locally),
            authenticated: AtomicBool::new(config.authenticated),
        }
    }

    /// Whether transfers go through a local temp file instead of a pipe.
    pub fn buffer_locally(&self) -> bool {
        self.buffer_locally.load(Ordering::SeqCst)
    }

    pub fn set_buffer_locally(&self, value: bool) {
        self.buffer_locally.store(value, Ordering::SeqCst);
        tracing::info!(buffer_locally = value, "transfer strategy changed");
    }

    /// Whether protected operations are allowed.
    pub fn authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    pub fn set_authenticated(&self, value: bool) {
        self.authenticated.store(value, Ordering::SeqCst);
        tracing::info!(authenticated = value, "authentication gate changed");
    }
}
