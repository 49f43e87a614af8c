use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{VaultError, VaultResult};

/// Top-level configuration (loaded from papervault.toml).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    pub chunking: ChunkConfig,
    pub shares: ShareConfig,
    pub fetch: FetchConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkConfig {
    /// Plaintext bytes per chunk (default: 512 KiB).
    pub chunk_size: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    /// Total shares dealt (one per custodian).
    pub total: u8,
    /// Minimum shares required to reconstruct the master key.
    pub threshold: u8,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            total: 3,
            threshold: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Retry limit for transient chunk-fetch failures.
    pub max_retries: u32,
    /// Initial backoff; doubles per attempt.
    pub backoff_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_ms: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info).
    pub level: String,
    /// Log format: "json" or "text".
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl VaultConfig {
    pub fn load(path: &Path) -> VaultResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|e| VaultError::MalformedInput(format!("config parse error: {e}")))
    }
}
