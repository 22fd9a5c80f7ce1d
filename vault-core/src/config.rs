//! Process configuration
//!
//! Configuration is an immutable value constructed once at startup from the
//! environment and passed down the call stack. The encryption key never
//! appears in logs or manifests.

use crate::crypto::EncryptionKey;
use crate::erasure::ErasureConfig;
use crate::error::{Result, VaultError};
use crate::{DATA_SHARDS, PARITY_SHARDS};

/// Environment variable holding the hex-encoded 32-byte encryption key
pub const ENCRYPTION_KEY_VAR: &str = "ENCRYPTION_KEY";

/// Environment variables overriding the shard geometry
pub const DATA_SHARDS_VAR: &str = "DATA_SHARDS";
pub const PARITY_SHARDS_VAR: &str = "PARITY_SHARDS";

/// Immutable process configuration
#[derive(Debug, Clone)]
pub struct VaultConfig {
    erasure: ErasureConfig,
    key: EncryptionKey,
}

impl VaultConfig {
    /// Build a config from explicit parts
    pub fn new(erasure: ErasureConfig, key: EncryptionKey) -> Self {
        Self { erasure, key }
    }

    /// Load from the environment: ENCRYPTION_KEY is required (64 hex chars);
    /// DATA_SHARDS / PARITY_SHARDS fall back to the compile-time defaults.
    pub fn from_env() -> Result<Self> {
        let key_hex = std::env::var(ENCRYPTION_KEY_VAR).map_err(|_| {
            VaultError::InvalidKey(format!("{ENCRYPTION_KEY_VAR} must be set"))
        })?;
        let key = EncryptionKey::from_hex(&key_hex)?;

        let data = env_usize(DATA_SHARDS_VAR).unwrap_or(DATA_SHARDS);
        let parity = env_usize(PARITY_SHARDS_VAR).unwrap_or(PARITY_SHARDS);
        let erasure = ErasureConfig::new(data, parity)?;

        Ok(Self { erasure, key })
    }

    /// Shard geometry
    pub fn erasure(&self) -> ErasureConfig {
        self.erasure
    }

    /// The encryption key
    pub fn key(&self) -> &EncryptionKey {
        &self.key
    }

    /// Total shard count; every loop bound over shards derives from this
    pub fn total_shards(&self) -> usize {
        self.erasure.total_shards()
    }
}

fn env_usize(var: &str) -> Option<usize> {
    std::env::var(var).ok().and_then(|v| v.parse().ok())
}
