//! Error types for Vault
//!
//! Provides a unified error type for all Vault operations.

use thiserror::Error;

/// Result type alias for Vault operations
pub type Result<T> = std::result::Result<T, VaultError>;

/// Unified error type for Vault
#[derive(Error, Debug)]
pub enum VaultError {
    // ===== Erasure Coding Errors =====
    #[error("Erasure coding error: {0}")]
    ErasureCoding(String),

    #[error("Insufficient shards: have {available}, need {required}")]
    InsufficientShards { available: usize, required: usize },

    #[error("Shard size mismatch: expected {expected}, got {actual}")]
    ShardSizeMismatch { expected: usize, actual: usize },

    #[error("Invalid shard index: {index} (max: {max})")]
    InvalidShardIndex { index: usize, max: usize },

    #[error("Reconstruction failed: {0}")]
    Reconstruct(String),

    // ===== Cryptography Errors =====
    #[error("Invalid encryption key: {0}")]
    InvalidKey(String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Decryption error: {0}")]
    Decryption(String),

    // ===== Manifest Errors =====
    #[error("Manifest parse error: {0}")]
    ManifestParse(String),

    #[error("Proof mismatch for shard {index}")]
    ProofMismatch { index: usize },

    // ===== Storage Errors =====
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Shard {index} not found for data ID {content_id}")]
    ShardNotFound { content_id: String, index: usize },

    // ===== I/O Errors =====
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ===== Configuration Errors =====
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reed_solomon_erasure::Error> for VaultError {
    fn from(err: reed_solomon_erasure::Error) -> Self {
        VaultError::ErasureCoding(err.to_string())
    }
}
