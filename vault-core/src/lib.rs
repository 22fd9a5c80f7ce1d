//! Vault Core Library
//!
//! Core abstractions for the Vault encrypted blob store. This crate provides:
//! - AES-256-CFB encryption with SHA-256 content addressing
//! - Reed-Solomon erasure coding (8 data + 6 parity shards)
//! - Merkle commitments and per-shard inclusion proofs
//! - The manifest format that binds a stored payload to its shards
//! - Process configuration and a bounded retry helper

pub mod config;
pub mod crypto;
pub mod erasure;
pub mod error;
pub mod manifest;
pub mod merkle;
pub mod retry;

pub use config::VaultConfig;
pub use crypto::{decrypt, encrypt, ContentId, EncryptionKey, IV_SIZE, KEY_SIZE};
pub use erasure::{ErasureCoder, ErasureConfig, Shard};
pub use error::{Result, VaultError};
pub use manifest::Manifest;
pub use merkle::{MerkleTree, ShardProof};
pub use retry::retry;

/// Default erasure coding configuration
/// - 8 data shards: minimum required to reconstruct
/// - 6 parity shards: can tolerate 6 missing or corrupt shards
/// - 14 total shards distributed across storage locations
///
/// Override at runtime via DATA_SHARDS / PARITY_SHARDS env vars.
pub const DATA_SHARDS: usize = 8;
pub const PARITY_SHARDS: usize = 6;
pub const TOTAL_SHARDS: usize = DATA_SHARDS + PARITY_SHARDS;
