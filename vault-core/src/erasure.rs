//! Reed-Solomon Erasure Coding
//!
//! Implements (k=8, m=6) erasure coding over GF(2^8) where:
//! - k=8 data shards (minimum required to reconstruct)
//! - m=6 parity shards (redundancy)
//! - Total 14 shards distributed across storage locations
//! - Can tolerate loss of ANY 6 shards

use crate::error::{Result, VaultError};
use crate::{DATA_SHARDS, PARITY_SHARDS};
use bytes::Bytes;
use rayon::prelude::*;
use reed_solomon_erasure::galois_8::ReedSolomon;
use serde::{Deserialize, Serialize};

/// Erasure coding configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ErasureConfig {
    /// Number of data shards (k)
    pub data_shards: usize,
    /// Number of parity shards (m)
    pub parity_shards: usize,
}

impl Default for ErasureConfig {
    fn default() -> Self {
        Self {
            data_shards: DATA_SHARDS,
            parity_shards: PARITY_SHARDS,
        }
    }
}

impl ErasureConfig {
    /// Create a new erasure config
    pub fn new(data_shards: usize, parity_shards: usize) -> Result<Self> {
        if data_shards == 0 {
            return Err(VaultError::Configuration(
                "data_shards must be > 0".to_string(),
            ));
        }
        if parity_shards == 0 {
            return Err(VaultError::Configuration(
                "parity_shards must be > 0".to_string(),
            ));
        }
        Ok(Self {
            data_shards,
            parity_shards,
        })
    }

    /// Total number of shards
    pub fn total_shards(&self) -> usize {
        self.data_shards + self.parity_shards
    }

    /// Maximum number of missing shards that can be tolerated
    pub fn max_failures(&self) -> usize {
        self.parity_shards
    }
}

/// A single shard of erasure-coded ciphertext
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shard {
    /// Shard index (0 to total_shards-1)
    pub index: u8,
    /// Shard bytes
    pub data: Bytes,
    /// Whether this is a parity shard
    pub is_parity: bool,
}

impl Shard {
    /// Create a new shard
    pub fn new(index: u8, data: Bytes, is_parity: bool) -> Self {
        Self {
            index,
            data,
            is_parity,
        }
    }

    /// Get shard size
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Reed-Solomon encoder/reconstructor
pub struct ErasureCoder {
    config: ErasureConfig,
    encoder: ReedSolomon,
}

impl ErasureCoder {
    /// Create a new coder with the default configuration (8, 6)
    pub fn new() -> Result<Self> {
        Self::with_config(ErasureConfig::default())
    }

    /// Create a new coder with a custom configuration
    pub fn with_config(config: ErasureConfig) -> Result<Self> {
        let encoder = ReedSolomon::new(config.data_shards, config.parity_shards)?;
        Ok(Self { config, encoder })
    }

    /// Get the erasure configuration
    pub fn config(&self) -> &ErasureConfig {
        &self.config
    }

    /// Encode a ciphertext into shards
    ///
    /// The input is cut into `data_shards` rows of `ceil(len / data_shards)`
    /// bytes each, the tail row zero-filled to width, and the parity shards
    /// derived from the rows. Returns data + parity shards in index order.
    ///
    /// An empty input has no valid row shape and is rejected.
    pub fn encode(&self, data: &[u8]) -> Result<Vec<Shard>> {
        let width = self.row_width(data.len())?;
        let mut shards: Vec<Vec<u8>> = (0..self.config.data_shards)
            .map(|row| padded_row(data, width, row))
            .collect();
        shards.resize_with(self.config.total_shards(), || vec![0u8; width]);

        // Fills in the parity rows
        self.encoder.encode(&mut shards)?;

        Ok(self.label_shards(shards))
    }

    /// Encode a ciphertext into shards, cutting the rows in parallel
    ///
    /// More efficient for large payloads (> 1MB)
    pub fn encode_parallel(&self, data: &[u8]) -> Result<Vec<Shard>> {
        let width = self.row_width(data.len())?;
        let mut shards: Vec<Vec<u8>> = (0..self.config.data_shards)
            .into_par_iter()
            .map(|row| padded_row(data, width, row))
            .collect();
        shards.resize_with(self.config.total_shards(), || vec![0u8; width]);

        self.encoder.encode(&mut shards)?;

        Ok(self.label_shards(shards))
    }

    /// Reconstruct the ciphertext from shards with holes
    ///
    /// Accepts a vector of length `total_shards` where missing shards are
    /// `None`; fills in the holes from those present, concatenates the data
    /// shards in index order and trims the zero padding down to
    /// `ciphertext_len`.
    ///
    /// Requires at least `data_shards` present entries, otherwise fails with
    /// `InsufficientShards`.
    pub fn reconstruct(&self, shards: &[Option<Bytes>], ciphertext_len: usize) -> Result<Bytes> {
        let total_shards = self.config.total_shards();

        if shards.len() != total_shards {
            return Err(VaultError::ShardSizeMismatch {
                expected: total_shards,
                actual: shards.len(),
            });
        }

        let available = shards.iter().filter(|s| s.is_some()).count();
        if available < self.config.data_shards {
            return Err(VaultError::InsufficientShards {
                available,
                required: self.config.data_shards,
            });
        }

        let mut shard_vecs: Vec<Option<Vec<u8>>> = shards
            .iter()
            .map(|opt| opt.as_ref().map(|s| s.to_vec()))
            .collect();

        // Fill in the missing shards
        self.encoder
            .reconstruct(&mut shard_vecs)
            .map_err(|e| match e {
                reed_solomon_erasure::Error::TooFewShardsPresent => {
                    VaultError::InsufficientShards {
                        available,
                        required: self.config.data_shards,
                    }
                }
                other => VaultError::Reconstruct(other.to_string()),
            })?;

        // Concatenate the data shards
        let shard_size = shard_vecs
            .iter()
            .find_map(|s| s.as_ref().map(|s| s.len()))
            .unwrap_or(0);
        let mut result = Vec::with_capacity(shard_size * self.config.data_shards);
        for shard_opt in shard_vecs.iter().take(self.config.data_shards) {
            match shard_opt {
                Some(shard) => result.extend_from_slice(shard),
                None => {
                    return Err(VaultError::Reconstruct(
                        "shard still missing after reconstruction".to_string(),
                    ))
                }
            }
        }

        // Trim the zero padding appended at encode time
        result.truncate(ciphertext_len);
        Ok(Bytes::from(result))
    }

    /// Check that data and parity shards are mutually consistent
    pub fn verify_shards(&self, shards: &[Shard]) -> Result<bool> {
        if shards.len() != self.config.total_shards() {
            return Ok(false);
        }

        let expected_size = shards.first().map(|s| s.size()).unwrap_or(0);
        if !shards.iter().all(|s| s.size() == expected_size) {
            return Ok(false);
        }

        let shard_refs: Vec<&[u8]> = shards.iter().map(|s| s.data.as_ref()).collect();
        Ok(self.encoder.verify(&shard_refs)?)
    }

    /// Row width for a given input length: `L = ceil(len / data_shards)`,
    /// so that `data_shards` rows of `L` bytes cover the whole input
    fn row_width(&self, len: usize) -> Result<usize> {
        if len == 0 {
            return Err(VaultError::ErasureCoding(
                "cannot encode an empty buffer".to_string(),
            ));
        }
        Ok(len.div_ceil(self.config.data_shards))
    }

    fn label_shards(&self, shards: Vec<Vec<u8>>) -> Vec<Shard> {
        shards
            .into_iter()
            .enumerate()
            .map(|(index, bytes)| {
                Shard::new(
                    index as u8,
                    Bytes::from(bytes),
                    index >= self.config.data_shards,
                )
            })
            .collect()
    }
}

/// One row of the split input: bytes `[row * width, (row + 1) * width)`,
/// zero-filled to `width` where the input runs out
fn padded_row(data: &[u8], width: usize, row: usize) -> Vec<u8> {
    let start = (row * width).min(data.len());
    let end = ((row + 1) * width).min(data.len());
    let mut buf = Vec::with_capacity(width);
    buf.extend_from_slice(&data[start..end]);
    buf.resize(width, 0);
    buf
}
