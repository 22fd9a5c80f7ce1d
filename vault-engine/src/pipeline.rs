//! Storage pipeline
//!
//! Composes encryption, erasure coding and Merkle commitments into the three
//! public operations: store, retrieve, verify. The pipeline holds the shard
//! geometry and the key; per-request buffers live only for the duration of
//! one call.
//!
//! On write: encrypt, derive the content id from the ciphertext, encode into
//! shards, persist every shard, then commit the shard list to a Merkle tree
//! and write the manifest. The manifest is written strictly after all shards
//! persisted; any shard failure aborts the whole store.
//!
//! On read: the recorded per-shard proofs double as an integrity filter. A
//! fetched shard whose proof-derived root disagrees with the root agreed by
//! the other shards is treated as missing, so a corrupted shard consumes one
//! unit of parity budget instead of poisoning the reconstruction.

use bytes::Bytes;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use vault_core::crypto::{self, ContentId, EncryptionKey};
use vault_core::erasure::{ErasureCoder, ErasureConfig};
use vault_core::error::{Result, VaultError};
use vault_core::manifest::Manifest;
use vault_core::merkle::{MerkleTree, ShardProof};
use vault_storage::ShardBackend;

/// Outcome of a successful store
#[derive(Debug)]
pub struct StoreReceipt {
    pub content_id: ContentId,
    pub manifest_path: PathBuf,
}

/// Per-shard verification outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShardStatus {
    /// Shard bytes match the proof recorded at write time
    Verified,
    /// Shard bytes have changed since write, or the recorded proof is
    /// missing or unreadable
    Mismatch,
    /// Shard could not be fetched
    Missing,
}

/// One row of a verification report
#[derive(Debug, Clone)]
pub struct ShardReport {
    pub index: usize,
    pub location: String,
    pub status: ShardStatus,
}

/// Stateless orchestrator over a shard backend
pub struct Pipeline {
    coder: ErasureCoder,
    key: EncryptionKey,
}

impl Pipeline {
    pub fn new(config: ErasureConfig, key: EncryptionKey) -> Result<Self> {
        Ok(Self {
            coder: ErasureCoder::with_config(config)?,
            key,
        })
    }

    /// Shard geometry this pipeline was configured with
    pub fn config(&self) -> &ErasureConfig {
        self.coder.config()
    }

    /// Encrypt, shard and persist a payload, then write its manifest into
    /// `manifest_dir`. Returns the content id and the manifest path.
    pub fn store(
        &self,
        backend: &dyn ShardBackend,
        payload: &[u8],
        filename: &str,
        locations: &[String],
        manifest_dir: &Path,
    ) -> Result<StoreReceipt> {
        let total = self.config().total_shards();
        if locations.len() != total {
            return Err(VaultError::Configuration(format!(
                "expected {total} storage locations, got {}",
                locations.len()
            )));
        }

        let ciphertext = crypto::encrypt(payload, &self.key)?;
        let content_id = ContentId::compute(&ciphertext);
        debug!(
            %content_id,
            plaintext_size = payload.len(),
            ciphertext_size = ciphertext.len(),
            "payload encrypted"
        );

        let shards = self.coder.encode(&ciphertext)?;

        // Every shard must land before the manifest exists; a failed put
        // aborts the store with no manifest written.
        for (shard, location) in shards.iter().zip(locations) {
            debug!(
                index = shard.index,
                location = %location,
                size = shard.size(),
                "storing shard"
            );
            backend.put_shard(&content_id, shard.index as usize, &shard.data, location)?;
        }

        let tree = MerkleTree::build(shards.iter().map(|s| Some(s.data.as_ref())));
        let proofs = shards
            .iter()
            .map(|s| Ok(Some(tree.proof(s.index as usize)?.to_string())))
            .collect::<Result<Vec<_>>>()?;

        let format = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_string();
        let manifest = Manifest::new(
            content_id,
            filename.to_string(),
            payload.len() as u64,
            ciphertext.len() as u64,
            format,
            locations.to_vec(),
            proofs,
        );

        let manifest_path = manifest_dir.join(Manifest::generate_filename());
        manifest.write_to(&manifest_path)?;

        info!(%content_id, manifest = %manifest_path.display(), "payload stored");
        Ok(StoreReceipt {
            content_id,
            manifest_path,
        })
    }

    /// Reassemble the payload named by a manifest. Tolerates up to
    /// `parity_shards` missing or corrupt shards.
    pub fn retrieve(&self, backend: &dyn ShardBackend, manifest_path: &Path) -> Result<Vec<u8>> {
        let total = self.config().total_shards();
        let manifest = Manifest::load(manifest_path, total)?;

        let mut shards = self.fetch_shards(backend, &manifest);

        // Demote shards that fail their integrity check to missing, so the
        // erasure layer regenerates them from parity.
        let proofs = parse_proofs(&manifest);
        if let Some(reference) = consensus_root(&shards, &proofs) {
            for (index, slot) in shards.iter_mut().enumerate() {
                if let Some(root) = proof_root(slot.as_deref(), &proofs[index]) {
                    if root != reference {
                        warn!(index, "shard failed integrity check, treating as missing");
                        *slot = None;
                    }
                }
            }
        }

        let missing = shards.iter().filter(|s| s.is_none()).count();
        if missing > self.config().parity_shards {
            return Err(VaultError::InsufficientShards {
                available: total - missing,
                required: self.config().data_shards,
            });
        }

        let ciphertext = self
            .coder
            .reconstruct(&shards, manifest.ciphersize as usize)?;
        let mut plaintext = crypto::decrypt(&ciphertext, &self.key)?;
        // Trim the zero padding disclosed by the erasure layer
        plaintext.truncate(manifest.filesize as usize);

        info!(
            content_id = %manifest.data_id,
            size = plaintext.len(),
            "payload retrieved"
        );
        Ok(plaintext)
    }

    /// Check every persisted shard against the proofs recorded in the
    /// manifest. Never mutates; absent shards are reported and skipped.
    pub fn verify(
        &self,
        backend: &dyn ShardBackend,
        manifest_path: &Path,
    ) -> Result<Vec<ShardReport>> {
        let total = self.config().total_shards();
        let manifest = Manifest::load(manifest_path, total)?;

        let shards = self.fetch_shards(backend, &manifest);
        let proofs = parse_proofs(&manifest);
        let reference = consensus_root(&shards, &proofs);

        let reports = (0..total)
            .map(|index| {
                let status = match &shards[index] {
                    None => ShardStatus::Missing,
                    Some(data) => match (proof_root(Some(data.as_ref()), &proofs[index]), reference) {
                        (Some(root), Some(reference)) if root == reference => {
                            ShardStatus::Verified
                        }
                        _ => ShardStatus::Mismatch,
                    },
                };
                ShardReport {
                    index,
                    location: manifest.locations[index].clone(),
                    status,
                }
            })
            .collect();
        Ok(reports)
    }

    fn fetch_shards(&self, backend: &dyn ShardBackend, manifest: &Manifest) -> Vec<Option<Bytes>> {
        manifest
            .locations
            .iter()
            .enumerate()
            .map(|(index, location)| {
                match backend.get_shard(&manifest.data_id, index, location) {
                    Ok(data) => {
                        debug!(index, location = %location, "retrieved shard");
                        Some(data)
                    }
                    Err(err) => {
                        warn!(index, location = %location, error = %err, "shard retrieval failed");
                        None
                    }
                }
            })
            .collect()
    }
}

fn parse_proofs(manifest: &Manifest) -> Vec<Option<ShardProof>> {
    manifest
        .proofs
        .iter()
        .map(|p| p.as_deref().and_then(|s| s.parse().ok()))
        .collect()
}

fn proof_root(shard: Option<&[u8]>, proof: &Option<ShardProof>) -> Option<[u8; 32]> {
    Some(proof.as_ref()?.compute_root(shard?))
}

/// The Merkle root most of the present shards agree on through their
/// recorded proofs. With at most `parity_shards` corruptions, the honest
/// majority pins down the root committed at write time.
fn consensus_root(shards: &[Option<Bytes>], proofs: &[Option<ShardProof>]) -> Option<[u8; 32]> {
    let mut votes: HashMap<[u8; 32], usize> = HashMap::new();
    for (slot, proof) in shards.iter().zip(proofs) {
        if let Some(root) = proof_root(slot.as_deref(), proof) {
            *votes.entry(root).or_insert(0) += 1;
        }
    }
    votes
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(root, _)| root)
}
