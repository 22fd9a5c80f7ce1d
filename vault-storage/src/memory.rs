//! In-memory shard backend
//!
//! Used for testing. Shards are keyed by `(content id, index, location)` so
//! tests can exercise per-location loss and corruption.

use crate::backend::ShardBackend;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use vault_core::crypto::ContentId;
use vault_core::error::{Result, VaultError};

type ShardKey = (String, usize, String);

/// In-memory shard backend
#[derive(Debug, Default)]
pub struct MemoryBackend {
    shards: RwLock<HashMap<ShardKey, Bytes>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(content_id: &ContentId, index: usize, location: &str) -> ShardKey {
        (content_id.to_hex(), index, location.to_string())
    }

    /// Number of shards currently held
    pub fn shard_count(&self) -> usize {
        self.shards.read().len()
    }

    /// Drop a stored shard, simulating loss at one location. Returns whether
    /// the shard existed.
    pub fn remove_shard(&self, content_id: &ContentId, index: usize, location: &str) -> bool {
        self.shards
            .write()
            .remove(&Self::key(content_id, index, location))
            .is_some()
    }

    /// Flip the first byte of a stored shard, simulating corruption. Returns
    /// whether the shard existed and was non-empty.
    pub fn corrupt_shard(&self, content_id: &ContentId, index: usize, location: &str) -> bool {
        let mut shards = self.shards.write();
        match shards.get_mut(&Self::key(content_id, index, location)) {
            Some(data) if !data.is_empty() => {
                let mut bytes = data.to_vec();
                bytes[0] ^= 0xFF;
                *data = Bytes::from(bytes);
                true
            }
            _ => false,
        }
    }
}

impl ShardBackend for MemoryBackend {
    fn put_shard(
        &self,
        content_id: &ContentId,
        index: usize,
        data: &[u8],
        location: &str,
    ) -> Result<()> {
        self.shards.write().insert(
            Self::key(content_id, index, location),
            Bytes::copy_from_slice(data),
        );
        Ok(())
    }

    fn get_shard(&self, content_id: &ContentId, index: usize, location: &str) -> Result<Bytes> {
        self.shards
            .read()
            .get(&Self::key(content_id, index, location))
            .cloned()
            .ok_or_else(|| VaultError::ShardNotFound {
                content_id: content_id.to_hex(),
                index,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get() {
        let backend = MemoryBackend::new();
        let id = ContentId::compute(b"test");

        backend.put_shard(&id, 0, b"hello", "loc_0").unwrap();
        let fetched = backend.get_shard(&id, 0, "loc_0").unwrap();
        assert_eq!(fetched.as_ref(), b"hello");
        assert_eq!(backend.shard_count(), 1);
    }

    #[test]
    fn test_locations_are_distinct() {
        let backend = MemoryBackend::new();
        let id = ContentId::compute(b"test");

        backend.put_shard(&id, 0, b"at zero", "loc_0").unwrap();
        let result = backend.get_shard(&id, 0, "loc_1");
        assert!(matches!(result, Err(VaultError::ShardNotFound { .. })));
    }

    #[test]
    fn test_remove_shard() {
        let backend = MemoryBackend::new();
        let id = ContentId::compute(b"test");

        backend.put_shard(&id, 2, b"bytes", "loc_2").unwrap();
        assert!(backend.remove_shard(&id, 2, "loc_2"));
        assert!(!backend.remove_shard(&id, 2, "loc_2"));
        assert!(backend.get_shard(&id, 2, "loc_2").is_err());
    }

    #[test]
    fn test_corrupt_shard() {
        let backend = MemoryBackend::new();
        let id = ContentId::compute(b"test");

        backend.put_shard(&id, 1, &[0xAA, 0xBB], "loc_1").unwrap();
        assert!(backend.corrupt_shard(&id, 1, "loc_1"));
        let fetched = backend.get_shard(&id, 1, "loc_1").unwrap();
        assert_eq!(fetched.as_ref(), &[0x55, 0xBB]);
    }
}
