//! Shard backend trait
//!
//! The pipeline depends on exactly two operations: persist a shard and fetch
//! it back by `(content id, index, location)`. The location is an opaque
//! string chosen by the caller and passed through unchanged.
//!
//! Backends are not required to be durable or atomic. Any error counts as a
//! per-shard failure; the erasure redundancy absorbs up to the parity count
//! of them per read.

use bytes::Bytes;
use vault_core::crypto::ContentId;
use vault_core::error::Result;

/// Narrow persistence capability the pipeline is handed explicitly
pub trait ShardBackend: Send + Sync {
    /// Persist one shard at the given location
    fn put_shard(
        &self,
        content_id: &ContentId,
        index: usize,
        data: &[u8],
        location: &str,
    ) -> Result<()>;

    /// Fetch one shard back from the given location
    fn get_shard(&self, content_id: &ContentId, index: usize, location: &str) -> Result<Bytes>;
}
