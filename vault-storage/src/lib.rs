//! Vault Shard Storage
//!
//! Provides shard persistence abstractions and implementations:
//! - `ShardBackend` trait for pluggable shard stores
//! - `FsBackend` for directory-per-location filesystem storage
//! - `MemoryBackend` for testing

pub mod backend;
pub mod fs;
pub mod memory;

pub use backend::ShardBackend;
pub use fs::FsBackend;
pub use memory::MemoryBackend;
