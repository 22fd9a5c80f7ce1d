//! Vault Storage Engine
//!
//! The pipeline orchestrator for the Vault blob store: composes the cipher,
//! the erasure coder and the Merkle committer into the three public
//! operations (store, retrieve, verify), plus the storage-location
//! configuration files consumed by the front end.

pub mod locations;
pub mod pipeline;

pub use locations::{read_locations, write_locations};
pub use pipeline::{Pipeline, ShardReport, ShardStatus, StoreReceipt};
