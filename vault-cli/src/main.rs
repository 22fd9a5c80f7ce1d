//! Vault CLI
//!
//! Command-line front end for the vault storage engine.
//!
//! # Commands
//! - `store` - Encrypt, shard and persist a file
//! - `retrieve` - Reassemble a file from a manifest
//! - `verify` - Check persisted shards against the manifest proofs
//! - `set-storage` - Write a storage location configuration file
//!
//! The encryption key is read from the ENCRYPTION_KEY environment variable
//! (64 hex characters). Exits non-zero on any failure.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vault_core::retry::{retry, DEFAULT_ATTEMPTS, DEFAULT_INITIAL_DELAY};
use vault_core::{Manifest, VaultConfig, VaultError};
use vault_engine::{locations, Pipeline, ShardStatus};
use vault_storage::FsBackend;

#[derive(Parser)]
#[command(name = "vault")]
#[command(about = "Encrypted, erasure-coded blob storage")]
#[command(version)]
struct Cli {
    /// Directory where manifests are written
    #[arg(long, default_value = ".", global = true)]
    manifest_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a file across the configured storage locations
    Store {
        /// Path of the file to store
        path: PathBuf,

        /// Storage location configuration file (one location per shard)
        locations: PathBuf,
    },

    /// Retrieve a stored payload from its manifest
    Retrieve {
        /// Manifest file produced by a store
        manifest: PathBuf,

        /// Output path (defaults to the filename recorded in the manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify persisted shards against the manifest proofs
    Verify {
        /// Manifest file produced by a store
        manifest: PathBuf,
    },

    /// Write a storage location configuration file
    SetStorage {
        /// One location per shard, in shard order
        locations: Vec<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = VaultConfig::from_env()?;
    let backend = FsBackend::new();

    match cli.command {
        Commands::Store { path, locations: locations_file } => {
            let payload = std::fs::read(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let filename = path
                .file_name()
                .and_then(|n| n.to_str())
                .with_context(|| format!("no file name in {}", path.display()))?;
            let shard_locations =
                locations::read_locations(&locations_file, config.total_shards())?;

            let pipeline = Pipeline::new(config.erasure(), config.key().clone())?;
            let receipt = retry(DEFAULT_ATTEMPTS, DEFAULT_INITIAL_DELAY, || {
                pipeline.store(
                    &backend,
                    &payload,
                    filename,
                    &shard_locations,
                    &cli.manifest_dir,
                )
            })?;

            println!("dataID: {}", receipt.content_id);
            println!("manifest: {}", receipt.manifest_path.display());
        }

        Commands::Retrieve { manifest, output } => {
            let pipeline = Pipeline::new(config.erasure(), config.key().clone())?;
            let payload = retry(DEFAULT_ATTEMPTS, DEFAULT_INITIAL_DELAY, || {
                pipeline.retrieve(&backend, &manifest)
            })?;

            let output = match output {
                Some(path) => path,
                None => {
                    let parsed = Manifest::load(&manifest, config.total_shards())?;
                    PathBuf::from(parsed.filename)
                }
            };
            std::fs::write(&output, &payload)
                .with_context(|| format!("writing {}", output.display()))?;
            println!("retrieved {} bytes to {}", payload.len(), output.display());
        }

        Commands::Verify { manifest } => {
            let pipeline = Pipeline::new(config.erasure(), config.key().clone())?;
            let reports = retry(DEFAULT_ATTEMPTS, DEFAULT_INITIAL_DELAY, || {
                pipeline.verify(&backend, &manifest)
            })?;

            let mut first_mismatch = None;
            for report in &reports {
                let status = match report.status {
                    ShardStatus::Verified => "pass",
                    ShardStatus::Mismatch => "FAIL",
                    ShardStatus::Missing => "missing",
                };
                println!("shard_{}: {status} ({})", report.index, report.location);
                if report.status == ShardStatus::Mismatch && first_mismatch.is_none() {
                    first_mismatch = Some(report.index);
                }
            }
            if let Some(index) = first_mismatch {
                return Err(VaultError::ProofMismatch { index }.into());
            }
        }

        Commands::SetStorage { locations: shard_locations } => {
            let path = locations::write_locations(
                &shard_locations,
                config.total_shards(),
                std::path::Path::new("."),
            )?;
            println!("storage configuration: {}", path.display());
        }
    }

    Ok(())
}
