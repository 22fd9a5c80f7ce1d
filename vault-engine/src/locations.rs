//! Storage-location configuration files
//!
//! A plain text file naming one location per shard, one per line, in shard
//! order. Blank lines are ignored and surrounding whitespace is trimmed; a
//! file whose count does not match the configured shard total is rejected.

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use vault_core::error::{Result, VaultError};

/// Read and validate a storage-location configuration file
pub fn read_locations(path: &Path, expected: usize) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)?;
    let locations: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();

    if locations.len() != expected {
        return Err(VaultError::Configuration(format!(
            "storage location file {} holds {} locations, expected {expected}",
            path.display(),
            locations.len()
        )));
    }
    Ok(locations)
}

/// Write a fresh `strl_<12-alnum>.config` file into `dir` naming the given
/// locations, one per line. Returns the generated path.
pub fn write_locations(locations: &[String], expected: usize, dir: &Path) -> Result<PathBuf> {
    if locations.len() != expected {
        return Err(VaultError::Configuration(format!(
            "storage locations incomplete: got {}, requires {expected}",
            locations.len()
        )));
    }
    if let Some(blank) = locations.iter().find(|l| l.trim().is_empty()) {
        return Err(VaultError::Configuration(format!(
            "invalid storage location: {blank:?}"
        )));
    }

    let filename = format!("strl_{}.config", random_tag(12));
    let path = dir.join(filename);

    let mut contents = locations.join("\n");
    contents.push('\n');
    fs::write(&path, contents)?;

    info!(file = %path.display(), "storage location configuration written");
    Ok(path)
}

fn random_tag(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
