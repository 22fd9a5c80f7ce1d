//! Filesystem shard backend
//!
//! Shards are stored at `<location>/<content-id>_<index>.shard`, where the
//! location string is a directory path. Directories are created on demand
//! with mode 0755; shard files are written with mode 0644. Raw bytes, no
//! framing; the manifest is authoritative for length and indexing.

use crate::backend::ShardBackend;
use bytes::Bytes;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;
use vault_core::crypto::ContentId;
use vault_core::error::{Result, VaultError};

/// Directory-per-location filesystem backend
#[derive(Debug, Default)]
pub struct FsBackend;

impl FsBackend {
    pub fn new() -> Self {
        Self
    }

    fn shard_path(content_id: &ContentId, index: usize, location: &str) -> PathBuf {
        Path::new(location).join(format!("{content_id}_{index}.shard"))
    }
}

impl ShardBackend for FsBackend {
    fn put_shard(
        &self,
        content_id: &ContentId,
        index: usize,
        data: &[u8],
        location: &str,
    ) -> Result<()> {
        create_location_dir(Path::new(location))?;
        let path = Self::shard_path(content_id, index, location);
        write_shard_file(&path, data)?;
        debug!(index, location, size = data.len(), "stored shard");
        Ok(())
    }

    fn get_shard(&self, content_id: &ContentId, index: usize, location: &str) -> Result<Bytes> {
        let path = Self::shard_path(content_id, index, location);
        match fs::read(&path) {
            Ok(bytes) => Ok(Bytes::from(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(VaultError::ShardNotFound {
                    content_id: content_id.to_hex(),
                    index,
                })
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(unix)]
fn create_location_dir(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o755).create(path)
}

#[cfg(not(unix))]
fn create_location_dir(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path)
}

#[cfg(unix)]
fn write_shard_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o644)
        .open(path)?;
    file.write_all(data)
}

#[cfg(not(unix))]
fn write_shard_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
    fs::write(path, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_put_get_roundtrip() {
        let dir = TempDir::new().unwrap();
        let location = dir.path().to_str().unwrap().to_string();
        let backend = FsBackend::new();
        let id = ContentId::compute(b"ciphertext");

        backend.put_shard(&id, 3, b"shard bytes", &location).unwrap();
        let fetched = backend.get_shard(&id, 3, &location).unwrap();
        assert_eq!(fetched.as_ref(), b"shard bytes");
    }

    #[test]
    fn test_shard_path_layout() {
        let dir = TempDir::new().unwrap();
        let location = dir.path().join("loc_0");
        let location_str = location.to_str().unwrap().to_string();
        let backend = FsBackend::new();
        let id = ContentId::compute(b"payload");

        backend.put_shard(&id, 5, b"x", &location_str).unwrap();

        let expected = location.join(format!("{}_5.shard", id.to_hex()));
        assert!(expected.exists());
    }

    #[test]
    fn test_missing_shard_reported() {
        let dir = TempDir::new().unwrap();
        let location = dir.path().to_str().unwrap().to_string();
        let backend = FsBackend::new();
        let id = ContentId::compute(b"never stored");

        let result = backend.get_shard(&id, 0, &location);
        assert!(matches!(result, Err(VaultError::ShardNotFound { index: 0, .. })));
    }

    #[test]
    fn test_overwrite_is_truncating() {
        let dir = TempDir::new().unwrap();
        let location = dir.path().to_str().unwrap().to_string();
        let backend = FsBackend::new();
        let id = ContentId::compute(b"c");

        backend
            .put_shard(&id, 0, b"a much longer first write", &location)
            .unwrap();
        backend.put_shard(&id, 0, b"short", &location).unwrap();
        let fetched = backend.get_shard(&id, 0, &location).unwrap();
        assert_eq!(fetched.as_ref(), b"short");
    }

    #[cfg(unix)]
    #[test]
    fn test_unix_modes() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let location = dir.path().join("fresh");
        let location_str = location.to_str().unwrap().to_string();
        let backend = FsBackend::new();
        let id = ContentId::compute(b"modes");

        backend.put_shard(&id, 0, b"data", &location_str).unwrap();

        let dir_mode = fs::metadata(&location).unwrap().permissions().mode() & 0o777;
        assert_eq!(dir_mode, 0o755);

        let file = location.join(format!("{}_0.shard", id.to_hex()));
        let file_mode = fs::metadata(&file).unwrap().permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o644);
    }
}
