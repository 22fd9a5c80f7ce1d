//! Manifest records
//!
//! A manifest is the durable, human-readable record emitted by a successful
//! store: `key: value` lines plus two brace-delimited blocks holding the
//! per-shard storage locations and Merkle proofs. It is the single input to
//! retrieve and verify.
//!
//! Parsing is forgiving: lines without a `": "` separator are skipped and
//! the first occurrence of a key wins. Values are single-line; writers
//! reject values containing a newline.

use crate::crypto::{ContentId, IV_SIZE};
use crate::error::{Result, VaultError};
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Manifest record for one stored payload
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Content id: SHA-256 of the ciphertext
    pub data_id: ContentId,
    /// Original file name
    pub filename: String,
    /// Original plaintext size in bytes
    pub filesize: u64,
    /// Exact ciphertext size in bytes, used to trim the zero padding the
    /// erasure layer appends
    pub ciphersize: u64,
    /// File extension without the leading dot
    pub format: String,
    /// RFC3339 creation timestamp
    pub creation_date: String,
    /// Location string per shard index
    pub locations: Vec<String>,
    /// Serialized proof per shard index; absent for shards that were empty
    /// at write time
    pub proofs: Vec<Option<String>>,
}

impl Manifest {
    /// Assemble a manifest for a freshly stored payload, stamped now
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        data_id: ContentId,
        filename: String,
        filesize: u64,
        ciphersize: u64,
        format: String,
        locations: Vec<String>,
        proofs: Vec<Option<String>>,
    ) -> Self {
        Self {
            data_id,
            filename,
            filesize,
            ciphersize,
            format,
            creation_date: Utc::now().to_rfc3339(),
            locations,
            proofs,
        }
    }

    /// Generate a fresh manifest file name: `vault_session_<12-alnum>.vmd`
    pub fn generate_filename() -> String {
        format!("vault_session_{}.vmd", random_tag(12))
    }

    /// Render to the line-oriented text format
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "dataID: {}", self.data_id);
        let _ = writeln!(out, "filename: {}", self.filename);
        let _ = writeln!(out, "filesize: {}", self.filesize);
        let _ = writeln!(out, "ciphersize: {}", self.ciphersize);
        let _ = writeln!(out, "format: {}", self.format);
        let _ = writeln!(out, "creation_date: {}", self.creation_date);
        out.push_str("storage_locations: {\n");
        for (idx, location) in self.locations.iter().enumerate() {
            let _ = writeln!(out, "  shard_{idx}: {location}");
        }
        out.push_str("}\n");
        out.push_str("Proofs: {\n");
        for (idx, proof) in self.proofs.iter().enumerate() {
            if let Some(proof) = proof {
                let _ = writeln!(out, "  Proof for shard {idx}: {proof}");
            }
        }
        out.push_str("}\n");
        out
    }

    /// Parse from the text format. `total_shards` fixes how many `shard_i`
    /// location entries must be present.
    pub fn parse(text: &str, total_shards: usize) -> Result<Self> {
        let data_id = ContentId::from_hex(required(text, "dataID")?)?;
        let filename = required(text, "filename")?.to_string();
        let filesize: u64 = required(text, "filesize")?
            .parse()
            .map_err(|e| VaultError::ManifestParse(format!("bad filesize: {e}")))?;
        let format = required(text, "format")?.to_string();
        let creation_date = required(text, "creation_date")?.to_string();

        // Older manifests omit ciphersize; for CFB the ciphertext is always
        // IV + plaintext, so the fallback is exact.
        let ciphersize: u64 = match lookup(text, "ciphersize") {
            Some(value) => value
                .parse()
                .map_err(|e| VaultError::ManifestParse(format!("bad ciphersize: {e}")))?,
            None => filesize + IV_SIZE as u64,
        };

        let mut locations = Vec::with_capacity(total_shards);
        for idx in 0..total_shards {
            let key = format!("shard_{idx}");
            let location = lookup(text, &key).ok_or_else(|| {
                VaultError::ManifestParse(format!(
                    "missing storage location {key}: expected {total_shards} entries"
                ))
            })?;
            locations.push(location.to_string());
        }

        let proofs = (0..total_shards)
            .map(|idx| lookup(text, &format!("Proof for shard {idx}")).map(String::from))
            .collect();

        Ok(Self {
            data_id,
            filename,
            filesize,
            ciphersize,
            format,
            creation_date,
            locations,
            proofs,
        })
    }

    /// Write the rendered manifest to `path`
    pub fn write_to(&self, path: &Path) -> Result<()> {
        self.check_single_line()?;
        fs::write(path, self.render())?;
        Ok(())
    }

    /// Load and parse a manifest file
    pub fn load(path: &Path, total_shards: usize) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text, total_shards)
    }

    // Values are looked up line-wise, so a value holding a newline would
    // silently change meaning on re-read.
    fn check_single_line(&self) -> Result<()> {
        let values = [&self.filename, &self.format, &self.creation_date];
        let all = values
            .into_iter()
            .chain(self.locations.iter())
            .chain(self.proofs.iter().flatten());
        for value in all {
            if value.contains('\n') {
                return Err(VaultError::ManifestParse(
                    "manifest value contains a newline".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// First `key: value` line matching `key`, skipping lines without the
/// separator
fn lookup<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    for line in text.lines() {
        if let Some((k, v)) = line.split_once(": ") {
            if k.trim() == key {
                return Some(v.trim());
            }
        }
    }
    None
}

fn required<'a>(text: &'a str, key: &str) -> Result<&'a str> {
    lookup(text, key)
        .ok_or_else(|| VaultError::ManifestParse(format!("missing required key: {key}")))
}

fn random_tag(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_manifest() -> Manifest {
        let proof = format!("R:{}", "ab".repeat(32));
        Manifest::new(
            ContentId::compute(b"ciphertext"),
            "report.pdf".to_string(),
            21,
            37,
            "pdf".to_string(),
            (0..14).map(|i| format!("loc_{i}")).collect(),
            (0..14).map(|_| Some(proof.clone())).collect(),
        )
    }

    #[test]
    fn test_render_parse_roundtrip() {
        let manifest = sample_manifest();
        let text = manifest.render();
        let parsed = Manifest::parse(&text, 14).unwrap();

        assert_eq!(parsed.data_id, manifest.data_id);
        assert_eq!(parsed.filename, manifest.filename);
        assert_eq!(parsed.filesize, manifest.filesize);
        assert_eq!(parsed.ciphersize, manifest.ciphersize);
        assert_eq!(parsed.format, manifest.format);
        assert_eq!(parsed.creation_date, manifest.creation_date);
        assert_eq!(parsed.locations, manifest.locations);
        assert_eq!(parsed.proofs, manifest.proofs);
    }

    #[test]
    fn test_render_field_order() {
        let text = sample_manifest().render();
        let keys: Vec<&str> = text
            .lines()
            .take(6)
            .filter_map(|l| l.split_once(": ").map(|(k, _)| k))
            .collect();
        assert_eq!(
            keys,
            [
                "dataID",
                "filename",
                "filesize",
                "ciphersize",
                "format",
                "creation_date"
            ]
        );
    }

    #[test]
    fn test_parse_skips_junk_lines() {
        let manifest = sample_manifest();
        let mut text = String::from("# not a key value line\n{\n");
        text.push_str(&manifest.render());
        text.push_str("trailing garbage without separator\n");

        let parsed = Manifest::parse(&text, 14).unwrap();
        assert_eq!(parsed.data_id, manifest.data_id);
    }

    #[test]
    fn test_first_key_wins() {
        let manifest = sample_manifest();
        let mut text = manifest.render();
        text.push_str("filename: impostor.bin\n");

        let parsed = Manifest::parse(&text, 14).unwrap();
        assert_eq!(parsed.filename, "report.pdf");
    }

    #[test]
    fn test_missing_location_rejected() {
        let manifest = sample_manifest();
        let text: String = manifest
            .render()
            .lines()
            .filter(|l| !l.contains("shard_13: "))
            .map(|l| format!("{l}\n"))
            .collect();

        let result = Manifest::parse(&text, 14);
        assert!(matches!(result, Err(VaultError::ManifestParse(_))));
    }

    #[test]
    fn test_missing_data_id_rejected() {
        let result = Manifest::parse("filename: a\nfilesize: 1\n", 14);
        assert!(matches!(result, Err(VaultError::ManifestParse(_))));
    }

    #[test]
    fn test_ciphersize_fallback() {
        let manifest = sample_manifest();
        let text: String = manifest
            .render()
            .lines()
            .filter(|l| !l.starts_with("ciphersize"))
            .map(|l| format!("{l}\n"))
            .collect();

        let parsed = Manifest::parse(&text, 14).unwrap();
        assert_eq!(parsed.ciphersize, manifest.filesize + IV_SIZE as u64);
    }

    #[test]
    fn test_newline_value_rejected() {
        let mut manifest = sample_manifest();
        manifest.filename = "two\nlines".to_string();
        let path = std::env::temp_dir().join("vault_manifest_newline_test.vmd");
        let result = manifest.write_to(&path);
        assert!(matches!(result, Err(VaultError::ManifestParse(_))));
    }

    #[test]
    fn test_generated_filename_shape() {
        let name = Manifest::generate_filename();
        assert!(name.starts_with("vault_session_"));
        assert!(name.ends_with(".vmd"));
        let tag = &name["vault_session_".len()..name.len() - ".vmd".len()];
        assert_eq!(tag.len(), 12);
        assert!(tag.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
