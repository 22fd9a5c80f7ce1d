//! Cryptographic primitives for Vault
//!
//! Provides:
//! - SHA-256 content addressing over ciphertext
//! - AES-256-CFB encryption with a random 16-byte IV prepended to the output
//!
//! CFB keeps the encrypted body the same length as the plaintext, which the
//! erasure layer depends on when sizing shards. CFB carries no integrity;
//! shard-level tampering is caught by the Merkle proofs instead.

use crate::error::{Result, VaultError};
use aes::cipher::{AsyncStreamCipher, KeyIvInit};
use aes::Aes256;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt;

type Aes256CfbEnc = cfb_mode::Encryptor<Aes256>;
type Aes256CfbDec = cfb_mode::Decryptor<Aes256>;

/// AES-256 key size (32 bytes)
pub const KEY_SIZE: usize = 32;

/// CFB initialization vector size (one AES block)
pub const IV_SIZE: usize = 16;

/// Content identifier: SHA-256 of the ciphertext, rendered as lowercase hex.
///
/// Stable across storage locations; shards and manifests are keyed by it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentId([u8; 32]);

impl ContentId {
    /// Compute the content id of a ciphertext
    pub fn compute(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Get the raw digest bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to lowercase hex (64 characters)
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a 64-character hex string
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)
            .map_err(|e| VaultError::ManifestParse(format!("invalid data ID: {e}")))?;
        if bytes.len() != 32 {
            return Err(VaultError::ManifestParse(format!(
                "invalid data ID length: expected 64 hex chars, got {}",
                s.len()
            )));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// AES-256 encryption key
#[derive(Clone)]
pub struct EncryptionKey([u8; KEY_SIZE]);

impl EncryptionKey {
    /// Generate a new random encryption key
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        Self(key)
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create from a slice (validates length)
    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        if slice.len() != KEY_SIZE {
            return Err(VaultError::InvalidKey(format!(
                "expected {KEY_SIZE} bytes, got {}",
                slice.len()
            )));
        }
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(slice);
        Ok(Self(key))
    }

    /// Parse from a 64-character hex string, as carried in ENCRYPTION_KEY
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes =
            hex::decode(s.trim()).map_err(|e| VaultError::InvalidKey(format!("not hex: {e}")))?;
        Self::from_slice(&bytes)
    }

    /// Hex-encode the key, for handing a freshly generated key to an operator
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Get the raw key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptionKey([REDACTED])")
    }
}

impl Drop for EncryptionKey {
    fn drop(&mut self) {
        // Zeroize key on drop for security
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

/// Encrypt plaintext with AES-256-CFB.
///
/// The output is `IV || body`; the body has the same length as the plaintext,
/// so the total output length is plaintext length + 16. An empty plaintext
/// yields a 16-byte ciphertext holding only the IV.
pub fn encrypt(plaintext: &[u8], key: &EncryptionKey) -> Result<Vec<u8>> {
    let mut iv = [0u8; IV_SIZE];
    OsRng.fill_bytes(&mut iv);

    let enc = Aes256CfbEnc::new_from_slices(key.as_bytes(), &iv)
        .map_err(|e| VaultError::Encryption(e.to_string()))?;

    let mut out = Vec::with_capacity(IV_SIZE + plaintext.len());
    out.extend_from_slice(&iv);
    out.extend_from_slice(plaintext);
    enc.encrypt(&mut out[IV_SIZE..]);
    Ok(out)
}

/// Decrypt an `IV || body` ciphertext with AES-256-CFB.
///
/// Fails when the input is shorter than the 16-byte IV. CFB is not
/// authenticated: a wrong key decrypts without error into different bytes.
pub fn decrypt(ciphertext: &[u8], key: &EncryptionKey) -> Result<Vec<u8>> {
    if ciphertext.len() < IV_SIZE {
        return Err(VaultError::Decryption(format!(
            "ciphertext too short: {} bytes, need at least {IV_SIZE}",
            ciphertext.len()
        )));
    }
    let (iv, body) = ciphertext.split_at(IV_SIZE);

    let dec = Aes256CfbDec::new_from_slices(key.as_bytes(), iv)
        .map_err(|e| VaultError::Decryption(e.to_string()))?;

    let mut out = body.to_vec();
    dec.decrypt(&mut out);
    Ok(out)
}
