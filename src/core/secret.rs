//! Credential encryption backed by a per-installation key file.
//!
//! The key is 32 raw bytes generated once and stored beside the config.
//! Losing the key file makes previously stored credentials unrecoverable;
//! there is no rotation and no recovery path.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// Errors that can occur while loading or creating the key file.
#[derive(Debug)]
pub enum SecretStoreError {
    /// Failed to read an existing key file.
    Read { path: PathBuf, source: io::Error },
    /// Failed to persist a freshly generated key.
    Write { path: PathBuf, source: io::Error },
    /// The key file exists but does not hold a valid key.
    InvalidKey { path: PathBuf },
}

impl fmt::Display for SecretStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretStoreError::Read { path, source } => {
                write!(f, "Failed to read key file at {}: {}", path.display(), source)
            }
            SecretStoreError::Write { path, source } => {
                write!(
                    f,
                    "Failed to write key file at {}: {}",
                    path.display(),
                    source
                )
            }
            SecretStoreError::InvalidKey { path } => {
                write!(
                    f,
                    "Key file at {} does not contain a valid key",
                    path.display()
                )
            }
        }
    }
}

impl StdError for SecretStoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            SecretStoreError::Read { source, .. } | SecretStoreError::Write { source, .. } => {
                Some(source)
            }
            SecretStoreError::InvalidKey { .. } => None,
        }
    }
}

/// Encrypting a credential failed inside the cipher itself.
#[derive(Debug)]
pub struct EncryptionError;

impl fmt::Display for EncryptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to encrypt credential")
    }
}

impl StdError for EncryptionError {}

/// A stored ciphertext could not be turned back into a credential.
///
/// Callers treat any variant as "no credential available" rather than a
/// fatal error.
#[derive(Debug)]
pub enum DecryptionError {
    /// The ciphertext is not valid base64.
    Encoding(base64::DecodeError),
    /// The decoded payload is too short to hold a nonce.
    Truncated,
    /// Authentication failed: wrong key or tampered data.
    Failed,
}

impl fmt::Display for DecryptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecryptionError::Encoding(source) => {
                write!(f, "Credential ciphertext is not valid base64: {source}")
            }
            DecryptionError::Truncated => write!(f, "Credential ciphertext is truncated"),
            DecryptionError::Failed => {
                write!(f, "Credential could not be decrypted (wrong key or tampered data)")
            }
        }
    }
}

impl StdError for DecryptionError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            DecryptionError::Encoding(source) => Some(source),
            _ => None,
        }
    }
}

/// Encrypts and decrypts the stored API credential with AES-256-GCM.
///
/// Ciphertexts are `base64(nonce || ciphertext)` with a fresh random nonce
/// per call, so two encryptions of the same credential differ byte-for-byte
/// while still round-tripping through [`SecretStore::decrypt`].
pub struct SecretStore {
    cipher: Aes256Gcm,
}

impl SecretStore {
    /// Load the key at `key_path`, or generate and persist one on first use.
    ///
    /// Idempotent across restarts: the same file always yields the same key.
    pub fn load_or_create(key_path: &Path) -> Result<Self, SecretStoreError> {
        let key_bytes = if key_path.exists() {
            fs::read(key_path).map_err(|source| SecretStoreError::Read {
                path: key_path.to_path_buf(),
                source,
            })?
        } else {
            let mut key_bytes = vec![0u8; KEY_LEN];
            OsRng.fill_bytes(&mut key_bytes);
            if let Some(parent) = key_path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|source| SecretStoreError::Write {
                    path: key_path.to_path_buf(),
                    source,
                })?;
            }
            fs::write(key_path, &key_bytes).map_err(|source| SecretStoreError::Write {
                path: key_path.to_path_buf(),
                source,
            })?;
            key_bytes
        };

        let cipher =
            Aes256Gcm::new_from_slice(&key_bytes).map_err(|_| SecretStoreError::InvalidKey {
                path: key_path.to_path_buf(),
            })?;
        Ok(Self { cipher })
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, EncryptionError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| EncryptionError)?;

        let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        payload.extend_from_slice(&nonce_bytes);
        payload.extend_from_slice(&ciphertext);
        Ok(BASE64_STANDARD.encode(payload))
    }

    pub fn decrypt(&self, ciphertext: &str) -> Result<String, DecryptionError> {
        let payload = BASE64_STANDARD
            .decode(ciphertext)
            .map_err(DecryptionError::Encoding)?;
        if payload.len() < NONCE_LEN {
            return Err(DecryptionError::Truncated);
        }
        let (nonce_bytes, sealed) = payload.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);
        let plaintext = self
            .cipher
            .decrypt(nonce, sealed)
            .map_err(|_| DecryptionError::Failed)?;
        String::from_utf8(plaintext).map_err(|_| DecryptionError::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> SecretStore {
        SecretStore::load_or_create(&dir.path().join("key.bin")).expect("Failed to create store")
    }

    #[test]
    fn encrypt_then_decrypt_round_trips() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let store = store_in(&dir);

        let ciphertext = store.encrypt("sk-or-v1-secret").expect("encrypt failed");
        assert_ne!(ciphertext, "sk-or-v1-secret");
        assert_eq!(store.decrypt(&ciphertext).expect("decrypt failed"), "sk-or-v1-secret");
    }

    #[test]
    fn encryption_is_probabilistic() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let store = store_in(&dir);

        let first = store.encrypt("same input").expect("encrypt failed");
        let second = store.encrypt("same input").expect("encrypt failed");
        assert_ne!(first, second);
        assert_eq!(store.decrypt(&first).unwrap(), store.decrypt(&second).unwrap());
    }

    #[test]
    fn key_file_persists_across_reopen() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let key_path = dir.path().join("key.bin");

        let first = SecretStore::load_or_create(&key_path).expect("first open failed");
        let ciphertext = first.encrypt("credential").expect("encrypt failed");

        let reopened = SecretStore::load_or_create(&key_path).expect("reopen failed");
        assert_eq!(reopened.decrypt(&ciphertext).expect("decrypt failed"), "credential");
    }

    #[test]
    fn foreign_key_fails_to_decrypt() {
        let dir_a = TempDir::new().expect("Failed to create temp directory");
        let dir_b = TempDir::new().expect("Failed to create temp directory");
        let store_a = store_in(&dir_a);
        let store_b = store_in(&dir_b);

        let ciphertext = store_a.encrypt("credential").expect("encrypt failed");
        assert!(matches!(
            store_b.decrypt(&ciphertext),
            Err(DecryptionError::Failed)
        ));
    }

    #[test]
    fn tampered_ciphertext_fails_to_decrypt() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let store = store_in(&dir);

        let ciphertext = store.encrypt("credential").expect("encrypt failed");
        let mut payload = BASE64_STANDARD.decode(&ciphertext).unwrap();
        let last = payload.len() - 1;
        payload[last] ^= 0x01;
        let tampered = BASE64_STANDARD.encode(payload);

        assert!(matches!(store.decrypt(&tampered), Err(DecryptionError::Failed)));
    }

    #[test]
    fn malformed_ciphertext_is_rejected() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let store = store_in(&dir);

        assert!(matches!(
            store.decrypt("not base64!!"),
            Err(DecryptionError::Encoding(_))
        ));
        assert!(matches!(
            store.decrypt(&BASE64_STANDARD.encode([0u8; 4])),
            Err(DecryptionError::Truncated)
        ));
    }

    #[test]
    fn invalid_key_file_is_reported() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let key_path = dir.path().join("key.bin");
        std::fs::write(&key_path, b"short").expect("write failed");

        assert!(matches!(
            SecretStore::load_or_create(&key_path),
            Err(SecretStoreError::InvalidKey { .. })
        ));
    }
}
