use crate::core::config::data::{default_models, Config};
use crate::core::secret::{EncryptionError, SecretStore};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::warn;

/// On-disk shape of the config document. The credential is ciphertext here
/// and only ever plaintext in [`Config`].
#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    api_key: String,
    #[serde(default)]
    models: Vec<String>,
}

/// Errors that can occur when persisting configuration to disk.
#[derive(Debug)]
pub enum ConfigPersistenceError {
    /// Failed to write the configuration file or its parent directory.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The credential could not be encrypted for storage.
    Encrypt(EncryptionError),
    /// The document could not be serialized as JSON.
    Serialize(serde_json::Error),
}

impl fmt::Display for ConfigPersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigPersistenceError::Io { path, source } => {
                write!(f, "Failed to write config at {}: {}", path.display(), source)
            }
            ConfigPersistenceError::Encrypt(source) => write!(f, "{source}"),
            ConfigPersistenceError::Serialize(source) => {
                write!(f, "Failed to serialize config: {source}")
            }
        }
    }
}

impl StdError for ConfigPersistenceError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigPersistenceError::Io { source, .. } => Some(source),
            ConfigPersistenceError::Encrypt(source) => Some(source),
            ConfigPersistenceError::Serialize(source) => Some(source),
        }
    }
}

impl Config {
    /// Read the config document, decrypting the stored credential.
    ///
    /// Never fails: a missing or unparsable file yields the defaults, a
    /// credential that cannot be decrypted is treated as absent, and an
    /// empty model list is replaced with the default set.
    pub fn load_from_path(config_path: &Path, secrets: &SecretStore) -> Config {
        let document = match fs::read_to_string(config_path) {
            Ok(contents) => match serde_json::from_str::<ConfigDocument>(&contents) {
                Ok(document) => document,
                Err(err) => {
                    warn!("Ignoring unparsable config at {}: {err}", config_path.display());
                    ConfigDocument::default()
                }
            },
            Err(_) => ConfigDocument::default(),
        };

        let api_key = if document.api_key.is_empty() {
            String::new()
        } else {
            match secrets.decrypt(&document.api_key) {
                Ok(plaintext) => plaintext,
                Err(err) => {
                    warn!("Stored credential could not be decrypted, treating as absent: {err}");
                    String::new()
                }
            }
        };

        let models = if document.models.is_empty() {
            default_models()
        } else {
            document.models
        };

        Config { api_key, models }
    }

    /// Serialize and atomically write the config, encrypting the credential.
    ///
    /// An empty credential is stored as-is rather than encrypted, so a
    /// cleared key reads back as "no credential" without touching the
    /// secret store.
    pub fn save_to_path(
        &self,
        config_path: &Path,
        secrets: &SecretStore,
    ) -> Result<(), ConfigPersistenceError> {
        let api_key = if self.api_key.is_empty() {
            String::new()
        } else {
            secrets
                .encrypt(&self.api_key)
                .map_err(ConfigPersistenceError::Encrypt)?
        };
        let document = ConfigDocument {
            api_key,
            models: self.models.clone(),
        };
        let contents =
            serde_json::to_string_pretty(&document).map_err(ConfigPersistenceError::Serialize)?;

        let io_err = |source| ConfigPersistenceError::Io {
            path: config_path.to_path_buf(),
            source,
        };

        let parent = config_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty());
        if let Some(dir) = parent {
            fs::create_dir_all(dir).map_err(io_err)?;
        }

        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir),
            None => NamedTempFile::new(),
        }
        .map_err(io_err)?;
        temp_file.write_all(contents.as_bytes()).map_err(io_err)?;
        temp_file.as_file_mut().sync_all().map_err(io_err)?;
        temp_file
            .persist(config_path)
            .map_err(|err| io_err(err.error))?;
        Ok(())
    }

    fn project_dir() -> PathBuf {
        let proj_dirs =
            ProjectDirs::from("org", "tandem", "tandem").expect("Failed to determine config directory");
        proj_dirs.config_dir().to_path_buf()
    }

    pub fn config_path() -> PathBuf {
        Self::project_dir().join("config.json")
    }

    pub fn key_path() -> PathBuf {
        Self::project_dir().join("key.bin")
    }
}
