//! Application state owned by the running shell and threaded through
//! handlers, rather than living in a process-wide global.

use crate::core::config::{Config, ConfigPersistenceError};
use crate::core::conversation::Conversation;
use crate::core::secret::{SecretStore, SecretStoreError};
use std::path::{Path, PathBuf};

pub struct Session {
    pub config: Config,
    pub conversation: Conversation,
    secrets: SecretStore,
    config_path: PathBuf,
}

impl Session {
    /// Build a session from the per-user config directory, creating the
    /// encryption key on first run.
    pub fn initialize() -> Result<Self, SecretStoreError> {
        Self::from_paths(Config::config_path(), &Config::key_path())
    }

    pub fn from_paths(config_path: PathBuf, key_path: &Path) -> Result<Self, SecretStoreError> {
        let secrets = SecretStore::load_or_create(key_path)?;
        let config = Config::load_from_path(&config_path, &secrets);
        Ok(Self {
            config,
            conversation: Conversation::new(),
            secrets,
            config_path,
        })
    }

    /// Persist the current config. Called after every mutation; on failure
    /// the in-memory config is kept and the caller shows a notification.
    pub fn persist(&self) -> Result<(), ConfigPersistenceError> {
        self.config.save_to_path(&self.config_path, &self.secrets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn session_round_trips_config_through_disk() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config_path = temp_dir.path().join("config.json");
        let key_path = temp_dir.path().join("key.bin");

        let mut session =
            Session::from_paths(config_path.clone(), &key_path).expect("initialize failed");
        session.config.api_key = "sk-or-v1-secret".to_string();
        session.config.add_model("openai/gpt-4o");
        session.persist().expect("persist failed");

        let reloaded = Session::from_paths(config_path, &key_path).expect("reload failed");
        assert_eq!(reloaded.config, session.config);
        assert!(reloaded.conversation.messages().is_empty());
    }
}
