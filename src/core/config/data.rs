/// Models offered when the user has not configured any of their own.
pub const DEFAULT_MODELS: [&str; 2] = ["openai/gpt-3.5-turbo", "anthropic/claude-3-haiku"];

/// In-memory configuration: the decrypted credential plus the model list.
///
/// The `api_key` field is always plaintext here; it only exists in encrypted
/// form on disk (see [`io`](super::io)). The model list is ordered for
/// display, holds no duplicates, and is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_key: String,
    pub models: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            models: default_models(),
        }
    }
}

pub(crate) fn default_models() -> Vec<String> {
    DEFAULT_MODELS.iter().map(|m| m.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddModelOutcome {
    Added,
    AlreadyExists,
    InvalidName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveModelOutcome {
    Removed,
    /// Refused: the model list must never become empty.
    LastModel,
    NotFound,
}

impl Config {
    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Append a model identifier, preserving display order and uniqueness.
    pub fn add_model(&mut self, name: &str) -> AddModelOutcome {
        let name = name.trim();
        if name.is_empty() {
            return AddModelOutcome::InvalidName;
        }
        if self.models.iter().any(|m| m == name) {
            return AddModelOutcome::AlreadyExists;
        }
        self.models.push(name.to_string());
        AddModelOutcome::Added
    }

    /// Remove a model identifier, refusing to drop the last one.
    pub fn remove_model(&mut self, name: &str) -> RemoveModelOutcome {
        if !self.models.iter().any(|m| m == name) {
            return RemoveModelOutcome::NotFound;
        }
        if self.models.len() <= 1 {
            return RemoveModelOutcome::LastModel;
        }
        self.models.retain(|m| m != name);
        RemoveModelOutcome::Removed
    }

    /// The model used when none is named on the command line.
    pub fn first_model(&self) -> &str {
        self.models
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_MODELS[0])
    }
}
