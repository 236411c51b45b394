//! File persistence for chat history.

use std::path::{Path, PathBuf};

use coverage_core::conversation::Conversation;
use tracing::debug;

use crate::errors::CliError;

/// A conversation stored as a JSON array of messages.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    /// Returns a store backed by `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the conversation; a missing file is an empty conversation.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or holds an invalid history.
    pub async fn load(&self) -> Result<Conversation, CliError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no history yet");
                return Ok(Conversation::new());
            }
            Err(e) => return Err(CliError::io(&self.path, e)),
        };

        if text.trim().is_empty() {
            return Ok(Conversation::new());
        }
        serde_json::from_str(&text).map_err(|source| CliError::Json {
            path: self.path.clone(),
            source,
        })
    }

    /// Writes the conversation, replacing the previous file atomically.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub async fn save(&self, conversation: &Conversation) -> Result<(), CliError> {
        let json = serde_json::to_string_pretty(conversation).map_err(|source| CliError::Json {
            path: self.path.clone(),
            source,
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CliError::io(parent, e))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| CliError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| CliError::io(&self.path, e))?;
        debug!(path = %self.path.display(), turns = conversation.len(), "history saved");
        Ok(())
    }
}
