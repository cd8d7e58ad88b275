//! Conversation transcript persistence

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dwani_core::{ConversationContext, Turn};

use crate::AgentError;

/// Durable storage for the turn log
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    async fn save(&self, turns: &[Turn]) -> Result<(), AgentError>;

    /// `None` when nothing has been saved yet
    async fn load(&self) -> Result<Option<Vec<Turn>>, AgentError>;

    /// Rebuild a context from the saved log
    async fn restore(&self, max_recent: usize) -> Result<Option<ConversationContext>, AgentError> {
        match self.load().await? {
            Some(turns) => Ok(Some(ConversationContext::from_turns(turns, max_recent)?)),
            None => Ok(None),
        }
    }
}

/// Pretty-printed JSON array of turns in a single file
pub struct JsonTranscriptStore {
    path: PathBuf,
}

impl JsonTranscriptStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TranscriptStore for JsonTranscriptStore {
    async fn save(&self, turns: &[Turn]) -> Result<(), AgentError> {
        let json = serde_json::to_string_pretty(turns)
            .map_err(|e| AgentError::Transcript(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AgentError::Transcript(format!("{}: {}", parent.display(), e)))?;
        }

        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| AgentError::Transcript(format!("{}: {}", self.path.display(), e)))?;

        tracing::info!(path = %self.path.display(), turns = turns.len(), "Transcript saved");
        Ok(())
    }

    async fn load(&self) -> Result<Option<Vec<Turn>>, AgentError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AgentError::Transcript(format!("{}: {}", self.path.display(), e)))
            }
        };

        let turns: Vec<Turn> =
            serde_json::from_str(&raw).map_err(|e| AgentError::Transcript(e.to_string()))?;
        Ok(Some(turns))
    }
}
