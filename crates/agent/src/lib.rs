//! Dialogue agent for the Dwani disaster assistant
//!
//! Features:
//! - Out-of-band emergency classification of every utterance
//! - Evacuation alerts that bypass the chat model's tool loop
//! - Chat turns with one bounded round of tool calls
//! - Background scene monitoring into a shared cache
//! - Transcript persistence at session end

pub mod classifier;
pub mod dialogue_loop;
pub mod events;
pub mod orchestrator;
pub mod scene_monitor;
pub mod session;
pub mod transcript;

pub use classifier::EmergencyClassifier;
pub use dialogue_loop::{run_dialogue, SharedOrchestrator};
pub use events::{AgentEvent, DialogueState};
pub use orchestrator::{DialogueOrchestrator, OrchestratorBuilder, FAILED_TURN_APOLOGY};
pub use scene_monitor::spawn_scene_monitor;
pub use session::{ConversationSummary, SessionState, SessionSummary, StopReason};
pub use transcript::{JsonTranscriptStore, TranscriptStore};

use thiserror::Error;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Empty utterance")]
    EmptyUtterance,

    /// A turn broke the conversation invariants; this is a bug
    #[error("Invalid turn: {0}")]
    InvalidTurn(String),

    #[error("Capability error: {0}")]
    Capability(String),

    #[error("Transcript error: {0}")]
    Transcript(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<dwani_core::Error> for AgentError {
    fn from(err: dwani_core::Error) -> Self {
        match err {
            dwani_core::Error::InvalidTurn(msg) => AgentError::InvalidTurn(msg),
            dwani_core::Error::Config(msg) => AgentError::Config(msg),
            dwani_core::Error::Io(e) => AgentError::Transcript(e.to_string()),
            dwani_core::Error::Serialization(e) => AgentError::Transcript(e.to_string()),
            other => AgentError::Capability(other.to_string()),
        }
    }
}
