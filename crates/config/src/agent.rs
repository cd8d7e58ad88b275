//! Agent configuration

use serde::{Deserialize, Serialize};

use crate::constants::{dialogue, timeouts};

/// Dialogue agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Name the assistant introduces itself with
    #[serde(default = "default_persona_name")]
    pub persona_name: String,

    /// Persona prompt; the built-in prompt is used when empty
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Non-system turns kept in the model context
    #[serde(default = "default_max_context_turns")]
    pub max_context_turns: usize,

    /// Utterances that end the session (case-insensitive)
    #[serde(default = "default_stop_words")]
    pub stop_words: Vec<String>,

    /// Address used as the origin of evacuation routes
    #[serde(default = "default_location")]
    pub current_location: String,

    /// Deadline for each chat, vision and speech call
    #[serde(default = "default_capability_timeout")]
    pub capability_timeout_secs: u64,

    /// Route steps read out in an alert
    #[serde(default = "default_max_alert_steps")]
    pub max_alert_steps: usize,

    /// Where the turn log is written when the session ends
    #[serde(default = "default_transcript_path")]
    pub transcript_path: String,
}

fn default_persona_name() -> String {
    "Dwani AI".to_string()
}

fn default_max_context_turns() -> usize {
    dialogue::MAX_CONTEXT_TURNS
}

fn default_stop_words() -> Vec<String> {
    dialogue::STOP_WORDS.iter().map(|w| w.to_string()).collect()
}

fn default_location() -> String {
    dialogue::DEFAULT_LOCATION.to_string()
}

fn default_capability_timeout() -> u64 {
    timeouts::CAPABILITY_SECS
}

fn default_max_alert_steps() -> usize {
    dialogue::MAX_ALERT_STEPS
}

fn default_transcript_path() -> String {
    "conversation_history.json".to_string()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            persona_name: default_persona_name(),
            system_prompt: None,
            max_context_turns: default_max_context_turns(),
            stop_words: default_stop_words(),
            current_location: default_location(),
            capability_timeout_secs: default_capability_timeout(),
            max_alert_steps: default_max_alert_steps(),
            transcript_path: default_transcript_path(),
        }
    }
}

impl AgentConfig {
    /// True when the whole utterance is one of the stop words.
    ///
    /// Trailing punctuation from speech recognition ("Stop.") is ignored.
    pub fn is_stop_phrase(&self, utterance: &str) -> bool {
        let normalized = utterance
            .trim()
            .trim_end_matches(|c: char| c.is_ascii_punctuation())
            .to_lowercase();
        self.stop_words
            .iter()
            .any(|w| w.trim().to_lowercase() == normalized)
    }
}
