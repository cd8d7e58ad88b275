//! LLM integration for Dwani
//!
//! Features:
//! - OpenAI-compatible chat completion with native function calling
//! - OpenAI-compatible vision (base64 data URL images)
//! - Persona, classification and situation prompts

pub mod backend;
pub mod prompt;
pub mod vision;

pub use backend::{OpenAIBackend, OpenAIConfig};
pub use prompt::{emergency_prompt, persona_prompt, Situation};
pub use vision::OpenAIVision;

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else if err.is_decode() {
            LlmError::InvalidResponse(err.to_string())
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl LlmError {
    /// Convert into the shared taxonomy, naming the capability that failed
    pub fn into_core(self, capability: &str) -> dwani_core::Error {
        match self {
            LlmError::Timeout => dwani_core::Error::CapabilityTimeout(capability.to_string()),
            LlmError::InvalidResponse(msg) => dwani_core::Error::MalformedModelOutput(msg),
            LlmError::Configuration(msg) => dwani_core::Error::Config(msg),
            LlmError::Api(msg) | LlmError::Network(msg) => {
                dwani_core::Error::unavailable(capability, msg)
            }
        }
    }
}

impl From<LlmError> for dwani_core::Error {
    fn from(err: LlmError) -> Self {
        err.into_core("chat")
    }
}
