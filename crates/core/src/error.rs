//! Error types shared by every Dwani crate

use thiserror::Error;

/// Result alias used across the workspace
pub type Result<T> = std::result::Result<T, Error>;

/// Shared error taxonomy
///
/// The first three variants describe failures of external capabilities
/// (chat, vision, speech, geocoding, routing). Callers treat them the same
/// way: log, fall back, keep the session alive.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Capability '{0}' timed out")]
    CapabilityTimeout(String),

    #[error("Capability '{capability}' unavailable: {message}")]
    CapabilityUnavailable { capability: String, message: String },

    #[error("Malformed model output: {0}")]
    MalformedModelOutput(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Geocoding failed: {0}")]
    Geocoding(String),

    #[error("Routing failed: {0}")]
    Routing(String),

    #[error("No safe place available for emergency type '{0}'")]
    NoSafePlace(String),

    #[error("Invalid turn: {0}")]
    InvalidTurn(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Build an unavailable error for a named capability
    pub fn unavailable(capability: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CapabilityUnavailable {
            capability: capability.into(),
            message: message.into(),
        }
    }

    /// True for timeouts, unavailability and unparsable model output
    pub fn is_capability_failure(&self) -> bool {
        matches!(
            self,
            Self::CapabilityTimeout(_)
                | Self::CapabilityUnavailable { .. }
                | Self::MalformedModelOutput(_)
        )
    }

    /// Short label for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CapabilityTimeout(_) => "capability_timeout",
            Self::CapabilityUnavailable { .. } => "capability_unavailable",
            Self::MalformedModelOutput(_) => "malformed_model_output",
            Self::UnknownTool(_) => "unknown_tool",
            Self::Geocoding(_) => "geocoding",
            Self::Routing(_) => "routing",
            Self::NoSafePlace(_) => "no_safe_place",
            Self::InvalidTurn(_) => "invalid_turn",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
        }
    }
}
