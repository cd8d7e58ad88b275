//! Configuration management for the Dwani assistant
//!
//! Supports loading configuration from:
//! - YAML/TOML files (`config/default.*`, `config/{env}.*`)
//! - Environment variables (`DWANI__` prefix, `__` separator)
//!
//! The safe-place catalog ships with built-in Düsseldorf defaults and can
//! be replaced from a YAML file.

pub mod agent;
pub mod constants;
pub mod safe_places;
pub mod settings;

pub use agent::AgentConfig;
pub use safe_places::SafePlaceCatalog;
pub use settings::{
    load_settings, LlmSettings, NavigationSettings, ObservabilityConfig, RuntimeEnvironment,
    ServerConfig, Settings, VisionSettings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<ConfigError> for dwani_core::Error {
    fn from(err: ConfigError) -> Self {
        dwani_core::Error::Config(err.to_string())
    }
}
