//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{dialogue, endpoints, models, timeouts, DEFAULT_SCENE_PROMPT, GEOCODER_USER_AGENT};
use crate::{AgentConfig, ConfigError};

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Relaxed validation
    #[default]
    Development,
    Staging,
    /// All validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    /// Chat model
    #[serde(default)]
    pub llm: LlmSettings,

    /// Vision model and background scene capture
    #[serde(default)]
    pub vision: VisionSettings,

    /// Geocoding, routing and the safe-place catalog
    #[serde(default)]
    pub navigation: NavigationSettings,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// HTTP server and console loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// CORS allowed origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Run the stdin/stdout voice loop next to the HTTP API
    #[serde(default = "default_true")]
    pub console_enabled: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            console_enabled: true,
        }
    }
}

/// OpenAI-compatible chat endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    /// Usually supplied through `DWANI__LLM__API_KEY`
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_chat_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_capability_timeout")]
    pub timeout_secs: u64,
}

fn default_llm_endpoint() -> String {
    endpoints::LLM_DEFAULT.to_string()
}

fn default_chat_model() -> String {
    models::CHAT.to_string()
}

fn default_temperature() -> f32 {
    models::TEMPERATURE
}

fn default_max_tokens() -> u32 {
    models::MAX_TOKENS
}

fn default_capability_timeout() -> u64 {
    timeouts::CAPABILITY_SECS
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            api_key: String::new(),
            model: default_chat_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_capability_timeout(),
        }
    }
}

impl LlmSettings {
    /// Local endpoints do not need an API key
    pub fn is_local(&self) -> bool {
        self.endpoint.starts_with("http://localhost") || self.endpoint.starts_with("http://127.0.0.1")
    }
}

/// Vision model and scene capture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionSettings {
    #[serde(default)]
    pub enabled: bool,

    /// Falls back to the chat endpoint when empty
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_vision_model")]
    pub model: String,

    #[serde(default = "default_scene_prompt")]
    pub prompt: String,

    #[serde(default = "default_scene_interval")]
    pub scene_interval_secs: u64,

    /// Image file re-read on every capture; stands in for a camera
    #[serde(default)]
    pub frame_path: Option<String>,

    #[serde(default = "default_capability_timeout")]
    pub timeout_secs: u64,
}

fn default_vision_model() -> String {
    models::VISION.to_string()
}

fn default_scene_prompt() -> String {
    DEFAULT_SCENE_PROMPT.to_string()
}

fn default_scene_interval() -> u64 {
    dialogue::SCENE_INTERVAL_SECS
}

impl Default for VisionSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            api_key: None,
            model: default_vision_model(),
            prompt: default_scene_prompt(),
            scene_interval_secs: default_scene_interval(),
            frame_path: None,
            timeout_secs: default_capability_timeout(),
        }
    }
}

/// Geocoder, router and safe places
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationSettings {
    #[serde(default = "default_geocoder_endpoint")]
    pub geocoder_endpoint: String,

    #[serde(default = "default_geocoder_user_agent")]
    pub geocoder_user_agent: String,

    #[serde(default = "default_geocoder_timeout")]
    pub geocoder_timeout_secs: u64,

    #[serde(default = "default_router_endpoint")]
    pub router_endpoint: String,

    /// Usually supplied through `DWANI__NAVIGATION__ROUTER_API_KEY`
    #[serde(default)]
    pub router_api_key: String,

    #[serde(default = "default_router_timeout")]
    pub router_timeout_secs: u64,

    /// YAML catalog replacing the built-in safe places
    #[serde(default)]
    pub safe_places_path: Option<String>,
}

fn default_geocoder_endpoint() -> String {
    endpoints::NOMINATIM_SEARCH.to_string()
}

fn default_geocoder_user_agent() -> String {
    GEOCODER_USER_AGENT.to_string()
}

fn default_geocoder_timeout() -> u64 {
    timeouts::GEOCODER_SECS
}

fn default_router_endpoint() -> String {
    endpoints::OPENROUTESERVICE_DIRECTIONS.to_string()
}

fn default_router_timeout() -> u64 {
    timeouts::ROUTER_SECS
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            geocoder_endpoint: default_geocoder_endpoint(),
            geocoder_user_agent: default_geocoder_user_agent(),
            geocoder_timeout_secs: default_geocoder_timeout(),
            router_endpoint: default_router_endpoint(),
            router_api_key: String::new(),
            router_timeout_secs: default_router_timeout(),
            safe_places_path: None,
        }
    }
}

/// Logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_agent()?;
        self.validate_llm()?;
        self.validate_timeouts()?;
        Ok(())
    }

    fn validate_agent(&self) -> Result<(), ConfigError> {
        let agent = &self.agent;

        if agent.max_context_turns == 0 {
            return Err(ConfigError::invalid(
                "agent.max_context_turns",
                "Must keep at least one turn",
            ));
        }

        if agent.stop_words.iter().all(|w| w.trim().is_empty()) {
            return Err(ConfigError::invalid(
                "agent.stop_words",
                "At least one stop word is required to end a session",
            ));
        }

        if agent.current_location.trim().is_empty() {
            return Err(ConfigError::MissingField("agent.current_location".to_string()));
        }

        Ok(())
    }

    fn validate_llm(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::invalid(
                "llm.temperature",
                format!("Must be between 0.0 and 2.0, got {}", self.llm.temperature),
            ));
        }

        if self.environment.is_production() && self.llm.api_key.is_empty() && !self.llm.is_local() {
            return Err(ConfigError::MissingField("llm.api_key".to_string()));
        }

        Ok(())
    }

    fn validate_timeouts(&self) -> Result<(), ConfigError> {
        let checks = [
            ("agent.capability_timeout_secs", self.agent.capability_timeout_secs),
            ("llm.timeout_secs", self.llm.timeout_secs),
            ("vision.timeout_secs", self.vision.timeout_secs),
            ("vision.scene_interval_secs", self.vision.scene_interval_secs),
            ("navigation.geocoder_timeout_secs", self.navigation.geocoder_timeout_secs),
            ("navigation.router_timeout_secs", self.navigation.router_timeout_secs),
        ];

        for (field, value) in checks {
            if value == 0 {
                return Err(ConfigError::invalid(field, "Must be greater than zero"));
            }
        }

        Ok(())
    }
}

/// Load settings from files and environment.
///
/// Priority: `DWANI__*` env vars > `config/{env}` > `config/default` > defaults
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("DWANI")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.agent.max_context_turns, 20);
        assert_eq!(settings.navigation.router_timeout_secs, 15);
        assert_eq!(settings.navigation.geocoder_timeout_secs, 10);
        assert!(!settings.vision.enabled);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_zero_context_rejected() {
        let mut settings = Settings::default();
        settings.agent.max_context_turns = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_temperature_range() {
        let mut settings = Settings::default();
        settings.llm.temperature = 3.5;
        assert!(settings.validate().is_err());

        settings.llm.temperature = 1.0;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut settings = Settings::default();
        settings.navigation.router_timeout_secs = 0;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("navigation.router_timeout_secs"));
    }

    #[test]
    fn test_production_requires_remote_api_key() {
        let mut settings = Settings::default();
        settings.environment = RuntimeEnvironment::Production;
        settings.llm.endpoint = "https://api.openai.com/v1".to_string();
        assert!(settings.validate().is_err());

        settings.llm.api_key = "sk-test".to_string();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_empty_stop_words_rejected() {
        let mut settings = Settings::default();
        settings.agent.stop_words = vec!["  ".to_string()];
        assert!(settings.validate().is_err());
    }
}
