//! Default values used across the workspace

/// External service endpoints
pub mod endpoints {
    /// OpenAI-compatible chat completion base URL
    pub const LLM_DEFAULT: &str = "http://localhost:11434/v1";

    /// OpenStreetMap Nominatim search
    pub const NOMINATIM_SEARCH: &str = "https://nominatim.openstreetmap.org/search";

    /// OpenRouteService directions, profile appended as a path segment
    pub const OPENROUTESERVICE_DIRECTIONS: &str = "https://api.openrouteservice.org/v2/directions";
}

/// Timeouts in seconds
pub mod timeouts {
    pub const CAPABILITY_SECS: u64 = 30;
    pub const GEOCODER_SECS: u64 = 10;
    pub const ROUTER_SECS: u64 = 15;
    pub const TOOL_SECS: u64 = 30;
}

/// Model defaults
pub mod models {
    pub const CHAT: &str = "gemma3";
    pub const VISION: &str = "gemma3";
    pub const MAX_TOKENS: u32 = 512;
    pub const TEMPERATURE: f32 = 0.4;
}

/// Dialogue defaults
pub mod dialogue {
    pub const MAX_CONTEXT_TURNS: usize = 20;
    pub const STOP_WORDS: [&str; 4] = ["stop", "exit", "quit", "goodbye"];
    pub const DEFAULT_LOCATION: &str = "Heinrich-Heine-Allee, Düsseldorf";
    pub const MAX_ALERT_STEPS: usize = 10;
    pub const SCENE_INTERVAL_SECS: u64 = 10;
    /// Scene descriptions older than this are not offered to the model
    pub const SCENE_MAX_AGE_SECS: i64 = 60;
}

/// Prompt shared by the scene tool and the background monitor
pub const DEFAULT_SCENE_PROMPT: &str =
    "Describe this image in one sentence for a blind user, including key objects and their positions.";

/// User agent sent to the geocoder
pub const GEOCODER_USER_AGENT: &str = "DwaniAI/1.0 (urban disaster assistant)";
