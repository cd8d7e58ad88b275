//! Emergency classification types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How pressing a situation is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl UrgencyLevel {
    /// Lenient parse; anything unrecognised is `Low`
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "medium" | "moderate" => Self::Medium,
            "high" => Self::High,
            "critical" | "severe" | "extreme" => Self::Critical,
            _ => Self::Low,
        }
    }

    /// High or critical urgency calls for immediate evacuation
    pub fn requires_evacuation(&self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of emergency, used to pick a safe place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyType {
    Fire,
    Flood,
    Medical,
    Structural,
    Chemical,
    GasLeak,
    #[default]
    General,
}

impl EmergencyType {
    pub const ALL: [EmergencyType; 7] = [
        Self::Fire,
        Self::Flood,
        Self::Medical,
        Self::Structural,
        Self::Chemical,
        Self::GasLeak,
        Self::General,
    ];

    /// Parse a model-supplied label; `None` when it names no known type
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "fire" => Some(Self::Fire),
            "flood" | "flooding" => Some(Self::Flood),
            "medical" | "injury" => Some(Self::Medical),
            "structural" | "earthquake" | "collapse" => Some(Self::Structural),
            "chemical" | "chemical_spill" => Some(Self::Chemical),
            "gas_leak" | "gas" => Some(Self::GasLeak),
            "general" => Some(Self::General),
            _ => None,
        }
    }

    /// Infer the type from free-text hazard descriptions
    pub fn from_hazards<S: AsRef<str>>(hazards: &[S]) -> Self {
        let text = hazards
            .iter()
            .map(|h| h.as_ref().to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");
        let has_any = |words: &[&str]| words.iter().any(|w| text.contains(w));

        if has_any(&["fire", "smoke", "flame", "burning"]) {
            Self::Fire
        } else if has_any(&["flood", "water", "overflow"]) {
            Self::Flood
        } else if has_any(&["earthquake", "tremor", "seismic", "collapse", "building", "structural"]) {
            Self::Structural
        } else if has_any(&["chemical", "spill", "hazardous", "toxic"]) {
            Self::Chemical
        } else if has_any(&["gas", "leak", "explosion"]) {
            Self::GasLeak
        } else if has_any(&["injur", "bleeding", "unconscious", "medical"]) {
            Self::Medical
        } else {
            Self::General
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fire => "fire",
            Self::Flood => "flood",
            Self::Medical => "medical",
            Self::Structural => "structural",
            Self::Chemical => "chemical",
            Self::GasLeak => "gas_leak",
            Self::General => "general",
        }
    }

    /// Label used in spoken alerts
    pub fn spoken(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl std::fmt::Display for EmergencyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyAssessment {
    pub is_emergency: bool,
    pub urgency_level: UrgencyLevel,
    pub detected_hazards: Vec<String>,
    pub required_action: String,
    pub emergency_type: EmergencyType,
    pub speak: String,
}

impl EmergencyAssessment {
    /// The safe default: nothing detected
    pub fn no_emergency(speak: impl Into<String>) -> Self {
        Self {
            is_emergency: false,
            urgency_level: UrgencyLevel::Low,
            detected_hazards: Vec::new(),
            required_action: "none".to_string(),
            emergency_type: EmergencyType::General,
            speak: speak.into(),
        }
    }

    /// Normalise a decoded model object.
    ///
    /// Only an explicit `true` (boolean or the string "true") marks an
    /// emergency. An unknown `emergency_type` is inferred from the hazards.
    pub fn from_value(value: &Value) -> Self {
        let is_emergency = match value.get("is_emergency") {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
            _ => false,
        };

        let detected_hazards = match value.get("detected_hazards") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
            _ => Vec::new(),
        };

        let emergency_type = value
            .get("emergency_type")
            .and_then(Value::as_str)
            .and_then(EmergencyType::parse)
            .unwrap_or_else(|| EmergencyType::from_hazards(&detected_hazards));

        let text = |key: &str, default: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(default)
                .to_string()
        };

        Self {
            is_emergency,
            urgency_level: value
                .get("urgency_level")
                .and_then(Value::as_str)
                .map(UrgencyLevel::parse_lenient)
                .unwrap_or_default(),
            detected_hazards,
            required_action: text("required_action", "none"),
            emergency_type,
            speak: text("speak", ""),
        }
    }
}

impl Default for EmergencyAssessment {
    fn default() -> Self {
        Self::no_emergency("")
    }
}
