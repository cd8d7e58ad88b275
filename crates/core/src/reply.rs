//! Normalised assistant reply

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::emergency::UrgencyLevel;
use crate::structured;

/// Spoken when the model produced nothing usable
pub const EMPTY_REPLY_APOLOGY: &str =
    "I'm sorry, I don't have an answer for that right now. Please try again.";

/// Suggested movement for the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyAction {
    #[default]
    None,
    Navigate,
    Wait,
    Warn,
    Analyze,
}

impl ReplyAction {
    fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "navigate" | "move" | "walk" | "go" | "evacuate" => Self::Navigate,
            "wait" | "stop" => Self::Wait,
            "warn" | "alert" => Self::Warn,
            "analyze" | "analyse" => Self::Analyze,
            _ => Self::None,
        }
    }
}

/// Direction relative to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    None,
    Left,
    Right,
    Forward,
    Backward,
}

impl Direction {
    fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" => Self::Left,
            "right" => Self::Right,
            "forward" | "ahead" | "straight" => Self::Forward,
            "backward" | "back" | "behind" => Self::Backward,
            _ => Self::None,
        }
    }
}

/// What the user hears, plus machine-readable guidance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredReply {
    pub speak: String,
    pub action: ReplyAction,
    pub direction: Direction,
    /// Distance in metres, 0 when unknown
    pub distance: f64,
    pub urgency: UrgencyLevel,
    pub hazards_detected: Vec<String>,
    pub safe_direction: String,
}

impl StructuredReply {
    /// Reply that only speaks `text`
    pub fn spoken(text: impl Into<String>) -> Self {
        Self {
            speak: text.into(),
            action: ReplyAction::None,
            direction: Direction::None,
            distance: 0.0,
            urgency: UrgencyLevel::Low,
            hazards_detected: Vec::new(),
            safe_direction: "none".to_string(),
        }
    }

    /// Normalise raw model text.
    ///
    /// A JSON object anywhere in the text is decoded field by field; any
    /// missing or invalid field takes its default. Without an object the
    /// whole text is spoken. `speak` is never empty.
    pub fn from_model_text(raw: &str) -> Self {
        let raw_trimmed = raw.trim();
        let fallback_speak = if raw_trimmed.is_empty() {
            EMPTY_REPLY_APOLOGY
        } else {
            raw_trimmed
        };

        let value: Value = match structured::decode(raw_trimmed) {
            Ok(value @ Value::Object(_)) => value,
            _ => return Self::spoken(fallback_speak),
        };

        let str_field = |key: &str| value.get(key).and_then(Value::as_str).map(str::trim);

        Self {
            speak: str_field("speak")
                .filter(|s| !s.is_empty())
                .unwrap_or(fallback_speak)
                .to_string(),
            action: str_field("action")
                .map(ReplyAction::parse_lenient)
                .unwrap_or_default(),
            direction: str_field("direction")
                .map(Direction::parse_lenient)
                .unwrap_or_default(),
            distance: value.get("distance").map(parse_distance).unwrap_or(0.0),
            urgency: str_field("urgency")
                .map(UrgencyLevel::parse_lenient)
                .unwrap_or_default(),
            hazards_detected: match value.get("hazards_detected") {
                Some(Value::Array(items)) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                _ => Vec::new(),
            },
            safe_direction: str_field("safe_direction")
                .filter(|s| !s.is_empty())
                .unwrap_or("none")
                .to_string(),
        }
    }
}

/// Numbers pass through; strings yield their leading number ("50 meters")
fn parse_distance(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let numeric: String = s
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            numeric.parse::<f64>().ok()
        }
        _ => None,
    };

    parsed.filter(|d| d.is_finite() && *d >= 0.0).unwrap_or(0.0)
}
