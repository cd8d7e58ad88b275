//! Prompt building
//!
//! The persona prompt asks for the structured reply shape; the
//! classification prompt asks for an emergency assessment. Both are
//! decoded with `dwani_core::structured`.

use serde::{Deserialize, Serialize};

/// What the assistant currently knows about the user's surroundings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Situation {
    pub location: String,
    #[serde(default)]
    pub hazards: Vec<String>,
    #[serde(default)]
    pub safe_places: Vec<String>,
    /// Latest camera description
    #[serde(default)]
    pub scene: Option<String>,
}

impl Situation {
    pub fn at(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            ..Default::default()
        }
    }

    /// Preamble prepended to the user's words in the chat branch
    pub fn preamble(&self) -> String {
        let hazards = if self.hazards.is_empty() {
            "None detected".to_string()
        } else {
            self.hazards.join(", ")
        };
        let safe_places = if self.safe_places.is_empty() {
            "None identified".to_string()
        } else {
            self.safe_places.iter().take(3).cloned().collect::<Vec<_>>().join(", ")
        };

        let mut text = format!(
            "Live Situation:\n- User Location: {}\n- Detected Hazards: {}\n- Nearest Safe Places: {}\n",
            self.location, hazards, safe_places
        );
        if let Some(scene) = &self.scene {
            text.push_str(&format!("- Camera View: {}\n", scene));
        }
        text
    }

    /// One-line form for the classification prompt
    fn brief(&self) -> String {
        let mut text = format!(
            "Context: Location={}, Hazards=[{}]",
            self.location,
            self.hazards.join(", ")
        );
        if let Some(scene) = &self.scene {
            text.push_str(&format!(", Camera view={}", scene));
        }
        text.push_str(". ");
        text
    }
}

/// System prompt for the assistant persona
pub fn persona_prompt(name: &str) -> String {
    format!(
        r#"You are {name}, a voice-based urban disaster assistant for smart cities.

Your core capabilities:
- Detect and analyze hazards from the environment
- Help users evacuate safely during emergencies
- Provide clear navigation guidance
- Answer questions about safety and urban navigation
- Maintain calm, authoritative communication

You can call tools to get the current time in a timezone, describe what the camera sees, and look up travel options between two places. Use them whenever they help answer the user.

Always respond with a JSON object in this format:
{{
  "speak": "Your voice message to the user",
  "action": "navigate|wait|warn|analyze|none",
  "direction": "left|right|forward|backward|none",
  "distance": 0,
  "urgency": "low|medium|high|critical",
  "hazards_detected": ["list", "of", "hazards"],
  "safe_direction": "direction_to_safety"
}}

"distance" is a number of meters. Stay focused on safety, be concise but informative, and always prioritize user safety."#
    )
}

/// Single-shot classification prompt for one utterance
pub fn emergency_prompt(utterance: &str, situation: Option<&Situation>) -> String {
    let context = situation.map(Situation::brief).unwrap_or_default();
    format!(
        r#"{context}Analyze this message for emergency intent and urgency:
"{utterance}"

Provide response in JSON format:
{{
    "is_emergency": true/false,
    "urgency_level": "low/medium/high/critical",
    "detected_hazards": ["list of hazards mentioned"],
    "required_action": "immediate action needed",
    "emergency_type": "fire/flood/medical/structural/chemical/gas_leak/general",
    "speak": "voice message for user"
}}
Only set is_emergency to true when the message describes a real, current danger."#
    )
}
