//! Per-session state and summaries

use dwani_core::{EmergencyAssessment, Role, Turn};
use serde::{Deserialize, Serialize};

/// Mutable facts about the current session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    /// Origin used for evacuation routes
    pub current_location: String,
    pub last_assessment: Option<EmergencyAssessment>,
    pub emergency_count: u32,
    /// Utterances handled, including failed ones
    pub turn_count: u32,
}

impl SessionState {
    pub fn new(current_location: impl Into<String>) -> Self {
        Self {
            current_location: current_location.into(),
            last_assessment: None,
            emergency_count: 0,
            turn_count: 0,
        }
    }

    /// Hazards reported by the most recent assessment
    pub fn hazards(&self) -> &[String] {
        self.last_assessment
            .as_ref()
            .map(|a| a.detected_hazards.as_slice())
            .unwrap_or(&[])
    }
}

/// Snapshot of the retained conversation
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    /// User/assistant exchanges in the retained window
    pub total_exchanges: usize,
    pub recent_turns: Vec<Turn>,
    pub emergency_detected: bool,
}

/// Number of trailing turns included in a summary
pub const SUMMARY_RECENT_TURNS: usize = 6;

impl ConversationSummary {
    pub fn from_history(history: &[Turn], emergency_count: u32) -> Self {
        let total_exchanges = history.iter().filter(|t| t.role == Role::User).count();
        let start = history.len().saturating_sub(SUMMARY_RECENT_TURNS);
        let mentions_emergency = history
            .iter()
            .any(|t| t.content.to_lowercase().contains("emergency"));

        Self {
            total_exchanges,
            recent_turns: history[start..].to_vec(),
            emergency_detected: emergency_count > 0 || mentions_emergency,
        }
    }
}

/// Why the dialogue loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    StopPhrase,
    Shutdown,
    /// Speech input failed repeatedly or was closed
    InputUnavailable,
}

/// Returned by the dialogue loop on exit
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub stop_reason: StopReason,
    pub session: SessionState,
    pub conversation: ConversationSummary,
    pub transcript_saved: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts_user_turns() {
        let history = vec![
            Turn::user("Where is the station?"),
            Turn::assistant("Two blocks north."),
            Turn::user("Thanks"),
            Turn::assistant("Stay safe."),
        ];
        let summary = ConversationSummary::from_history(&history, 0);
        assert_eq!(summary.total_exchanges, 2);
        assert_eq!(summary.recent_turns.len(), 4);
        assert!(!summary.emergency_detected);
    }

    #[test]
    fn test_summary_flags_emergency_mentions() {
        let history = vec![Turn::assistant("EMERGENCY ALERT: FIRE detected!")];
        assert!(ConversationSummary::from_history(&history, 0).emergency_detected);
    }

    #[test]
    fn test_recent_turns_are_bounded() {
        let history: Vec<Turn> = (0..10).map(|i| Turn::user(format!("u{}", i))).collect();
        let summary = ConversationSummary::from_history(&history, 1);
        assert_eq!(summary.recent_turns.len(), SUMMARY_RECENT_TURNS);
        assert_eq!(summary.recent_turns[0].content, "u4");
        assert!(summary.emergency_detected);
    }
}
