//! Dialogue states and the events published while handling utterances

use dwani_core::{EmergencyType, StructuredReply, UrgencyLevel};
use serde::{Deserialize, Serialize};

/// Where the dialogue loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueState {
    #[default]
    Idle,
    Listening,
    Classifying,
    EmergencyBranch,
    ChatBranch,
    Responding,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AgentEvent {
    StateChanged {
        from: DialogueState,
        to: DialogueState,
    },
    EmergencyDetected {
        emergency_type: EmergencyType,
        urgency: UrgencyLevel,
    },
    EvacuationPlanned {
        destination: Option<String>,
        live_route: bool,
    },
    ToolCall {
        name: String,
        call_id: String,
    },
    ToolResult {
        name: String,
        call_id: String,
        success: bool,
    },
    Response(StructuredReply),
    Error(String),
}
