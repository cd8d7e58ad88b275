//! Core traits and types for the Dwani disaster assistant
//!
//! This crate provides foundational types used across all other crates:
//! - Capability traits (chat, speech, vision, geocoding, routing)
//! - The bounded conversation context
//! - Emergency, reply and navigation value types
//! - Best-effort decoding of structured model output
//! - Error types

pub mod capability;
pub mod conversation;
pub mod emergency;
pub mod error;
pub mod llm_types;
pub mod navigation;
pub mod reply;
pub mod scene;
pub mod structured;
pub mod traits;

pub use conversation::{ConversationContext, Turn, DEFAULT_MAX_RECENT_TURNS};
pub use emergency::{EmergencyAssessment, EmergencyType, UrgencyLevel};
pub use error::{Error, Result};
pub use llm_types::{
    FinishReason, GenerateRequest, GenerateResponse, Message, Role, TokenUsage, ToolCall,
    ToolDefinition,
};
pub use navigation::{
    Coordinates, EvacuationRoute, RouteProfile, RouteStep, SafePlace, TravelInformation,
    TravelOption,
};
pub use reply::{Direction, ReplyAction, StructuredReply, EMPTY_REPLY_APOLOGY};
pub use scene::{SceneCache, SceneSnapshot};

pub use traits::{
    FrameSource, Geocoder, LanguageModel, Router, SpeechToText, TextToSpeech, VisionModel,
    ALERT_PREFIX,
};
