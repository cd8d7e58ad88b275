//! Capability traits
//!
//! Every external capability sits behind one of these traits so the
//! dialogue logic can be driven by real backends or by test mocks.
//!
//! ```text
//! Language:
//!   - LanguageModel: chat completion with optional tool calling
//!
//! Speech:
//!   - SpeechToText: one utterance per call
//!   - TextToSpeech: speak text aloud
//!
//! Vision:
//!   - FrameSource: capture one encoded image
//!   - VisionModel: describe an image
//!
//! Navigation:
//!   - Geocoder: address -> coordinates
//!   - Router: coordinates -> route data
//! ```

mod geo;
mod llm;
mod speech;
mod vision;

pub use geo::{Geocoder, Router};
pub use llm::LanguageModel;
pub use speech::{SpeechToText, TextToSpeech, ALERT_PREFIX};
pub use vision::{FrameSource, VisionModel};
