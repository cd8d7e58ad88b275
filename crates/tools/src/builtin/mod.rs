//! Built-in tools offered to the chat model

pub mod scene;
pub mod time;
pub mod travel;

pub use scene::{CaptureAndDescribeSceneTool, FileFrameSource, SceneCapture};
pub use time::{GetCurrentTimeTool, DEFAULT_TIMEZONE};
pub use travel::GetTravelInformationTool;
