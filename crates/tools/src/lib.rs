//! Tools for the Dwani assistant
//!
//! MCP-style tool interface, the registry the dialogue loop dispatches
//! model tool calls through, and the built-in tools:
//! `get_current_time`, `capture_and_describe_scene`,
//! `get_travel_information`.

pub mod builtin;
pub mod factory;
pub mod mcp;
pub mod registry;

pub use builtin::{
    CaptureAndDescribeSceneTool, FileFrameSource, GetCurrentTimeTool, GetTravelInformationTool,
    SceneCapture,
};
pub use factory::create_default_registry;
pub use mcp::{
    validate_property, ContentBlock, ErrorCode, InputSchema, PropertySchema, Tool, ToolError,
    ToolOutput, ToolSchema,
};
pub use registry::{ToolExecutor, ToolRegistry};
