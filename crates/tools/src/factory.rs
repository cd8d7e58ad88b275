//! Registry construction

use std::sync::Arc;

use dwani_navigation::EvacuationPlanner;

use crate::builtin::{CaptureAndDescribeSceneTool, GetCurrentTimeTool, GetTravelInformationTool, SceneCapture};
use crate::registry::ToolRegistry;

/// Registry with the three built-in tools. Without a camera the scene
/// tool is still offered and reports that no camera is available.
pub fn create_default_registry(
    planner: Arc<EvacuationPlanner>,
    scene: Option<Arc<SceneCapture>>,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(GetCurrentTimeTool::new());
    registry.register(GetTravelInformationTool::new(planner));
    match scene {
        Some(capture) => registry.register(CaptureAndDescribeSceneTool::new(capture)),
        None => registry.register(CaptureAndDescribeSceneTool::unavailable()),
    }

    tracing::info!(tools = ?registry.tool_names(), "Created tool registry");
    registry
}
