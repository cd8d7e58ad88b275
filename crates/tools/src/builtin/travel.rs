//! Travel options between two places

use std::sync::Arc;

use async_trait::async_trait;
use dwani_navigation::EvacuationPlanner;
use serde_json::Value;

use crate::mcp::{InputSchema, PropertySchema, Tool, ToolError, ToolOutput, ToolSchema};

pub struct GetTravelInformationTool {
    planner: Arc<EvacuationPlanner>,
}

impl GetTravelInformationTool {
    pub fn new(planner: Arc<EvacuationPlanner>) -> Self {
        Self { planner }
    }
}

fn required_str<'a>(input: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    input
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ToolError::invalid_params(format!("{} is required", key)))
}

#[async_trait]
impl Tool for GetTravelInformationTool {
    fn name(&self) -> &str {
        "get_travel_information"
    }

    fn description(&self) -> &str {
        "Get ways to travel between two locations in the city: walking, public transport and taxi"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: InputSchema::object()
                .property(
                    "start_location",
                    PropertySchema::string("Starting address or landmark"),
                    true,
                )
                .property(
                    "end_location",
                    PropertySchema::string("Destination address or landmark"),
                    true,
                ),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let start = required_str(&input, "start_location")?;
        let end = required_str(&input, "end_location")?;

        let info = self.planner.travel_information(start, end).await;

        tracing::info!(
            start = %start,
            end = %end,
            options = info.options.len(),
            "Travel information prepared"
        );

        let value = serde_json::to_value(&info).map_err(|e| ToolError::internal(e.to_string()))?;
        Ok(ToolOutput::json(value))
    }

    /// Two geocoder lookups plus one route request
    fn timeout_secs(&self) -> u64 {
        45
    }
}
