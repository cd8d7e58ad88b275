//! Current time in an IANA timezone

use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::Tz;
use serde_json::{json, Value};

use crate::mcp::{InputSchema, PropertySchema, Tool, ToolError, ToolOutput, ToolSchema};

pub const DEFAULT_TIMEZONE: &str = "Europe/Berlin";

pub struct GetCurrentTimeTool {
    default_timezone: String,
}

impl GetCurrentTimeTool {
    pub fn new() -> Self {
        Self::with_default_timezone(DEFAULT_TIMEZONE)
    }

    pub fn with_default_timezone(timezone: impl Into<String>) -> Self {
        Self {
            default_timezone: timezone.into(),
        }
    }
}

impl Default for GetCurrentTimeTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for GetCurrentTimeTool {
    fn name(&self) -> &str {
        "get_current_time"
    }

    fn description(&self) -> &str {
        "Get the current date and time in a timezone"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: InputSchema::object().property(
                "timezone",
                PropertySchema::string("IANA timezone name, e.g. 'Europe/Berlin' or 'America/New_York'")
                    .with_default(json!(self.default_timezone)),
                false,
            ),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let timezone = input
            .get("timezone")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|tz| !tz.is_empty())
            .unwrap_or(self.default_timezone.as_str());

        let tz: Tz = timezone
            .parse()
            .map_err(|_| ToolError::invalid_params("Invalid timezone"))?;

        let now = Utc::now().with_timezone(&tz);

        Ok(ToolOutput::json(json!({
            "timezone": timezone,
            "current_time": now.format("%I:%M:%S %p %Z, %A, %B %d, %Y").to_string(),
            "iso": now.to_rfc3339(),
        })))
    }

    fn timeout_secs(&self) -> u64 {
        5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_known_timezone() {
        let output = GetCurrentTimeTool::new()
            .execute(json!({"timezone": "Asia/Kolkata"}))
            .await
            .unwrap()
            .to_value();
        assert_eq!(output["timezone"], "Asia/Kolkata");
        assert!(output["current_time"].as_str().unwrap().contains("IST"));
        assert!(output["iso"].as_str().unwrap().ends_with("+05:30"));
    }

    #[tokio::test]
    async fn test_default_timezone() {
        let output = GetCurrentTimeTool::new().execute(json!({})).await.unwrap().to_value();
        assert_eq!(output["timezone"], DEFAULT_TIMEZONE);
    }

    #[tokio::test]
    async fn test_invalid_timezone() {
        let err = GetCurrentTimeTool::new()
            .execute(json!({"timezone": "Mars/Olympus"}))
            .await
            .unwrap_err();
        assert_eq!(err.message, "Invalid timezone");
    }
}
