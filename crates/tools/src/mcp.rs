//! MCP-style tool interface
//!
//! Tools describe their input as a JSON schema, receive a JSON object and
//! return a [`ToolOutput`]. Errors carry JSON-RPC style codes.

use async_trait::async_trait;
use dwani_config::constants::timeouts;
use dwani_core::ToolDefinition;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Tool description sent to the chat model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub input_schema: InputSchema,
}

impl ToolSchema {
    /// Function definition for the chat backend
    pub fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: serde_json::to_value(&self.input_schema).unwrap_or(Value::Null),
        }
    }
}

/// JSON schema of a tool's arguments (always an object)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertySchema>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl InputSchema {
    pub fn object() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }

    pub fn property(mut self, name: &str, schema: PropertySchema, required: bool) -> Self {
        self.properties.insert(name.to_string(), schema);
        if required {
            self.required.push(name.to_string());
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub prop_type: String,
    pub description: String,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl PropertySchema {
    pub fn string(description: &str) -> Self {
        Self {
            prop_type: "string".to_string(),
            description: description.to_string(),
            enum_values: None,
            default: None,
        }
    }

    pub fn enum_type(description: &str, values: Vec<String>) -> Self {
        Self {
            enum_values: Some(values),
            ..Self::string(description)
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// Check one argument against its property schema
pub fn validate_property(name: &str, schema: &PropertySchema, value: &Value) -> Result<(), ToolError> {
    let type_ok = match schema.prop_type.as_str() {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        _ => true,
    };
    if !type_ok {
        return Err(ToolError::invalid_params(format!(
            "{} must be of type {}",
            name, schema.prop_type
        )));
    }

    if let (Some(allowed), Some(s)) = (&schema.enum_values, value.as_str()) {
        if !allowed.iter().any(|a| a == s) {
            return Err(ToolError::invalid_params(format!(
                "{} must be one of: {}",
                name,
                allowed.join(", ")
            )));
        }
    }

    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    Json { value: Value },
}

/// Result of a tool execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolOutput {
    pub fn json(value: Value) -> Self {
        Self {
            content: vec![ContentBlock::Json { value }],
            is_error: false,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Single JSON value for the Tool turn
    pub fn to_value(&self) -> Value {
        match self.content.as_slice() {
            [ContentBlock::Json { value }] => value.clone(),
            [ContentBlock::Text { text }] => serde_json::json!({ "result": text }),
            blocks => Value::Array(
                blocks
                    .iter()
                    .map(|b| match b {
                        ContentBlock::Json { value } => value.clone(),
                        ContentBlock::Text { text } => Value::String(text.clone()),
                    })
                    .collect(),
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    MethodNotFound,
    InvalidParams,
    InternalError,
    Timeout,
    Unavailable,
}

impl ErrorCode {
    /// JSON-RPC numeric code
    pub fn code(&self) -> i32 {
        match self {
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::Timeout => -32001,
            Self::Unavailable => -32002,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ToolError {
    pub code: ErrorCode,
    pub message: String,
}

impl ToolError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MethodNotFound, message)
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unavailable, message)
    }

    pub fn timeout(tool: &str, secs: u64) -> Self {
        Self::new(
            ErrorCode::Timeout,
            format!("Tool '{}' timed out after {}s", tool, secs),
        )
    }
}

impl From<dwani_core::Error> for ToolError {
    fn from(err: dwani_core::Error) -> Self {
        if err.is_capability_failure() {
            Self::unavailable(err.to_string())
        } else {
            Self::internal(err.to_string())
        }
    }
}

/// A callable tool
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn schema(&self) -> ToolSchema;

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError>;

    /// Arguments must be an object with every required property present
    /// and well-typed
    fn validate(&self, input: &Value) -> Result<(), ToolError> {
        let schema = self.schema().input_schema;
        let object = input
            .as_object()
            .ok_or_else(|| ToolError::invalid_params("arguments must be an object"))?;

        for name in &schema.required {
            if object.get(name).map_or(true, Value::is_null) {
                return Err(ToolError::invalid_params(format!("{} is required", name)));
            }
        }

        for (name, value) in object {
            if let Some(prop) = schema.properties.get(name) {
                if !value.is_null() {
                    validate_property(name, prop, value)?;
                }
            }
        }

        Ok(())
    }

    fn timeout_secs(&self) -> u64 {
        timeouts::TOOL_SECS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_serializes_as_json_schema() {
        let schema = InputSchema::object()
            .property("timezone", PropertySchema::string("IANA zone").with_default(json!("UTC")), false)
            .property(
                "mode",
                PropertySchema::enum_type("Travel mode", vec!["walk".into(), "drive".into()]),
                true,
            );

        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(value["type"], "object");
        assert_eq!(value["properties"]["timezone"]["default"], "UTC");
        assert_eq!(value["properties"]["mode"]["enum"], json!(["walk", "drive"]));
        assert_eq!(value["required"], json!(["mode"]));
    }

    #[test]
    fn test_validate_property() {
        let prop = PropertySchema::enum_type("mode", vec!["walk".into()]);
        assert!(validate_property("mode", &prop, &json!("walk")).is_ok());
        assert!(validate_property("mode", &prop, &json!("fly")).is_err());
        assert!(validate_property("mode", &prop, &json!(3)).is_err());
    }

    #[test]
    fn test_output_to_value() {
        assert_eq!(ToolOutput::json(json!({"a": 1})).to_value(), json!({"a": 1}));
        assert_eq!(ToolOutput::text("done").to_value(), json!({"result": "done"}));
    }

    #[test]
    fn test_capability_errors_are_unavailable() {
        let err: ToolError = dwani_core::Error::CapabilityTimeout("vision".into()).into();
        assert_eq!(err.code, ErrorCode::Unavailable);
        let err: ToolError = dwani_core::Error::Routing("no route".into()).into();
        assert_eq!(err.code, ErrorCode::InternalError);
    }
}
