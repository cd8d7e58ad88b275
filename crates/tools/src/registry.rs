//! Tool Registry
//!
//! Manages tool registration, discovery, and execution.

use async_trait::async_trait;
use dwani_core::{Error, ToolCall, ToolDefinition};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::mcp::{Tool, ToolError, ToolOutput, ToolSchema};

/// Tool executor trait
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute a tool by name
    async fn execute(&self, name: &str, arguments: Value) -> Result<ToolOutput, ToolError>;

    /// List available tools
    fn list_tools(&self) -> Vec<ToolSchema>;

    /// Get tool schema by name
    fn get_tool(&self, name: &str) -> Option<ToolSchema>;

    /// Function definitions for a chat request, sorted by name
    fn list_specs(&self) -> Vec<ToolDefinition> {
        let mut specs: Vec<ToolDefinition> = self.list_tools().iter().map(ToolSchema::to_definition).collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    /// Run a model-requested call.
    ///
    /// Only an unregistered name is an error. Handler failures, invalid
    /// arguments and timeouts come back as an `{"error": ...}` payload the
    /// model can read.
    async fn dispatch(&self, call: &ToolCall) -> Result<Value, Error> {
        if self.get_tool(&call.name).is_none() {
            return Err(Error::UnknownTool(call.name.clone()));
        }

        match self.execute(&call.name, call.arguments_value()).await {
            Ok(output) if output.is_error => {
                let value = output.to_value();
                Ok(if value.get("error").is_some() {
                    value
                } else {
                    json!({ "error": value })
                })
            }
            Ok(output) => Ok(output.to_value()),
            Err(e) => {
                tracing::warn!(tool = %call.name, call_id = %call.id, error = %e, "Tool failed");
                Ok(json!({ "error": e.message }))
            }
        }
    }
}

/// Tool registry
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let name = tool.name().to_string();
        self.tools.insert(name, Arc::new(tool));
    }

    /// Register a shared tool
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool names, sorted
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    /// Execute a tool under its own timeout
    async fn execute(&self, name: &str, arguments: Value) -> Result<ToolOutput, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::not_found(format!("Tool not found: {}", name)))?;

        tool.validate(&arguments)?;

        let timeout_secs = tool.timeout_secs();
        tracing::debug!(tool = name, timeout_secs = timeout_secs, "Executing tool");

        match tokio::time::timeout(Duration::from_secs(timeout_secs), tool.execute(arguments)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(ToolError::timeout(name, timeout_secs)),
        }
    }

    fn list_tools(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|t| t.schema()).collect()
    }

    fn get_tool(&self, name: &str) -> Option<ToolSchema> {
        self.tools.get(name).map(|t| t.schema())
    }
}
