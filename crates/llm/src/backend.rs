//! OpenAI-compatible chat backend
//!
//! Works with OpenAI, Azure-style gateways and local servers (Ollama,
//! vLLM) that expose `/chat/completions`. Tool definitions are sent as
//! native `tools` and tool calls come back structured, so no reply text
//! is ever interpreted as code.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use dwani_config::{LlmSettings, VisionSettings};
use dwani_core::{
    FinishReason, GenerateRequest, GenerateResponse, LanguageModel, Message, Role, TokenUsage,
    ToolCall, ToolDefinition,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::LlmError;

/// Scene descriptions are one or two sentences
const VISION_MAX_TOKENS: u32 = 200;

/// Configuration for OpenAI-compatible backends
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API base, e.g. `https://api.openai.com/v1`
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    /// Temperature (0-2)
    pub temperature: f32,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 512,
            temperature: 0.4,
            timeout: Duration::from_secs(30),
        }
    }
}

impl OpenAIConfig {
    /// Config for a local OpenAI-compatible server
    pub fn local(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: "not-needed".to_string(),
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn from_settings(settings: &LlmSettings) -> Self {
        Self {
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }

    /// Vision settings, inheriting endpoint and key from the chat model
    pub fn for_vision(vision: &VisionSettings, llm: &LlmSettings) -> Self {
        Self {
            endpoint: vision.endpoint.clone().unwrap_or_else(|| llm.endpoint.clone()),
            api_key: vision.api_key.clone().unwrap_or_else(|| llm.api_key.clone()),
            model: vision.model.clone(),
            max_tokens: VISION_MAX_TOKENS,
            temperature: llm.temperature,
            timeout: Duration::from_secs(vision.timeout_secs),
        }
    }

    fn is_local(&self) -> bool {
        self.endpoint.starts_with("http://localhost") || self.endpoint.starts_with("http://127.0.0.1")
    }

    /// Full URL for chat completions
    pub(crate) fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }

    /// Request headers with bearer auth
    pub(crate) fn build_headers(&self) -> reqwest::header::HeaderMap {
        use reqwest::header::HeaderValue;

        let mut headers = reqwest::header::HeaderMap::new();

        if !self.api_key.is_empty() {
            let auth_value = format!("Bearer {}", self.api_key);
            if let Ok(val) = HeaderValue::from_str(&auth_value) {
                headers.insert(reqwest::header::AUTHORIZATION, val);
            }
        }

        headers.insert(
            reqwest::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        headers
    }

    pub(crate) fn build_client(&self) -> Result<Client, LlmError> {
        if self.api_key.is_empty() && !self.is_local() {
            return Err(LlmError::Configuration(
                "API key required for remote endpoints".to_string(),
            ));
        }

        Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))
    }
}

/// OpenAI-compatible chat backend
pub struct OpenAIBackend {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIBackend {
    pub fn new(config: OpenAIConfig) -> Result<Self, LlmError> {
        let client = config.build_client()?;
        Ok(Self { config, client })
    }

    fn build_request<'a>(
        &'a self,
        request: &'a GenerateRequest,
        tools: &'a [ToolDefinition],
    ) -> ChatRequest<'a> {
        ChatRequest {
            model: request.model.as_deref().unwrap_or(&self.config.model),
            messages: request.messages.iter().map(WireMessage::from).collect(),
            max_tokens: Some(request.max_tokens.unwrap_or(self.config.max_tokens)),
            temperature: Some(request.temperature.unwrap_or(self.config.temperature)),
            tool_choice: if tools.is_empty() { None } else { Some("auto") },
            tools: tools.iter().map(WireTool::from).collect(),
            stream: false,
        }
    }

    async fn send(
        &self,
        request: &GenerateRequest,
        tools: &[ToolDefinition],
    ) -> Result<GenerateResponse, LlmError> {
        let body = self.build_request(request, tools);

        let response = self
            .client
            .post(self.config.chat_url())
            .headers(self.config.build_headers())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, error_text)));
        }

        let response: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        parse_response(response)
    }
}

#[async_trait]
impl LanguageModel for OpenAIBackend {
    async fn generate_with_tools(
        &self,
        request: GenerateRequest,
        tools: &[ToolDefinition],
    ) -> dwani_core::Result<GenerateResponse> {
        let start = std::time::Instant::now();
        let response = self.send(&request, tools).await.map_err(|e| {
            tracing::warn!(error = %e, model = %self.config.model, "Chat completion failed");
            e.into_core("chat")
        })?;

        tracing::debug!(
            model = %self.config.model,
            latency_ms = start.elapsed().as_millis() as u64,
            tool_calls = response.tool_calls.len(),
            "Chat completion finished"
        );

        Ok(response)
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/models", self.config.endpoint.trim_end_matches('/'));
        match self
            .client
            .get(url)
            .headers(self.config.build_headers())
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

fn parse_response(response: ChatResponse) -> Result<GenerateResponse, LlmError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(ToolCall::from)
        .collect();

    Ok(GenerateResponse {
        text: choice.message.content.unwrap_or_default(),
        finish_reason: FinishReason::from_api(choice.finish_reason.as_deref()),
        usage: response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }),
        tool_calls,
    })
}

/// Decode the model's JSON argument string; malformed arguments become an
/// empty map and the tool's own validation reports what is missing
fn parse_arguments(name: &str, raw: &str) -> HashMap<String, serde_json::Value> {
    if raw.trim().is_empty() {
        return HashMap::new();
    }
    match serde_json::from_str(raw) {
        Ok(args) => args,
        Err(e) => {
            tracing::warn!(tool = name, error = %e, "Tool call arguments are not a JSON object");
            HashMap::new()
        }
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
}

impl From<&Message> for WireMessage {
    fn from(msg: &Message) -> Self {
        let tool_calls = if msg.tool_calls.is_empty() {
            None
        } else {
            Some(msg.tool_calls.iter().map(WireToolCall::from).collect())
        };
        // Assistant tool requests carry null content rather than ""
        let content = if msg.role == Role::Assistant && tool_calls.is_some() && msg.content.is_empty() {
            None
        } else {
            Some(msg.content.clone())
        };

        Self {
            role: msg.role.as_str().to_string(),
            content,
            tool_call_id: msg.tool_call_id.clone(),
            tool_calls,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default = "function_type")]
    kind: String,
    function: WireFunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

impl From<&ToolCall> for WireToolCall {
    fn from(call: &ToolCall) -> Self {
        Self {
            id: call.id.clone(),
            kind: function_type(),
            function: WireFunctionCall {
                name: call.name.clone(),
                arguments: call.arguments_value().to_string(),
            },
        }
    }
}

impl From<WireToolCall> for ToolCall {
    fn from(call: WireToolCall) -> Self {
        let id = if call.id.is_empty() {
            format!("call_{}", uuid::Uuid::new_v4().simple())
        } else {
            call.id
        };
        let arguments = parse_arguments(&call.function.name, &call.function.arguments);
        ToolCall::new(id, call.function.name, arguments)
    }
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction<'a>,
}

#[derive(Debug, Serialize)]
struct WireFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a serde_json::Value,
}

impl<'a> From<&'a ToolDefinition> for WireTool<'a> {
    fn from(def: &'a ToolDefinition) -> Self {
        Self {
            kind: "function",
            function: WireFunction {
                name: &def.name,
                description: &def.description,
                parameters: &def.parameters,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: WireMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}
