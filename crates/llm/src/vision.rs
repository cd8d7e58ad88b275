//! OpenAI-compatible vision backend
//!
//! Sends the frame inline as a base64 `data:` URL next to the prompt.

use async_trait::async_trait;
use base64::Engine;
use dwani_core::VisionModel;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::backend::OpenAIConfig;
use crate::LlmError;

pub struct OpenAIVision {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIVision {
    pub fn new(config: OpenAIConfig) -> Result<Self, LlmError> {
        let client = config.build_client()?;
        Ok(Self { config, client })
    }

    fn build_body(&self, image: &[u8], mime_type: &str, prompt: &str) -> serde_json::Value {
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": prompt},
                    {"type": "image_url", "image_url": {"url": format!("data:{};base64,{}", mime_type, encoded)}}
                ]
            }]
        })
    }

    async fn send(&self, image: &[u8], mime_type: &str, prompt: &str) -> Result<String, LlmError> {
        let response = self
            .client
            .post(self.config.chat_url())
            .headers(self.config.build_headers())
            .json(&self.build_body(image, mime_type, prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, error_text)));
        }

        let response: VisionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| LlmError::InvalidResponse("Empty image description".to_string()))
    }
}

#[async_trait]
impl VisionModel for OpenAIVision {
    async fn describe(&self, image: &[u8], mime_type: &str, prompt: &str) -> dwani_core::Result<String> {
        if image.is_empty() {
            return Err(dwani_core::Error::unavailable("vision", "empty frame"));
        }
        self.send(image, mime_type, prompt)
            .await
            .map_err(|e| e.into_core("vision"))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Deserialize)]
struct VisionResponse {
    choices: Vec<VisionChoice>,
}

#[derive(Debug, Deserialize)]
struct VisionChoice {
    message: VisionMessage,
}

#[derive(Debug, Deserialize)]
struct VisionMessage {
    content: Option<String>,
}
