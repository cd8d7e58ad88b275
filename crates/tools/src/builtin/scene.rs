//! Camera capture and scene description

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dwani_config::constants::DEFAULT_SCENE_PROMPT;
use dwani_core::capability::guard;
use dwani_core::{Error, FrameSource, Result, SceneCache, SceneSnapshot, VisionModel};
use serde_json::{json, Value};

use crate::mcp::{InputSchema, Tool, ToolError, ToolOutput, ToolSchema};

/// Reads a still image from disk on every capture
pub struct FileFrameSource {
    path: PathBuf,
    mime_type: String,
}

impl FileFrameSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mime_type = match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase) {
            Some(ext) if ext == "png" => "image/png",
            Some(ext) if ext == "webp" => "image/webp",
            _ => "image/jpeg",
        }
        .to_string();
        Self { path, mime_type }
    }
}

#[async_trait]
impl FrameSource for FileFrameSource {
    async fn capture(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| Error::unavailable("camera", format!("{}: {}", self.path.display(), e)))
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

/// Frame source plus vision model, publishing into an optional cache
pub struct SceneCapture {
    frames: Arc<dyn FrameSource>,
    vision: Arc<dyn VisionModel>,
    prompt: String,
    timeout: Duration,
    cache: Option<SceneCache>,
}

impl SceneCapture {
    pub fn new(frames: Arc<dyn FrameSource>, vision: Arc<dyn VisionModel>, timeout: Duration) -> Self {
        Self {
            frames,
            vision,
            prompt: DEFAULT_SCENE_PROMPT.to_string(),
            timeout,
            cache: None,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_cache(mut self, cache: SceneCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Capture one frame and describe it
    pub async fn capture_and_describe(&self) -> Result<SceneSnapshot> {
        let frame = guard("camera", self.timeout, self.frames.capture()).await?;
        let description = guard(
            "vision",
            self.timeout,
            self.vision.describe(&frame, self.frames.mime_type(), &self.prompt),
        )
        .await?;

        let snapshot = SceneSnapshot::now(description);
        if let Some(cache) = &self.cache {
            cache.publish(snapshot.clone());
        }

        tracing::debug!(
            model = self.vision.model_name(),
            chars = snapshot.description.len(),
            "Scene described"
        );
        Ok(snapshot)
    }
}

pub struct CaptureAndDescribeSceneTool {
    capture: Option<Arc<SceneCapture>>,
}

impl CaptureAndDescribeSceneTool {
    pub fn new(capture: Arc<SceneCapture>) -> Self {
        Self {
            capture: Some(capture),
        }
    }

    /// Registered when no camera is configured; every call reports an error
    pub fn unavailable() -> Self {
        Self { capture: None }
    }
}

#[async_trait]
impl Tool for CaptureAndDescribeSceneTool {
    fn name(&self) -> &str {
        "capture_and_describe_scene"
    }

    fn description(&self) -> &str {
        "Capture an image from the camera and describe what is visible"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: InputSchema::object(),
        }
    }

    async fn execute(&self, _input: Value) -> std::result::Result<ToolOutput, ToolError> {
        let capture = self
            .capture
            .as_ref()
            .ok_or_else(|| ToolError::unavailable("Camera not available"))?;

        let snapshot = capture.capture_and_describe().await?;

        Ok(ToolOutput::json(json!({
            "description": snapshot.description,
            "timestamp": snapshot.timestamp.to_rfc3339(),
        })))
    }

    fn timeout_secs(&self) -> u64 {
        60
    }
}
