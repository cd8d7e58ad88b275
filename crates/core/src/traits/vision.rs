//! Vision traits

use async_trait::async_trait;

use crate::Result;

/// Source of camera frames (encoded images, e.g. JPEG)
#[async_trait]
pub trait FrameSource: Send + Sync + 'static {
    async fn capture(&self) -> Result<Vec<u8>>;

    /// MIME type of captured frames
    fn mime_type(&self) -> &str {
        "image/jpeg"
    }
}

/// Image description model
///
/// # Example
///
/// ```ignore
/// let frame = frames.capture().await?;
/// let description = vision.describe(&frame, frames.mime_type(), DEFAULT_SCENE_PROMPT).await?;
/// ```
#[async_trait]
pub trait VisionModel: Send + Sync + 'static {
    /// Describe `image` following `prompt`
    async fn describe(&self, image: &[u8], mime_type: &str, prompt: &str) -> Result<String>;

    /// Get model name for logging
    fn model_name(&self) -> &str;
}
