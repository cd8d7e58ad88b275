//! Language Model traits

use async_trait::async_trait;

use crate::{GenerateRequest, GenerateResponse, Result, ToolDefinition};

/// Language Model interface
///
/// Implementations:
/// - `OpenAIBackend` - any OpenAI-compatible chat completion endpoint
///
/// # Example
///
/// ```ignore
/// let llm: Arc<dyn LanguageModel> = Arc::new(OpenAIBackend::new(config)?);
/// let request = GenerateRequest::new("You are Dwani")
///     .with_user_message("What time is it in Berlin?");
/// let response = llm.generate_with_tools(request, &registry.list_specs()).await?;
/// for call in &response.tool_calls {
///     println!("{} {:?}", call.name, call.arguments);
/// }
/// ```
#[async_trait]
pub trait LanguageModel: Send + Sync + 'static {
    /// Generate a plain completion
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        self.generate_with_tools(request, &[]).await
    }

    /// Generate with tool/function calling
    ///
    /// # Returns
    /// Response whose `text` may be empty when the model only requests tools
    async fn generate_with_tools(
        &self,
        request: GenerateRequest,
        tools: &[ToolDefinition],
    ) -> Result<GenerateResponse>;

    /// Check if the backend is reachable
    async fn is_available(&self) -> bool;

    /// Get model name for logging
    fn model_name(&self) -> &str;
}
