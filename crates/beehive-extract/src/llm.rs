//! LLM session contract

use async_trait::async_trait;
use beehive_common::Result;

/// One generation request: the rendered prompt plus the output constraints
/// the session must be configured with.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub prompt: String,
    /// Expected response content type.
    pub content_type: &'static str,
    /// JSON schema the response must satisfy.
    pub response_schema: serde_json::Value,
}

/// An LLM provider session. Implementations live outside the core.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a response for the request. The returned string must be the
    /// raw response body (JSON when the request asks for it).
    async fn generate(&self, request: &GenerateRequest) -> Result<String>;
}
