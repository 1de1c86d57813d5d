use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_MODEL: &str = "deepseek-r1-distill-llama-70b";
pub const DEFAULT_TEMPERATURE: f64 = 0.6;
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_TOP_P: f64 = 0.95;
pub const DEFAULT_REASONING_FORMAT: &str = "raw";

/// Chat completion request as callers send it to `/openai/v1/chat/completions`.
///
/// Every field is optional; [`ChatCompletionRequest::into_upstream`] fills the defaults.
/// A JSON `null` is treated the same as an absent field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatCompletionRequest {
    #[serde(default)]
    pub model: Option<String>,
    /// Provider-defined message objects, forwarded as-is.
    #[serde(default)]
    pub messages: Option<Vec<Value>>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub top_p: Option<f64>,
    /// Accepted for compatibility, never honored: the relay always streams.
    #[serde(default)]
    pub stream: Option<bool>,
    #[serde(default)]
    pub reasoning_format: Option<String>,
}

/// Body posted to Groq's OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamChatRequest {
    pub model: String,
    pub messages: Vec<Value>,
    pub temperature: f64,
    pub max_completion_tokens: u32,
    pub top_p: f64,
    pub stream: bool,
    pub reasoning_format: String,
}

impl ChatCompletionRequest {
    pub fn into_upstream(self) -> UpstreamChatRequest {
        UpstreamChatRequest {
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            messages: self.messages.unwrap_or_default(),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_completion_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            top_p: self.top_p.unwrap_or(DEFAULT_TOP_P),
            stream: true,
            reasoning_format: self
                .reasoning_format
                .unwrap_or_else(|| DEFAULT_REASONING_FORMAT.to_string()),
        }
    }
}
