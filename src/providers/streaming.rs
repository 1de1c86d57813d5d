use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::pin::Pin;
use tokio_stream::Stream;

/// 流式传输的 Delta 消息结构
///
/// Provider extensions (e.g. Groq's `reasoning`, `tool_calls`) are kept in `extra` so the
/// re-serialized chunk carries everything upstream sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 流式传输的 Choice Delta
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamChoiceDelta {
    pub index: u32,
    pub delta: StreamMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub logprobs: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 流式传输的响应块
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamChatCompletionChunk {
    pub id: String,
    pub object: String,
    pub created: u64,
    pub model: String,
    #[serde(default)]
    pub choices: Vec<StreamChoiceDelta>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StreamChatCompletionChunk {
    /// True when at least one choice carries non-empty incremental text.
    pub fn has_content(&self) -> bool {
        self.choices
            .iter()
            .any(|c| c.delta.content.as_deref().is_some_and(|s| !s.is_empty()))
    }
}

/// One frame written to the caller: a serialized chunk or the `[DONE]` sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    Chunk(String),
    Done,
}

impl OutboundEvent {
    pub fn from_chunk(chunk: &StreamChatCompletionChunk) -> StreamResult<Self> {
        Ok(Self::Chunk(serde_json::to_string(chunk)?))
    }

    pub fn done() -> Self {
        Self::Done
    }

    pub fn data(&self) -> &str {
        match self {
            Self::Chunk(json) => json,
            Self::Done => "[DONE]",
        }
    }
}

/// 流式传输错误类型
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Upstream error (status {status}): {message}")]
    Upstream { status: u16, message: String },
    #[error("Stream processing error: {0}")]
    Stream(String),
}

/// 流式传输的结果类型
pub type StreamResult<T> = Result<T, StreamError>;

/// Upstream chunks in arrival order; dropping it releases the upstream connection.
pub type ChunkStream =
    Pin<Box<dyn Stream<Item = StreamResult<StreamChatCompletionChunk>> + Send>>;
