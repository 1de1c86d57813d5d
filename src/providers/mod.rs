pub mod groq;
pub mod streaming;

use async_trait::async_trait;

pub use groq::GroqProvider;

use groq::UpstreamChatRequest;
use streaming::{ChunkStream, StreamResult};

/// The one operation the relay needs from an upstream: open a streaming completion.
///
/// Implementations are shared by every in-flight request and must not hold per-request
/// state. An `Ok` means the upstream accepted the call; errors after that arrive through
/// the returned stream.
#[async_trait]
pub trait ChatStreamProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn open_chat_stream(&self, request: &UpstreamChatRequest) -> StreamResult<ChunkStream>;
}
