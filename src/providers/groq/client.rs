use async_trait::async_trait;
use futures_util::{StreamExt, stream};
use reqwest::header::ACCEPT;
use reqwest_eventsource::retry::Never;
use reqwest_eventsource::{Error as EventSourceError, Event, EventSource, RequestBuilderExt};
use serde_json::Value;

use crate::config::UpstreamConfig;
use crate::error::GatewayError;
use crate::http_client::upstream_client;
use crate::providers::ChatStreamProvider;
use crate::providers::streaming::{
    ChunkStream, StreamChatCompletionChunk, StreamError, StreamResult,
};

use super::types::UpstreamChatRequest;

/// Groq chat completions over its OpenAI-compatible API.
///
/// Holds one `reqwest::Client` (and its connection pool) for the life of the process.
pub struct GroqProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GroqProvider {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn from_config(cfg: &UpstreamConfig) -> Result<Self, GatewayError> {
        Ok(Self::new(upstream_client(cfg)?, &cfg.base_url, &cfg.api_key))
    }

    fn chat_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatStreamProvider for GroqProvider {
    fn name(&self) -> &str {
        "groq"
    }

    async fn open_chat_stream(&self, request: &UpstreamChatRequest) -> StreamResult<ChunkStream> {
        let builder = self
            .client
            .post(self.chat_url())
            .bearer_auth(&self.api_key)
            .header(ACCEPT, "text/event-stream")
            .json(request);

        let mut es = builder
            .eventsource()
            .map_err(|e| StreamError::Stream(e.to_string()))?;
        // 单次尝试：不做任何重连
        es.set_retry_policy(Box::new(Never));

        match es.next().await {
            Some(Ok(Event::Open)) => Ok(chunk_stream(es)),
            Some(Ok(Event::Message(_))) => {
                es.close();
                Err(StreamError::Stream(
                    "upstream sent data before the stream was opened".into(),
                ))
            }
            Some(Err(e)) => {
                es.close();
                Err(upstream_error(e).await)
            }
            None => Err(StreamError::Stream(
                "upstream closed the connection before responding".into(),
            )),
        }
    }
}

/// Turns the SSE event source into typed chunks, ending at `[DONE]` or end of stream.
fn chunk_stream(es: EventSource) -> ChunkStream {
    Box::pin(stream::unfold(Some(es), |state| async move {
        let mut es = state?;
        loop {
            match es.next().await {
                Some(Ok(Event::Open)) => continue,
                Some(Ok(Event::Message(m))) => {
                    if m.data.trim() == "[DONE]" {
                        es.close();
                        return None;
                    }
                    return match parse_chunk(&m.event, &m.data) {
                        Ok(chunk) => Some((Ok(chunk), Some(es))),
                        Err(e) => {
                            es.close();
                            Some((Err(e), None))
                        }
                    };
                }
                Some(Err(EventSourceError::StreamEnded)) | None => {
                    es.close();
                    return None;
                }
                Some(Err(e)) => {
                    es.close();
                    return Some((Err(upstream_error(e).await), None));
                }
            }
        }
    }))
}

fn parse_chunk(event: &str, data: &str) -> StreamResult<StreamChatCompletionChunk> {
    if event == "error" {
        return Err(StreamError::Stream(format!(
            "upstream reported an error: {}",
            error_message(data).unwrap_or_else(|| "unknown error".into())
        )));
    }

    let value: Value = serde_json::from_str(data)?;
    if value.get("error").is_some_and(|e| !e.is_null()) {
        return Err(StreamError::Stream(format!(
            "upstream reported an error: {}",
            error_message(data).unwrap_or_else(|| "unknown error".into())
        )));
    }
    Ok(serde_json::from_value(value)?)
}

async fn upstream_error(err: EventSourceError) -> StreamError {
    match err {
        EventSourceError::InvalidStatusCode(status, response) => {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            StreamError::Upstream {
                status: status.as_u16(),
                message,
            }
        }
        EventSourceError::InvalidContentType(content_type, response) => {
            StreamError::Stream(format!(
                "upstream answered with status {} and content type {:?} instead of an event stream",
                response.status(),
                content_type
            ))
        }
        EventSourceError::Transport(e) => StreamError::Http(e),
        other => StreamError::Stream(other.to_string()),
    }
}

/// Provider error bodies look like `{"error": {"message": ..}}`; anything else is kept raw.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let from_json = serde_json::from_str::<Value>(trimmed).ok().and_then(|v| {
        v.pointer("/error/message")
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    Some(from_json.unwrap_or_else(|| trimmed.to_string()))
}
