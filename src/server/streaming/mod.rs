//! Streaming relay: one inbound request → one upstream streaming call → outbound events.
//!
//! - 上游请求一律强制 `stream=true`，缺省字段按固定默认值补齐
//! - 仅转发带有非空 `delta.content` 的 chunk，其余静默丢弃
//! - 上游正常结束后恰好追加一个 `data: [DONE]`
//! - 在首个事件送出前失败 → 返回错误（由 HTTP 层转为 500）；之后失败 → 终止流，不发 `[DONE]`

use std::pin::Pin;

use chrono::Utc;
use futures_util::{StreamExt, stream};
use tokio_stream::Stream;

use crate::providers::ChatStreamProvider;
use crate::providers::groq::ChatCompletionRequest;
use crate::providers::streaming::{ChunkStream, OutboundEvent, StreamResult};

/// Outbound events for one request. Pulled lazily by the transport, so at most one
/// upstream chunk is in flight; dropping it closes the upstream connection.
pub type RelayStream = Pin<Box<dyn Stream<Item = StreamResult<OutboundEvent>> + Send>>;

struct Relay {
    request_id: String,
    upstream: Option<ChunkStream>,
    pending: Option<OutboundEvent>,
    relayed: usize,
    skipped: usize,
}

impl Relay {
    /// Next event to hand to the caller, or `None` once `[DONE]` or an error was produced.
    async fn advance(&mut self) -> Option<StreamResult<OutboundEvent>> {
        if let Some(event) = self.pending.take() {
            return Some(Ok(event));
        }
        let upstream = self.upstream.as_mut()?;
        loop {
            match upstream.next().await {
                Some(Ok(chunk)) => {
                    if !chunk.has_content() {
                        self.skipped += 1;
                        continue;
                    }
                    return match OutboundEvent::from_chunk(&chunk) {
                        Ok(event) => {
                            self.relayed += 1;
                            Some(Ok(event))
                        }
                        Err(e) => Some(Err(self.abort(e))),
                    };
                }
                Some(Err(e)) => return Some(Err(self.abort(e))),
                None => {
                    self.upstream = None;
                    tracing::info!(
                        request_id = %self.request_id,
                        relayed = self.relayed,
                        skipped = self.skipped,
                        "Upstream stream completed"
                    );
                    return Some(Ok(OutboundEvent::done()));
                }
            }
        }
    }

    fn abort<E: std::fmt::Display>(&mut self, err: E) -> E {
        self.upstream = None;
        tracing::error!(
            request_id = %self.request_id,
            relayed = self.relayed,
            "Relay aborted: {}",
            err
        );
        err
    }
}

impl Drop for Relay {
    fn drop(&mut self) {
        if self.upstream.is_some() {
            tracing::warn!(
                request_id = %self.request_id,
                relayed = self.relayed,
                "Caller went away mid-stream; releasing upstream connection"
            );
        }
    }
}

/// Opens the upstream call and waits for the first relayable event.
///
/// Failures up to that point are returned as `Err`, while the response status can still be
/// chosen. Later failures end the returned stream with an `Err` item and no `[DONE]`.
pub async fn start_relay(
    provider: &dyn ChatStreamProvider,
    request: ChatCompletionRequest,
    request_id: String,
) -> StreamResult<RelayStream> {
    let upstream_req = request.into_upstream();
    let start_time = Utc::now();

    tracing::info!(
        request_id = %request_id,
        provider = provider.name(),
        model = %upstream_req.model,
        messages = upstream_req.messages.len(),
        "Opening upstream stream"
    );

    let upstream = provider.open_chat_stream(&upstream_req).await.map_err(|e| {
        tracing::error!(request_id = %request_id, "Failed to open upstream stream: {}", e);
        e
    })?;

    let mut relay = Relay {
        request_id,
        upstream: Some(upstream),
        pending: None,
        relayed: 0,
        skipped: 0,
    };

    // advance() always yields at least once on a fresh relay
    if let Some(first) = relay.advance().await {
        relay.pending = Some(first?);
    }

    tracing::debug!(
        request_id = %relay.request_id,
        first_event_ms = (Utc::now() - start_time).num_milliseconds(),
        "First event ready"
    );

    Ok(Box::pin(stream::unfold(relay, |mut relay| async move {
        relay.advance().await.map(|item| (item, relay))
    })))
}
