//! Shared fixtures for unit tests: a scripted in-process provider and a mock Groq
//! endpoint served by axum on an ephemeral port.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use futures_util::{StreamExt, stream};
use serde_json::{Value, json};

use crate::providers::ChatStreamProvider;
use crate::providers::groq::UpstreamChatRequest;
use crate::providers::streaming::{
    ChunkStream, StreamChatCompletionChunk, StreamError, StreamResult,
};

pub fn chunk_json(content: Option<&str>) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion.chunk",
        "created": 1_700_000_000u64,
        "model": "deepseek-r1-distill-llama-70b",
        "choices": [{
            "index": 0,
            "delta": {"role": "assistant", "content": content},
            "finish_reason": null,
            "logprobs": null
        }]
    })
}

/// Upstream SSE body with one chunk per entry, optionally terminated by `[DONE]`.
pub fn sse_body(contents: &[&str], done: bool) -> String {
    let mut body: String = contents
        .iter()
        .map(|c| format!("data: {}\n\n", chunk_json(Some(*c))))
        .collect();
    if done {
        body.push_str("data: [DONE]\n\n");
    }
    body
}

#[derive(Debug, Clone)]
pub enum Step {
    Chunk(&'static str),
    Fail(&'static str),
    /// Never yields again; used to observe cancellation.
    Hang,
}

pub struct ScriptedProvider {
    steps: Vec<Step>,
    open_error: Option<String>,
    calls: AtomicUsize,
    last_request: Mutex<Option<UpstreamChatRequest>>,
    released: Arc<AtomicBool>,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            open_error: None,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn failing_open(message: &str) -> Self {
        let mut p = Self::new(Vec::new());
        p.open_error = Some(message.to_string());
        p
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<UpstreamChatRequest> {
        self.last_request.lock().unwrap().clone()
    }

    /// Whether the stream handed out by the last call has been dropped.
    pub fn released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

struct ReleaseFlag(Arc<AtomicBool>);

impl Drop for ReleaseFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChatStreamProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn open_chat_stream(&self, request: &UpstreamChatRequest) -> StreamResult<ChunkStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        if let Some(msg) = &self.open_error {
            return Err(StreamError::Stream(msg.clone()));
        }

        let hang = self.steps.iter().any(|s| matches!(s, Step::Hang));
        let items: Vec<StreamResult<StreamChatCompletionChunk>> = self
            .steps
            .iter()
            .take_while(|s| !matches!(s, Step::Hang))
            .map(|s| match s {
                Step::Chunk(text) => {
                    Ok(serde_json::from_value(chunk_json(Some(*text))).unwrap())
                }
                Step::Fail(msg) => Err(StreamError::Stream(msg.to_string())),
                Step::Hang => unreachable!(),
            })
            .collect();
        let tail: ChunkStream = if hang {
            Box::pin(stream::pending())
        } else {
            Box::pin(stream::empty())
        };

        self.released.store(false, Ordering::SeqCst);
        let guard = ReleaseFlag(self.released.clone());
        Ok(Box::pin(stream::iter(items).chain(tail).map(move |item| {
            let _guard = &guard;
            item
        })))
    }
}

/// Serves `total` content chunks lazily and counts how many the relay has pulled.
pub struct CountingProvider {
    total: usize,
    pulled: Arc<AtomicUsize>,
}

impl CountingProvider {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            pulled: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn pulled(&self) -> usize {
        self.pulled.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatStreamProvider for CountingProvider {
    fn name(&self) -> &str {
        "counting"
    }

    async fn open_chat_stream(&self, _request: &UpstreamChatRequest) -> StreamResult<ChunkStream> {
        let pulled = self.pulled.clone();
        let chunks = stream::iter(0..self.total).map(move |i| {
            pulled.fetch_add(1, Ordering::SeqCst);
            let text = format!("tok{i}");
            let chunk: StreamChatCompletionChunk =
                serde_json::from_value(chunk_json(Some(&text))).unwrap();
            StreamResult::Ok(chunk)
        });
        Ok(Box::pin(chunks))
    }
}

#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub authorization: Option<String>,
    pub body: Value,
}

pub struct MockUpstream {
    status: StatusCode,
    content_type: &'static str,
    body: String,
}

struct MockState {
    upstream: MockUpstream,
    seen: Mutex<Vec<SeenRequest>>,
}

pub struct RunningUpstream {
    pub base_url: String,
    state: Arc<MockState>,
}

impl RunningUpstream {
    pub fn requests(&self) -> Vec<SeenRequest> {
        self.state.seen.lock().unwrap().clone()
    }
}

impl MockUpstream {
    pub fn sse(body: String) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: "text/event-stream",
            body,
        }
    }

    pub fn error(status: u16, body: Value) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap(),
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    pub async fn spawn(self) -> RunningUpstream {
        let state = Arc::new(MockState {
            upstream: self,
            seen: Mutex::new(Vec::new()),
        });
        let app = Router::new()
            .route("/v1/chat/completions", post(mock_chat))
            .with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        RunningUpstream {
            base_url: format!("http://{addr}"),
            state,
        }
    }
}

async fn mock_chat(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state
        .seen
        .lock()
        .unwrap()
        .push(SeenRequest { authorization, body });

    let upstream = &state.upstream;
    (
        upstream.status,
        [(header::CONTENT_TYPE, upstream.content_type)],
        upstream.body.clone(),
    )
        .into_response()
}
