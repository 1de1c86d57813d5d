use std::sync::Arc;

use axum::extract::{Json, State};
use axum::response::sse::Event;
use axum::response::{IntoResponse, Response, Sse};
use futures_util::StreamExt;
use uuid::Uuid;

use super::auth::Authorized;
use crate::error::GatewayError;
use crate::providers::groq::ChatCompletionRequest;
use crate::server::AppState;
use crate::server::streaming::start_relay;

/// 流式聊天入口：鉴权通过后强制走上游流式，并以 SSE 原样回传
pub async fn chat_completions(
    _auth: Authorized,
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<ChatCompletionRequest>,
) -> Result<Response, GatewayError> {
    let request_id = Uuid::new_v4().to_string();
    let events = start_relay(app_state.provider.as_ref(), request, request_id).await?;

    // 不加 keep-alive：输出只含 data 帧
    let out_stream = events.map(|item| item.map(|event| Event::default().data(event.data())));
    Ok(Sse::new(out_stream).into_response())
}
