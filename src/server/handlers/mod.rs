use axum::{
    Json, Router,
    routing::{get, post},
};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::server::AppState;

pub mod auth;
mod chat;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(root))
        .route("/openai/v1/chat/completions", post(chat::chat_completions))
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Server is running" }))
}
