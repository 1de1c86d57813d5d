pub mod client;
pub mod types;

pub use client::GroqProvider;
pub use types::{ChatCompletionRequest, UpstreamChatRequest};
