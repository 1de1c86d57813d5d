//! groq-relay: authenticated SSE relay for Groq chat completions.
//!
//! Callers POST an OpenAI-style chat completion to `/openai/v1/chat/completions` with a
//! static bearer key; the request is forwarded upstream in streaming mode and every chunk
//! that carries text is re-emitted as `data: <json>\n\n`, followed by `data: [DONE]\n\n`.

pub mod config;
pub mod error;
pub mod http_client;
pub mod providers;
pub mod server;

#[cfg(test)]
pub(crate) mod test_support;
