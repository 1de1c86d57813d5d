use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::UpstreamConfig;

fn has_proxy_env() -> bool {
    [
        "HTTPS_PROXY",
        "https_proxy",
        "HTTP_PROXY",
        "http_proxy",
        "ALL_PROXY",
        "all_proxy",
    ]
    .iter()
    .any(|k| std::env::var(k).is_ok_and(|v| !v.trim().is_empty()))
}

fn should_bypass_proxy_impl(cfg: &UpstreamConfig, proxy_env_present: bool) -> bool {
    proxy_env_present && cfg.bypass_proxy
}

pub fn maybe_disable_proxy(builder: ClientBuilder, cfg: &UpstreamConfig) -> ClientBuilder {
    if should_bypass_proxy_impl(cfg, has_proxy_env()) {
        tracing::info!(
            "Proxy environment detected but bypass_proxy is set; calling upstream directly"
        );
        builder.no_proxy()
    } else {
        builder
    }
}

/// Builds the single upstream client shared by all requests.
///
/// Only the connect phase is bounded: a streaming completion may legitimately stay open
/// for minutes, so no overall request timeout is set.
pub fn upstream_client(cfg: &UpstreamConfig) -> Result<reqwest::Client, reqwest::Error> {
    let builder = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));
    maybe_disable_proxy(builder, cfg).build()
}
