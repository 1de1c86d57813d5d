use std::sync::Arc;

use groq_relay::config::Settings;
use groq_relay::providers::{ChatStreamProvider, GroqProvider};
use groq_relay::server;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env 可选；缺失时只用进程环境变量
    let dotenv = dotenvy::dotenv();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "groq_relay=info,tower_http=info".into()),
        )
        .init();

    if let Ok(path) = dotenv {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let config = Settings::load()?;
    let addr = config.listen_addr();

    // 上游客户端：启动时创建一次，所有请求只读共享，关停后释放
    let provider: Arc<dyn ChatStreamProvider> =
        Arc::new(GroqProvider::from_config(&config.upstream)?);
    tracing::info!(base_url = %config.upstream.base_url, "Upstream client ready");

    let app = server::create_app(config, provider.clone());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Relay server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    drop(provider);
    tracing::info!("Upstream client released, shutting down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
