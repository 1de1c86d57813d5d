pub mod handlers;
pub(crate) mod response;
pub mod streaming;

use crate::config::Settings;
use crate::providers::ChatStreamProvider;
use axum::Router;
use std::sync::Arc;

/// Process-wide state; read-only once the server is running.
pub struct AppState {
    pub config: Settings,
    pub provider: Arc<dyn ChatStreamProvider>,
}

pub fn create_app(config: Settings, provider: Arc<dyn ChatStreamProvider>) -> Router {
    let app_state = AppState { config, provider };

    let mut app = handlers::routes().with_state(Arc::new(app_state));

    // CORS：放行任意来源/方法/请求头并允许携带凭据（通配符与 credentials 不可同用，故反射请求值）
    use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
    let cors = CorsLayer::new()
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true);
    app = app
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http());

    app
}
