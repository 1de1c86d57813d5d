use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;

use crate::error::{AuthError, GatewayError};
use crate::server::AppState;

/// Proof that the access guard accepted the request. Carries nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authorized;

fn authorization_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

/// Accepts `Bearer <key>` or the bare key; the remainder must equal `expected` exactly.
pub fn check_access_key(provided: Option<&str>, expected: &str) -> Result<Authorized, AuthError> {
    let Some(raw) = provided else {
        return Err(AuthError::MissingCredential);
    };
    let key = raw.strip_prefix("Bearer ").unwrap_or(raw);
    if key.is_empty() || key.as_bytes() != expected.as_bytes() {
        return Err(AuthError::InvalidCredential);
    }
    Ok(Authorized)
}

impl FromRequestParts<Arc<AppState>> for Authorized {
    type Rejection = GatewayError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        check_access_key(authorization_header(&parts.headers), &state.config.access.key).map_err(
            |e| {
                tracing::warn!(path = %parts.uri.path(), "Rejected request: {}", e);
                GatewayError::Auth(e)
            },
        )
    }
}
