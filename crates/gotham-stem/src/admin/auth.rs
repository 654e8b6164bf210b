use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::warn;

/// Shared secret editors present as `Authorization: Bearer <token>`.
///
/// An unconfigured token authorizes nobody.
#[derive(Debug, Clone, Default)]
pub struct EditorToken(Option<Arc<str>>);

impl EditorToken {
    pub fn new(token: Option<String>) -> Self {
        Self(
            token
                .map(|token| token.trim().to_string())
                .filter(|token| !token.is_empty())
                .map(Arc::from),
        )
    }

    pub fn is_configured(&self) -> bool {
        self.0.is_some()
    }

    pub fn authorizes(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = self.0.as_deref() else {
            return false;
        };
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .is_some_and(|presented| constant_time_eq(presented.trim().as_bytes(), expected.as_bytes()))
    }
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// Middleware guarding the admin API.
pub async fn require_editor(
    State(token): State<EditorToken>,
    request: Request,
    next: Next,
) -> Response {
    if !token.is_configured() {
        warn!(path = %request.uri().path(), "admin request rejected: ADMIN_TOKEN not configured");
        let payload = json!({ "error": "admin access is disabled" });
        return (StatusCode::FORBIDDEN, axum::Json(payload)).into_response();
    }
    if !token.authorizes(request.headers()) {
        let payload = json!({ "error": "missing or invalid bearer token" });
        return (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Bearer")],
            axum::Json(payload),
        )
            .into_response();
    }
    next.run(request).await
}
