use crate::infra::{AppState, MediaRoot, Services};
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use gotham_stem::admin::admin_router;
use gotham_stem::contact::contact_router;
use gotham_stem::directory::directory_router;
use gotham_stem::newsletter::newsletter_router;
use gotham_stem::pages::pages_router;
use gotham_stem::pages::router::not_found;
use serde_json::json;
use std::path::{Component, PathBuf};
use std::sync::atomic::Ordering;
use tracing::warn;

pub(crate) fn with_site_routes(services: &Services) -> Router {
    let site = services.site.clone();
    let fallback_site = services.site.clone();

    pages_router(site.clone(), services.editors.clone())
        .merge(directory_router(services.directory.clone(), site.clone()))
        .merge(contact_router(services.contact.clone(), site.clone()))
        .merge(newsletter_router(services.newsletter.clone(), site))
        .merge(admin_router(services.admin.clone(), services.editors.clone()))
        .route("/media/*path", get(media_endpoint))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .fallback(move || {
            let site = fallback_site.clone();
            async move { not_found(&site).await }
        })
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let mut ready = state.readiness.load(Ordering::Relaxed);
    if ready {
        if let Some(database) = &state.database {
            if let Err(err) = database.ping().await {
                warn!(error = %err, "readiness check could not reach the database");
                ready = false;
            }
        }
    }

    if ready {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "initializing" })),
        )
    }
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Relative media path with every component checked; `None` when it would leave the root.
fn media_path(raw: &str) -> Option<PathBuf> {
    let relative = PathBuf::from(raw.trim_start_matches('/'));
    let safe = relative
        .components()
        .all(|component| matches!(component, Component::Normal(_)));
    (safe && !relative.as_os_str().is_empty()).then_some(relative)
}

pub(crate) async fn media_endpoint(
    Extension(MediaRoot(root)): Extension<MediaRoot>,
    Path(path): Path<String>,
) -> Response {
    let Some(relative) = media_path(&path) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let file = root.join(&relative);
    match tokio::fs::read(&file).await {
        Ok(bytes) => {
            let mime = mime_guess::from_path(&file).first_or_octet_stream();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime.essence_str().to_string())],
                bytes,
            )
                .into_response()
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            StatusCode::NOT_FOUND.into_response()
        }
        Err(err) => {
            warn!(error = %err, path = %file.display(), "media file could not be read");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}
