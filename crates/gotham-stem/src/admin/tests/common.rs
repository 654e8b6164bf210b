use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use serde_json::Value;

use crate::admin::{admin_router, AdminService, EditorToken};
use crate::demo::{seed_demo_site, DemoSite};
use crate::store::MemoryStore;

pub(super) const TOKEN: &str = "admin-secret";

pub(super) async fn seeded() -> (Arc<MemoryStore>, DemoSite) {
    let store = Arc::new(MemoryStore::new());
    let demo = seed_demo_site(store.as_ref(), store.as_ref())
        .await
        .expect("seed demo site");
    (store, demo)
}

pub(super) fn admin_service(store: &Arc<MemoryStore>) -> AdminService {
    AdminService::new(store.clone(), store.clone(), store.clone())
}

pub(super) fn router(store: &Arc<MemoryStore>, token: Option<&str>) -> axum::Router {
    admin_router(
        Arc::new(admin_service(store)),
        EditorToken::new(token.map(str::to_string)),
    )
}

pub(super) fn authorized(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"));
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json).expect("json body")))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}
