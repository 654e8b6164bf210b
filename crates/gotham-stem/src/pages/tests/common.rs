use std::sync::Arc;

use axum::response::Response;

use crate::admin::auth::EditorToken;
use crate::config::{CacheConfig, SiteConfig};
use crate::demo::{seed_demo_site, DemoSite};
use crate::pages::{pages_router, SiteService};
use crate::store::MemoryStore;

pub(super) const EDITOR_TOKEN: &str = "editor-secret";

pub(super) async fn seeded_store() -> (Arc<MemoryStore>, DemoSite) {
    let store = Arc::new(MemoryStore::new());
    let demo = seed_demo_site(store.as_ref(), store.as_ref())
        .await
        .expect("seed demo site");
    (store, demo)
}

pub(super) fn site_service(store: Arc<MemoryStore>) -> Arc<SiteService> {
    Arc::new(SiteService::new(
        store,
        SiteConfig {
            base_url: "https://gothamstem.org".to_string(),
            ..SiteConfig::default()
        },
        &CacheConfig::default(),
    ))
}

pub(super) fn router(store: Arc<MemoryStore>) -> axum::Router {
    pages_router(
        site_service(store),
        EditorToken::new(Some(EDITOR_TOKEN.to_string())),
    )
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}
