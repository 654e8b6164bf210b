use std::sync::Arc;

use axum::response::Response;

use crate::config::{CacheConfig, SiteConfig};
use crate::demo::{seed_demo_site, DemoSite};
use crate::directory::{directory_router, DirectoryService};
use crate::pages::SiteService;
use crate::store::MemoryStore;

pub(super) async fn seeded() -> (Arc<MemoryStore>, DemoSite) {
    let store = Arc::new(MemoryStore::new());
    let demo = seed_demo_site(store.as_ref(), store.as_ref())
        .await
        .expect("seed demo site");
    (store, demo)
}

pub(super) fn directory_service(store: &Arc<MemoryStore>) -> DirectoryService {
    DirectoryService::new(store.clone(), store.clone())
}

pub(super) fn router(store: Arc<MemoryStore>) -> axum::Router {
    let site = Arc::new(SiteService::new(
        store.clone(),
        SiteConfig::default(),
        &CacheConfig::default(),
    ));
    directory_router(Arc::new(directory_service(&store)), site)
}

pub(super) fn titles<T>(items: &[T], title: impl Fn(&T) -> &str) -> Vec<String> {
    items.iter().map(|item| title(item).to_string()).collect()
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}
