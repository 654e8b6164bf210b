use super::common::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request")
}

#[tokio::test]
async fn program_listing_renders_full_page() {
    let (store, _) = seeded().await;

    let response = router(store)
        .oneshot(get("/programs?program_types=camp"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_text_body(response).await;
    assert!(body.starts_with("<!DOCTYPE html>"));
    assert!(body.contains("<form class=\"filter-form\""));
    assert!(body.contains("href=\"/programs/rocketry-camp\""));
    assert!(!body.contains("href=\"/programs/intro-to-python\""));
    assert!(body.contains("Showing 1–5 of 5"));
}

#[tokio::test]
async fn xhr_requests_receive_only_the_results_fragment() {
    let (store, _) = seeded().await;

    let response = router(store)
        .oneshot(
            Request::get("/programs?q=drone")
                .header("X-Requested-With", "XMLHttpRequest")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_text_body(response).await;
    assert!(body.starts_with("<div id=\"results\">"));
    assert!(body.contains("Drone Builders"));
    assert!(!body.contains("<html"));
}

#[tokio::test]
async fn program_detail_is_public_for_live_programs_only() {
    let (store, _) = seeded().await;
    let app = router(store);

    let live = app
        .clone()
        .oneshot(get("/programs/robotics-summer-camp"))
        .await
        .expect("response");
    assert_eq!(live.status(), StatusCode::OK);
    let body = read_text_body(live).await;
    assert!(body.contains("<th scope=\"row\">Application Deadline</th><td>March 15, 2026</td>"));

    let draft = app
        .clone()
        .oneshot(get("/programs/quantum-computing-preview"))
        .await
        .expect("response");
    assert_eq!(draft.status(), StatusCode::NOT_FOUND);

    let missing = app
        .oneshot(get("/programs/nope"))
        .await
        .expect("response");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn resource_listing_links_pages_with_filters_kept() {
    let (store, _) = seeded().await;

    let response = router(store)
        .oneshot(get("/resources?categories=books"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_text_body(response).await;
    assert!(body.contains("The Code Book"));
    assert!(!body.contains("Khan Academy</a>"));
    assert!(body.contains("href=\"/resources\">Clear all</a>"));
}

#[tokio::test]
async fn listings_without_an_index_page_are_not_found() {
    let store = std::sync::Arc::new(crate::store::MemoryStore::new());

    let response = router(store)
        .oneshot(get("/programs"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
