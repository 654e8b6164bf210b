use std::sync::Arc;

use super::common::*;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .expect("request")
}

const VALID_FORM: &str =
    "name=Ada+Lovelace&email=ada%40example.org&message=Hello&g-recaptcha-response=human-token";

#[tokio::test]
async fn form_renders_with_site_key() {
    let app = router(None, Arc::new(RecordingNotifier::default()), true).await;

    let response = app
        .oneshot(Request::get("/contact").body(Body::empty()).expect("request"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_text_body(response).await;
    assert!(body.contains("action=\"/contact\""));
    assert!(body.contains("enterprise.js?render=site-key"));
    assert!(!body.contains("name=\"program_name\""));
}

#[tokio::test]
async fn mode_segment_is_normalized() {
    let app = router(None, Arc::new(RecordingNotifier::default()), true).await;

    let response = app
        .oneshot(
            Request::get("/contact/%20Partner%20")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_text_body(response).await;
    assert!(body.contains("action=\"/contact/partner\""));
    assert!(body.contains("name=\"program_name\""));
}

#[tokio::test]
async fn accepted_submission_redirects_to_program_index() {
    let notifier = Arc::new(RecordingNotifier::default());
    let app = router(Some(FixedScorer::scoring(0.9)), notifier.clone(), true).await;

    let response = app
        .oneshot(post_form("/contact/partner", VALID_FORM))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).expect("location"),
        "/programs"
    );
    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Contact Form (partner): Ada Lovelace");
    assert!(sent[0].body.contains("Email: ada@example.org"));
}

#[tokio::test]
async fn accepted_submission_thanks_visitor_without_program_index() {
    let notifier = Arc::new(RecordingNotifier::default());
    let app = router(Some(FixedScorer::scoring(0.9)), notifier.clone(), false).await;

    let response = app
        .oneshot(post_form("/contact", VALID_FORM))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_text_body(response).await;
    assert!(body.contains("Thank you for reaching out!"));
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test]
async fn rejected_submission_rerenders_with_error() {
    let notifier = Arc::new(RecordingNotifier::default());
    let app = router(Some(FixedScorer::scoring(0.2)), notifier.clone(), true).await;

    let response = app
        .oneshot(post_form("/contact", VALID_FORM))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_text_body(response).await;
    assert!(body.contains("Invalid reCAPTCHA. Please try again."));
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn delivery_failure_rerenders_with_error() {
    let notifier = Arc::new(RecordingNotifier {
        fail: true,
        ..RecordingNotifier::default()
    });
    let app = router(Some(FixedScorer::scoring(0.9)), notifier, true).await;

    let response = app
        .oneshot(post_form("/contact", VALID_FORM))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = read_text_body(response).await;
    assert!(body.contains("could not send your message"));
}
