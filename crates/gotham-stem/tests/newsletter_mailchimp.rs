use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use gotham_stem::config::MailchimpConfig;
use gotham_stem::newsletter::{
    sync_unsubscribes, MailchimpClient, MailingList, MemberStatus, NewsletterService,
    RecipientStore, SignupResponse,
};
use gotham_stem::store::MemoryStore;
use serde_json::{json, Value};

#[derive(Clone, Default)]
struct FakeAudience {
    members: Arc<Mutex<Vec<(String, String)>>>,
    unsubscribed: Arc<Vec<String>>,
    requests: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("Basic "))
        .unwrap_or(false)
}

async fn add_member(
    State(audience): State<FakeAudience>,
    Path(list): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if list != "audience-1" || !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "title": "API Key Invalid" })))
            .into_response();
    }
    let email = body["email_address"].as_str().unwrap_or_default().to_string();
    let status = body["status"].as_str().unwrap_or_default().to_string();
    let mut members = audience.members.lock().expect("members");
    if members.iter().any(|(existing, _)| *existing == email) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "title": "Member Exists",
                "detail": format!("{email} is already a list member.")
            })),
        )
            .into_response();
    }
    members.push((email.clone(), status.clone()));
    Json(json!({ "email_address": email, "status": status })).into_response()
}

async fn list_members(
    State(audience): State<FakeAudience>,
    Path(_list): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    audience
        .requests
        .lock()
        .expect("requests")
        .push(params.clone());
    let offset: usize = params.get("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
    let count: usize = params.get("count").and_then(|v| v.parse().ok()).unwrap_or(10);
    let members: Vec<Value> = audience
        .unsubscribed
        .iter()
        .skip(offset)
        .take(count)
        .map(|email| json!({ "email_address": email }))
        .collect();
    Json(json!({ "members": members, "total_items": audience.unsubscribed.len() }))
}

async fn spawn(audience: FakeAudience) -> String {
    let app = Router::new()
        .route("/lists/:list/members", get(list_members).post(add_member))
        .with_state(audience);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake mailing list");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake mailing list");
    });
    format!("http://{addr}")
}

fn client(base_url: &str) -> MailchimpClient {
    MailchimpClient::new(&MailchimpConfig {
        api_key: "secret-us21".to_string(),
        server: "us21".to_string(),
        audience_id: "audience-1".to_string(),
    })
    .expect("client")
    .with_base_url(base_url)
}

#[tokio::test]
async fn signup_pushes_pending_member_then_tolerates_duplicates() {
    let audience = FakeAudience::default();
    let base_url = spawn(audience.clone()).await;
    let store = Arc::new(MemoryStore::new());
    let list: Arc<dyn MailingList> = Arc::new(client(&base_url));
    let service = NewsletterService::new(store.clone(), Some(list));

    let first = service
        .subscribe(Some("Ada@Example.org"), Utc::now())
        .await
        .expect("first signup");
    let second = service
        .subscribe(Some("ada@example.org"), Utc::now())
        .await
        .expect("second signup");

    assert_eq!(
        serde_json::to_value(&first.response).expect("json"),
        json!({ "status": "success", "message": "Success! Check your inbox." })
    );
    assert_eq!(
        second.response,
        SignupResponse::Success {
            message: None,
            note: Some("Record updated".to_string()),
        }
    );
    assert_eq!(
        *audience.members.lock().expect("members"),
        vec![("ada@example.org".to_string(), "pending".to_string())]
    );
    assert_eq!(store.recipients().await.expect("recipients").len(), 1);
}

#[tokio::test]
async fn member_listing_passes_status_and_paging() {
    let audience = FakeAudience {
        unsubscribed: Arc::new(vec!["a@example.org".into(), "b@example.org".into()]),
        ..FakeAudience::default()
    };
    let base_url = spawn(audience.clone()).await;

    let page = client(&base_url)
        .members(MemberStatus::Unsubscribed, 1, 1000)
        .await
        .expect("members");

    assert_eq!(page.emails, vec!["b@example.org".to_string()]);
    assert_eq!(page.total_items, 2);
    let requests = audience.requests.lock().expect("requests");
    assert_eq!(requests[0].get("status").map(String::as_str), Some("unsubscribed"));
    assert_eq!(requests[0].get("count").map(String::as_str), Some("1000"));
    assert_eq!(requests[0].get("offset").map(String::as_str), Some("1"));
}

#[tokio::test]
async fn unsubscribe_sync_runs_against_the_api() {
    let audience = FakeAudience {
        unsubscribed: Arc::new(vec!["left@example.org".into()]),
        ..FakeAudience::default()
    };
    let base_url = spawn(audience).await;
    let store = MemoryStore::new();
    store
        .upsert_active("left@example.org", Utc::now())
        .await
        .expect("subscribe");
    store
        .upsert_active("stays@example.org", Utc::now())
        .await
        .expect("subscribe");

    let report = sync_unsubscribes(&client(&base_url), &store, Utc::now())
        .await
        .expect("sync");

    assert_eq!(report.examined, 1);
    assert_eq!(report.deactivated, vec!["left@example.org".to_string()]);
    let stays = store
        .find_recipient("stays@example.org")
        .await
        .expect("lookup")
        .expect("recipient");
    assert!(stays.active);
}

#[tokio::test]
async fn api_errors_carry_title_and_detail() {
    let base_url = spawn(FakeAudience::default()).await;
    let client = client(&base_url);

    client
        .add_member("dup@example.org", MemberStatus::Pending)
        .await
        .expect("first add");
    let err = client
        .add_member("dup@example.org", MemberStatus::Pending)
        .await
        .expect_err("duplicate");

    assert_eq!(
        err.to_string(),
        "mailing list answered with status 400: Member Exists: dup@example.org is already a list member."
    );
}
