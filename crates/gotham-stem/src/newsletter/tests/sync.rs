use std::sync::Arc;

use chrono::{TimeZone, Utc};

use super::common::*;
use crate::newsletter::{sync_unsubscribes, NewsletterError, RecipientStore, SYNC_PAGE_SIZE};
use crate::store::MemoryStore;

async fn subscribe(store: &MemoryStore, email: &str) {
    let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    store.upsert_active(email, now).await.expect("subscribe");
}

#[tokio::test]
async fn only_active_local_recipients_are_deactivated() {
    let store = Arc::new(MemoryStore::new());
    subscribe(&store, "ada@example.org").await;
    subscribe(&store, "grace@example.org").await;
    subscribe(&store, "already@example.org").await;
    let earlier = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
    store.deactivate("already@example.org", earlier).await.expect("deactivate");
    let list = FakeList {
        unsubscribed: vec![
            "Ada@Example.org".to_string(),
            "already@example.org".to_string(),
            "stranger@example.org".to_string(),
        ],
        ..FakeList::default()
    };
    let now = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();

    let report = sync_unsubscribes(&list, store.as_ref(), now).await.expect("sync");

    assert_eq!(report.examined, 3);
    assert_eq!(report.deactivated, vec!["ada@example.org".to_string()]);
    let grace = store
        .find_recipient("grace@example.org")
        .await
        .expect("lookup")
        .expect("grace");
    assert!(grace.active);
    let already = store
        .find_recipient("already@example.org")
        .await
        .expect("lookup")
        .expect("already");
    assert_eq!(already.modified, earlier);
}

#[tokio::test]
async fn pages_through_large_unsubscribe_lists() {
    let store = Arc::new(MemoryStore::new());
    let unsubscribed: Vec<String> = (0..SYNC_PAGE_SIZE + 5)
        .map(|n| format!("reader{n}@example.org"))
        .collect();
    subscribe(&store, "reader1002@example.org").await;
    let list = FakeList {
        unsubscribed,
        ..FakeList::default()
    };

    let report = sync_unsubscribes(&list, store.as_ref(), Utc::now())
        .await
        .expect("sync");

    assert_eq!(report.examined, SYNC_PAGE_SIZE + 5);
    assert_eq!(report.deactivated, vec!["reader1002@example.org".to_string()]);
    assert_eq!(
        *list.requested_offsets.lock().expect("offsets"),
        vec![0, SYNC_PAGE_SIZE]
    );
}

#[tokio::test]
async fn remote_failure_aborts_but_keeps_committed_pages() {
    let store = Arc::new(MemoryStore::new());
    subscribe(&store, "reader3@example.org").await;
    let list = FakeList {
        unsubscribed: (0..SYNC_PAGE_SIZE * 2)
            .map(|n| format!("reader{n}@example.org"))
            .collect(),
        fail_listing_at: Some(SYNC_PAGE_SIZE),
        ..FakeList::default()
    };

    let result = sync_unsubscribes(&list, store.as_ref(), Utc::now()).await;

    assert!(matches!(result, Err(NewsletterError::MailingList(_))));
    let reader = store
        .find_recipient("reader3@example.org")
        .await
        .expect("lookup")
        .expect("reader");
    assert!(!reader.active);
}
