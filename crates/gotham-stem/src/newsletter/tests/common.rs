use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;

use crate::config::{CacheConfig, SiteConfig};
use crate::newsletter::mailchimp::{MailingList, MailingListError, MemberPage, MemberStatus};
use crate::newsletter::{newsletter_router, NewsletterService};
use crate::pages::SiteService;
use crate::store::MemoryStore;

/// In-process mailing list that records signups and serves canned unsubscribes.
#[derive(Default)]
pub(super) struct FakeList {
    pub fail_adds: bool,
    pub fail_listing_at: Option<usize>,
    pub unsubscribed: Vec<String>,
    pub added: Mutex<Vec<(String, MemberStatus)>>,
    pub requested_offsets: Mutex<Vec<usize>>,
}

impl FakeList {
    pub(super) fn added(&self) -> Vec<(String, MemberStatus)> {
        self.added.lock().expect("list poisoned").clone()
    }
}

#[async_trait]
impl MailingList for FakeList {
    async fn add_member(&self, email: &str, status: MemberStatus) -> Result<(), MailingListError> {
        if self.fail_adds {
            return Err(MailingListError::Api {
                status: 400,
                detail: "Member Exists".to_string(),
            });
        }
        self.added
            .lock()
            .expect("list poisoned")
            .push((email.to_string(), status));
        Ok(())
    }

    async fn members(
        &self,
        status: MemberStatus,
        offset: usize,
        count: usize,
    ) -> Result<MemberPage, MailingListError> {
        assert_eq!(status, MemberStatus::Unsubscribed);
        self.requested_offsets
            .lock()
            .expect("list poisoned")
            .push(offset);
        if self.fail_listing_at == Some(offset) {
            return Err(MailingListError::Api {
                status: 503,
                detail: "Service Unavailable".to_string(),
            });
        }
        Ok(MemberPage {
            emails: self
                .unsubscribed
                .iter()
                .skip(offset)
                .take(count)
                .cloned()
                .collect(),
            total_items: self.unsubscribed.len(),
        })
    }
}

pub(super) fn service(store: Arc<MemoryStore>, list: Option<Arc<FakeList>>) -> NewsletterService {
    NewsletterService::new(store, list.map(|list| list as Arc<dyn MailingList>))
}

pub(super) fn router(store: Arc<MemoryStore>, list: Option<Arc<FakeList>>) -> axum::Router {
    let site = Arc::new(SiteService::new(
        store.clone(),
        SiteConfig::default(),
        &CacheConfig::default(),
    ));
    newsletter_router(Arc::new(service(store, list)), site)
}

pub(super) async fn read_json(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json body")
}
