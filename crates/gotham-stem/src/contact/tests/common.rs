use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;

use crate::config::{CacheConfig, SiteConfig};
use crate::contact::recaptcha::{Assessment, BotScorer, ScoreError};
use crate::contact::service::{ContactMessage, ContactNotifier, ContactService, NotifyError};
use crate::contact::contact_router;
use crate::demo::seed_demo_site;
use crate::pages::SiteService;
use crate::store::MemoryStore;

pub(super) const GOOD_TOKEN: &str = "human-token";

/// Scores `GOOD_TOKEN` with the configured score and everything else as invalid.
pub(super) struct FixedScorer {
    pub score: f32,
    pub fail: bool,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl FixedScorer {
    pub(super) fn scoring(score: f32) -> Arc<Self> {
        Arc::new(Self {
            score,
            fail: false,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub(super) fn failing() -> Arc<Self> {
        Arc::new(Self {
            score: 1.0,
            fail: true,
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl BotScorer for FixedScorer {
    async fn assess(&self, token: &str, action: &str) -> Result<Assessment, ScoreError> {
        self.calls
            .lock()
            .expect("scorer calls poisoned")
            .push((token.to_string(), action.to_string()));
        if self.fail {
            return Err(ScoreError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(Assessment {
            valid: token == GOOD_TOKEN,
            score: self.score,
        })
    }
}

#[derive(Default)]
pub(super) struct RecordingNotifier {
    pub fail: bool,
    pub sent: Mutex<Vec<ContactMessage>>,
}

impl RecordingNotifier {
    pub(super) fn sent(&self) -> Vec<ContactMessage> {
        self.sent.lock().expect("notifier poisoned").clone()
    }
}

#[async_trait]
impl ContactNotifier for RecordingNotifier {
    async fn notify(&self, message: &ContactMessage) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError("mail relay refused".to_string()));
        }
        self.sent
            .lock()
            .expect("notifier poisoned")
            .push(message.clone());
        Ok(())
    }
}

pub(super) fn contact_service(
    scorer: Option<Arc<FixedScorer>>,
    notifier: Arc<RecordingNotifier>,
) -> ContactService {
    ContactService::new(
        scorer.map(|scorer| scorer as Arc<dyn BotScorer>),
        notifier,
        0.7,
        "staff@gothamstem.org",
    )
    .with_site_key(Some("site-key".to_string()))
}

pub(super) async fn router(
    scorer: Option<Arc<FixedScorer>>,
    notifier: Arc<RecordingNotifier>,
    seeded: bool,
) -> axum::Router {
    let store = Arc::new(MemoryStore::new());
    if seeded {
        seed_demo_site(store.as_ref(), store.as_ref())
            .await
            .expect("seed demo site");
    }
    let site = Arc::new(SiteService::new(
        store,
        SiteConfig::default(),
        &CacheConfig::default(),
    ));
    contact_router(Arc::new(contact_service(scorer, notifier)), site)
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}
