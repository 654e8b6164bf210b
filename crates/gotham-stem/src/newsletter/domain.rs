use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipientId(pub i64);

/// Locally stored newsletter subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: RecipientId,
    pub email: String,
    pub active: bool,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Trims and lowercases an address; blank input yields `None`.
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    (!email.is_empty()).then_some(email)
}

#[async_trait]
pub trait RecipientStore: Send + Sync {
    /// Creates the recipient or reactivates the existing one. The flag reports creation.
    async fn upsert_active(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<(Recipient, bool), StoreError>;

    async fn find_recipient(&self, email: &str) -> Result<Option<Recipient>, StoreError>;

    /// Marks an active recipient inactive; returns false when there was nothing to change.
    async fn deactivate(&self, email: &str, now: DateTime<Utc>) -> Result<bool, StoreError>;

    /// Every recipient, most recently modified first.
    async fn recipients(&self) -> Result<Vec<Recipient>, StoreError>;
}
