use chrono::{DateTime, Utc};
use tracing::info;

use super::domain::{normalize_email, RecipientStore};
use super::mailchimp::{MailingList, MemberStatus};
use super::NewsletterError;

pub const SYNC_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub examined: usize,
    pub deactivated: Vec<String>,
}

/// Copies remote unsubscribes onto local recipients.
///
/// Only recipients that are still active are touched. A failing page aborts the
/// run; deactivations from earlier pages stay committed.
pub async fn sync_unsubscribes(
    list: &dyn MailingList,
    recipients: &dyn RecipientStore,
    now: DateTime<Utc>,
) -> Result<SyncReport, NewsletterError> {
    let mut report = SyncReport::default();
    let mut offset = 0;

    loop {
        let page = list
            .members(MemberStatus::Unsubscribed, offset, SYNC_PAGE_SIZE)
            .await?;
        let fetched = page.emails.len();

        for raw in page.emails {
            report.examined += 1;
            let Some(email) = normalize_email(&raw) else {
                continue;
            };
            if recipients.deactivate(&email, now).await? {
                info!(email = %email, "synced unsubscribe");
                report.deactivated.push(email);
            }
        }

        offset += fetched;
        if fetched < SYNC_PAGE_SIZE || offset >= page.total_items {
            break;
        }
    }

    info!(
        examined = report.examined,
        deactivated = report.deactivated.len(),
        "unsubscribe sync finished"
    );
    Ok(report)
}
