//! Newsletter recipients, mailing-list signup and unsubscribe sync, and the
//! outbound link tagging used when rendering issues.

pub mod domain;
pub mod mailchimp;
pub mod router;
pub mod service;
pub mod sync;
pub mod utm;

#[cfg(test)]
mod tests;

use crate::store::StoreError;

pub use domain::{normalize_email, Recipient, RecipientId, RecipientStore};
pub use mailchimp::{MailchimpClient, MailingList, MailingListError, MemberPage, MemberStatus};
pub use router::{newsletter_router, NewsletterState};
pub use service::{NewsletterService, Signup, SignupResponse};
pub use sync::{sync_unsubscribes, SyncReport, SYNC_PAGE_SIZE};

#[derive(Debug, thiserror::Error)]
pub enum NewsletterError {
    #[error("Email is required.")]
    EmailRequired,
    #[error("mailing list is not configured")]
    NotConfigured,
    #[error("DATABASE_URL is not set; there are no stored recipients to update")]
    StoreNotConfigured,
    #[error(transparent)]
    MailingList(#[from] MailingListError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
