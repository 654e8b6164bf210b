use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use super::domain::{normalize_email, Recipient, RecipientStore};
use super::mailchimp::{MailingList, MemberStatus};
use super::NewsletterError;

/// JSON body returned to the signup form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SignupResponse {
    Success {
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
    Error {
        message: String,
    },
}

impl SignupResponse {
    fn confirmed() -> Self {
        Self::Success {
            message: Some("Success! Check your inbox.".to_string()),
            note: None,
        }
    }

    fn recorded() -> Self {
        Self::Success {
            message: None,
            note: Some("Record updated".to_string()),
        }
    }

    pub fn email_required() -> Self {
        Self::Error {
            message: "Email is required.".to_string(),
        }
    }
}

/// Result of a signup that passed validation.
#[derive(Debug, Clone)]
pub struct Signup {
    pub recipient: Recipient,
    pub created: bool,
    pub response: SignupResponse,
}

pub struct NewsletterService {
    recipients: Arc<dyn RecipientStore>,
    list: Option<Arc<dyn MailingList>>,
}

impl NewsletterService {
    pub fn new(recipients: Arc<dyn RecipientStore>, list: Option<Arc<dyn MailingList>>) -> Self {
        Self { recipients, list }
    }

    pub fn recipients(&self) -> &Arc<dyn RecipientStore> {
        &self.recipients
    }

    pub fn mailing_list(&self) -> Option<&Arc<dyn MailingList>> {
        self.list.as_ref()
    }

    /// Records the address locally, then asks the mailing list for a double opt-in.
    ///
    /// Mailing-list trouble is logged and downgraded to a "record updated" answer;
    /// only a blank address or a local store failure is an error.
    pub async fn subscribe(
        &self,
        raw_email: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Signup, NewsletterError> {
        let email = raw_email
            .and_then(normalize_email)
            .ok_or(NewsletterError::EmailRequired)?;

        let (recipient, created) = self.recipients.upsert_active(&email, now).await?;
        info!(email = %recipient.email, created, "newsletter recipient recorded");

        let response = match &self.list {
            Some(list) => match list.add_member(&email, MemberStatus::Pending).await {
                Ok(()) => SignupResponse::confirmed(),
                Err(err) => {
                    error!(error = %err, email = %email, "mailing list signup failed");
                    SignupResponse::recorded()
                }
            },
            None => {
                warn!(email = %email, "mailing list not configured; signup kept locally");
                SignupResponse::recorded()
            }
        };

        Ok(Signup {
            recipient,
            created,
            response,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn responses_match_signup_form_contract() {
        assert_eq!(
            serde_json::to_value(SignupResponse::confirmed()).expect("json"),
            json!({ "status": "success", "message": "Success! Check your inbox." })
        );
        assert_eq!(
            serde_json::to_value(SignupResponse::recorded()).expect("json"),
            json!({ "status": "success", "note": "Record updated" })
        );
        assert_eq!(
            serde_json::to_value(SignupResponse::email_required()).expect("json"),
            json!({ "status": "error", "message": "Email is required." })
        );
    }
}
