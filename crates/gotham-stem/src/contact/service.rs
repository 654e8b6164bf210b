use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{error, info, warn};

use super::recaptcha::{BotScorer, CONTACT_ACTION};

pub const DEFAULT_MODE: &str = "default";
pub const INVALID_RECAPTCHA: &str = "Invalid reCAPTCHA. Please try again.";
pub const THANK_YOU: &str = "Thank you for reaching out! Your message has been successfully received. \
A member of our team will review your inquiry and get back to you within 24 hours.";

/// Submitted contact form fields. Everything is optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub program_name: Option<String>,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "g-recaptcha-response")]
    pub recaptcha_token: Option<String>,
}

/// Normalizes the optional `/contact/{mode}` segment.
pub fn normalize_mode(raw: Option<&str>) -> String {
    raw.map(|mode| mode.trim().to_lowercase())
        .filter(|mode| !mode.is_empty())
        .unwrap_or_else(|| DEFAULT_MODE.to_string())
}

fn field(value: &Option<String>) -> &str {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("N/A")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMessage {
    pub recipient: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: String,
}

impl ContactMessage {
    pub fn compose(mode: &str, form: &ContactForm, recipient: &str) -> Self {
        let name = field(&form.name);
        let body = format!(
            "New Contact Form Submission ({mode_upper})\n\
             -------------------------------------------\n\
             Name: {name}\n\
             Email: {email}\n\
             Phone: {phone}\n\
             Subject: {subject}\n\
             Program: {program}\n\
             Experience: {experience}\n\
             \n\
             Comments/Message:\n\
             {message}\n",
            mode_upper = mode.to_uppercase(),
            email = field(&form.email),
            phone = field(&form.phone),
            subject = field(&form.subject),
            program = field(&form.program_name),
            experience = field(&form.experience),
            message = field(&form.message),
        );
        Self {
            recipient: recipient.to_string(),
            reply_to: form
                .email
                .as_deref()
                .map(str::trim)
                .filter(|email| !email.is_empty())
                .map(str::to_string),
            subject: format!("Contact Form ({mode}): {name}"),
            body,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("contact notification failed: {0}")]
pub struct NotifyError(pub String);

/// Delivers accepted contact messages to staff.
#[async_trait]
pub trait ContactNotifier: Send + Sync {
    async fn notify(&self, message: &ContactMessage) -> Result<(), NotifyError>;
}

/// Writes contact messages to the application log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl ContactNotifier for LogNotifier {
    async fn notify(&self, message: &ContactMessage) -> Result<(), NotifyError> {
        info!(
            recipient = %message.recipient,
            reply_to = message.reply_to.as_deref().unwrap_or("-"),
            subject = %message.subject,
            body = %message.body,
            "contact message received"
        );
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ContactError {
    #[error("{}", INVALID_RECAPTCHA)]
    InvalidRecaptcha,
    #[error(transparent)]
    Notify(#[from] NotifyError),
}

pub struct ContactService {
    scorer: Option<Arc<dyn BotScorer>>,
    notifier: Arc<dyn ContactNotifier>,
    threshold: f32,
    recipient: String,
    site_key: Option<String>,
}

impl ContactService {
    pub fn new(
        scorer: Option<Arc<dyn BotScorer>>,
        notifier: Arc<dyn ContactNotifier>,
        threshold: f32,
        recipient: impl Into<String>,
    ) -> Self {
        Self {
            scorer,
            notifier,
            threshold,
            recipient: recipient.into(),
            site_key: None,
        }
    }

    pub fn with_site_key(mut self, site_key: Option<String>) -> Self {
        self.site_key = site_key;
        self
    }

    /// Public key rendered into the form for the client-side widget.
    pub fn site_key(&self) -> Option<&str> {
        self.site_key.as_deref()
    }

    async fn verify(&self, token: Option<&str>) -> bool {
        let Some(scorer) = &self.scorer else {
            warn!("contact form submitted but reCAPTCHA is not configured");
            return false;
        };
        let Some(token) = token.map(str::trim).filter(|token| !token.is_empty()) else {
            return false;
        };
        match scorer.assess(token, CONTACT_ACTION).await {
            Ok(assessment) => assessment.passes(self.threshold),
            Err(err) => {
                error!(error = %err, "reCAPTCHA assessment failed");
                false
            }
        }
    }

    /// Verifies the submission and hands the message to the notifier.
    pub async fn submit(&self, mode: &str, form: &ContactForm) -> Result<ContactMessage, ContactError> {
        if !self.verify(form.recaptcha_token.as_deref()).await {
            return Err(ContactError::InvalidRecaptcha);
        }
        let message = ContactMessage::compose(mode, form, &self.recipient);
        if let Err(err) = self.notifier.notify(&message).await {
            error!(error = %err, mode, "contact message could not be delivered");
            return Err(err.into());
        }
        info!(mode, "contact message accepted");
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_are_trimmed_and_lowercased() {
        assert_eq!(normalize_mode(Some("  Partner ")), "partner");
        assert_eq!(normalize_mode(Some("   ")), "default");
        assert_eq!(normalize_mode(None), "default");
    }

    #[test]
    fn messages_fill_missing_fields() {
        let form = ContactForm {
            name: Some("Ada".to_string()),
            email: Some(" ada@example.org ".to_string()),
            message: Some("Hello".to_string()),
            ..ContactForm::default()
        };

        let message = ContactMessage::compose("partner", &form, "info@example.org");

        assert_eq!(message.subject, "Contact Form (partner): Ada");
        assert_eq!(message.reply_to.as_deref(), Some("ada@example.org"));
        assert!(message.body.starts_with("New Contact Form Submission (PARTNER)\n"));
        assert!(message.body.contains("Phone: N/A\n"));
        assert!(message.body.contains("Program: N/A\n"));
        assert!(message.body.ends_with("Comments/Message:\nHello\n"));
    }
}
