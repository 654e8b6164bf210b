//! Contact form: bot scoring, message composition, and the `/contact` routes.

pub mod recaptcha;
pub mod router;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use recaptcha::{Assessment, BotScorer, RecaptchaClient, ScoreError, CONTACT_ACTION};
pub use router::{contact_router, ContactState};
pub use service::{
    normalize_mode, ContactError, ContactForm, ContactMessage, ContactNotifier, ContactService,
    LogNotifier, NotifyError,
};
