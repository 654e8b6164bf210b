use std::sync::Arc;

use super::common::*;
use crate::contact::service::{ContactError, ContactForm};
use crate::contact::CONTACT_ACTION;

fn form(token: Option<&str>) -> ContactForm {
    ContactForm {
        name: Some("Grace Hopper".to_string()),
        email: Some("grace@example.org".to_string()),
        message: Some("Do you run coding camps?".to_string()),
        recaptcha_token: token.map(str::to_string),
        ..ContactForm::default()
    }
}

#[tokio::test]
async fn accepted_submissions_reach_the_notifier() {
    let scorer = FixedScorer::scoring(0.9);
    let notifier = Arc::new(RecordingNotifier::default());
    let service = contact_service(Some(scorer.clone()), notifier.clone());

    let message = service
        .submit("default", &form(Some(GOOD_TOKEN)))
        .await
        .expect("accepted");

    assert_eq!(message.recipient, "staff@gothamstem.org");
    assert_eq!(message.subject, "Contact Form (default): Grace Hopper");
    assert_eq!(notifier.sent(), vec![message]);
    let calls = scorer.calls.lock().expect("calls").clone();
    assert_eq!(calls, vec![(GOOD_TOKEN.to_string(), CONTACT_ACTION.to_string())]);
}

#[tokio::test]
async fn low_scores_are_rejected_without_notification() {
    let notifier = Arc::new(RecordingNotifier::default());
    let service = contact_service(Some(FixedScorer::scoring(0.3)), notifier.clone());

    let result = service.submit("default", &form(Some(GOOD_TOKEN))).await;

    assert!(matches!(result, Err(ContactError::InvalidRecaptcha)));
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn invalid_or_missing_tokens_are_rejected() {
    let notifier = Arc::new(RecordingNotifier::default());
    let scorer = FixedScorer::scoring(0.9);
    let service = contact_service(Some(scorer.clone()), notifier.clone());

    let bad = service.submit("default", &form(Some("bot-token"))).await;
    let missing = service.submit("default", &form(None)).await;

    assert!(matches!(bad, Err(ContactError::InvalidRecaptcha)));
    assert!(matches!(missing, Err(ContactError::InvalidRecaptcha)));
    assert_eq!(scorer.calls.lock().expect("calls").len(), 1);
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn scoring_failures_count_as_invalid() {
    let notifier = Arc::new(RecordingNotifier::default());
    let service = contact_service(Some(FixedScorer::failing()), notifier.clone());

    let result = service.submit("default", &form(Some(GOOD_TOKEN))).await;

    assert!(matches!(result, Err(ContactError::InvalidRecaptcha)));
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn unconfigured_scoring_rejects_everything() {
    let notifier = Arc::new(RecordingNotifier::default());
    let service = contact_service(None, notifier.clone());

    let result = service.submit("default", &form(Some(GOOD_TOKEN))).await;

    assert!(matches!(result, Err(ContactError::InvalidRecaptcha)));
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn notifier_failures_are_reported() {
    let notifier = Arc::new(RecordingNotifier {
        fail: true,
        ..RecordingNotifier::default()
    });
    let service = contact_service(Some(FixedScorer::scoring(0.95)), notifier);

    let result = service.submit("partner", &form(Some(GOOD_TOKEN))).await;

    assert!(matches!(result, Err(ContactError::Notify(_))));
}
