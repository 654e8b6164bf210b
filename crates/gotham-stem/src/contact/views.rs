use maud::{html, Markup};

use crate::pages::service::SiteChrome;
use crate::pages::views::layout;

/// Status line shown above the form after a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flash<'a> {
    Success(&'a str),
    Error(&'a str),
}

pub fn contact_page(
    chrome: &SiteChrome,
    mode: &str,
    site_key: Option<&str>,
    flash: Option<Flash<'_>>,
) -> Markup {
    let action = if mode == super::service::DEFAULT_MODE {
        "/contact".to_string()
    } else {
        format!("/contact/{mode}")
    };

    let content = html! {
        section.contact {
            h1 { "Contact us" }
            @match flash {
                Some(Flash::Success(text)) => p.flash.flash-success role="status" { (text) },
                Some(Flash::Error(text)) => p.flash.flash-error role="alert" { (text) },
                None => {}
            }
            form #contact-form method="post" action=(action) {
                label for="contact-name" { "Name" }
                input #contact-name type="text" name="name" required;
                label for="contact-email" { "Email" }
                input #contact-email type="email" name="email" required;
                label for="contact-phone" { "Phone" }
                input #contact-phone type="tel" name="phone";
                label for="contact-subject" { "Subject" }
                input #contact-subject type="text" name="subject";
                @if mode != super::service::DEFAULT_MODE {
                    label for="contact-program" { "Program name" }
                    input #contact-program type="text" name="program_name";
                    label for="contact-experience" { "Experience" }
                    textarea #contact-experience name="experience" {}
                }
                label for="contact-message" { "Message" }
                textarea #contact-message name="message" required {}
                input type="hidden" name="g-recaptcha-response" id="g-recaptcha-response";
                button type="submit" data-sitekey=[site_key] data-action="contact-us" { "Send" }
            }
            @if let Some(key) = site_key {
                script src={ "https://www.google.com/recaptcha/enterprise.js?render=" (key) } {}
            }
        }
    };
    layout(chrome, "Contact us", content)
}
