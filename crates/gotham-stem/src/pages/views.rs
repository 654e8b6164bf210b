//! Server-rendered HTML for the public site.
//!
//! Every full page goes through [`layout`], which supplies the document shell and the
//! cached navigation. Paragraph and raw HTML blocks come from trusted editors and are
//! emitted unescaped; everything else is escaped by maud.

use maud::{html, Markup, PreEscaped, DOCTYPE};

use super::domain::{ContentBlock, Page};
use super::service::{FeaturedCard, SiteChrome};
use crate::config::SiteConfig;
use crate::newsletter::utm::add_utm;

pub const SITE_NAME: &str = "Gotham STEM";

pub fn layout(chrome: &SiteChrome, title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " | " (SITE_NAME) }
                link rel="stylesheet" href="/static/css/gotham.css";
                script src="/static/js/gotham.js" defer {}
            }
            body {
                header.site-header {
                    a.brand href="/" { (SITE_NAME) }
                    nav.site-nav {
                        ul {
                            @for link in &chrome.navigation {
                                li { a href=(link.href) { (link.title) } }
                            }
                        }
                    }
                }
                main { (content) }
                footer.site-footer {
                    form.newsletter-signup method="post" action="/newsletter/subscribe" {
                        label for="newsletter-email" { "Get the newsletter" }
                        input id="newsletter-email" type="email" name="email" required;
                        button type="submit" { "Subscribe" }
                    }
                }
            }
        }
    }
}

pub fn render_blocks(blocks: &[ContentBlock]) -> Markup {
    html! {
        @for block in blocks {
            @match block {
                ContentBlock::Heading { text } => h2.block-heading { (text) },
                ContentBlock::Paragraph { html: body } => div.block-paragraph { (PreEscaped(body)) },
                ContentBlock::Image { src, alt } => img.block-image src=(src) alt=(alt) loading="lazy";,
                ContentBlock::Button { text, url } => a.button href=(url) { (text) },
                ContentBlock::RawHtml { html: body } => (PreEscaped(body)),
            }
        }
    }
}

pub fn home_page(chrome: &SiteChrome, home: &Page, featured: &[FeaturedCard]) -> Markup {
    let content = html! {
        section.hero {
            @if let Some(image) = &home.hero_image {
                img.hero-image src=(image) alt="";
            }
            h1 { (home.title) }
            @if !home.intro.is_empty() {
                div.hero-text { (PreEscaped(&home.intro)) }
            }
        }
        (render_blocks(&home.body))
        @if !featured.is_empty() {
            section.featured {
                h2 { "Featured" }
                div.featured-grid {
                    @for card in featured {
                        a.featured-card href=(card.href) {
                            @if let Some(image) = &card.image {
                                img src=(image) alt=(card.title) loading="lazy";
                            }
                            h3 { (card.title) }
                            @if !card.intro.is_empty() {
                                p { (card.intro) }
                            }
                        }
                    }
                }
            }
        }
    };
    layout(chrome, &home.title, content)
}

pub fn static_page(chrome: &SiteChrome, page: &Page) -> Markup {
    let content = html! {
        article.static-page {
            h1 { (page.title) }
            @if !page.intro.is_empty() {
                p.intro { (page.intro) }
            }
            (render_blocks(&page.body))
        }
    };
    layout(chrome, &page.title, content)
}

pub fn newsletter_index(chrome: &SiteChrome, index: &Page, issues: &[Page]) -> Markup {
    let content = html! {
        section.newsletter-index {
            h1 { (index.title) }
            @if !index.intro.is_empty() {
                p.intro { (index.intro) }
            }
            ul {
                @for issue in issues {
                    li { a href=(issue.href()) { (issue.title) } }
                }
            }
        }
    };
    layout(chrome, &index.title, content)
}

/// Makes site-relative links absolute so the issue renders correctly in mail clients.
fn absolute(base_url: &str, link: &str) -> String {
    if link.starts_with('/') {
        format!("{}{}", base_url.trim_end_matches('/'), link)
    } else {
        link.to_string()
    }
}

/// Standalone newsletter issue. Button links carry the configured UTM parameters.
pub fn newsletter_issue(site: &SiteConfig, issue: &Page) -> Markup {
    let utm = site.utm.pairs();
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                title { (issue.title) }
            }
            body.newsletter {
                @if let Some(image) = &issue.hero_image {
                    img.hero-image src=(absolute(&site.base_url, image)) alt="";
                }
                h1 { (issue.title) }
                @for block in &issue.body {
                    @match block {
                        ContentBlock::Heading { text } => h2 { (text) },
                        ContentBlock::Paragraph { html: body } => div { (PreEscaped(body)) },
                        ContentBlock::Image { src, alt } => img src=(absolute(&site.base_url, src)) alt=(alt);,
                        ContentBlock::Button { text, url } => {
                            a.button href=(add_utm(&absolute(&site.base_url, url), &utm, &[])) { (text) }
                        },
                        ContentBlock::RawHtml { html: body } => (PreEscaped(body)),
                    }
                }
                p.footer {
                    a href=(add_utm(&site.base_url, &utm, &[])) { (SITE_NAME) }
                }
            }
        }
    }
}

pub fn thank_you(chrome: &SiteChrome) -> Markup {
    let content = html! {
        section.thank-you {
            h1 { "Thanks for subscribing!" }
            p { "Your subscription is confirmed. Watch your inbox for the next issue." }
            a.button href="/" { "Back to the homepage" }
        }
    };
    layout(chrome, "Thank you", content)
}

pub fn not_found(chrome: &SiteChrome) -> Markup {
    let content = html! {
        section.not-found {
            h1 { "Page not found" }
            p { "The page you were looking for does not exist or is no longer published." }
        }
    };
    layout(chrome, "Not found", content)
}

pub fn server_error() -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head { title { "Server error | " (SITE_NAME) } }
            body {
                h1 { "Something went wrong" }
                p { "Please try again in a moment." }
            }
        }
    }
}
