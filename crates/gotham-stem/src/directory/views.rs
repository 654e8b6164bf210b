use maud::{html, Markup, PreEscaped};

use super::domain::{Program, Resource};
use super::service::{ActiveFilter, FacetPanel, ProgramDetail, SearchResults};
use crate::pages::domain::Page;
use crate::pages::service::SiteChrome;
use crate::pages::views::layout;

pub const PROGRAMS_PATH: &str = "/programs";
pub const RESOURCES_PATH: &str = "/resources";

fn with_query(path: &str, query: &str) -> String {
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    }
}

fn filter_form(action: &str, text: Option<&str>, panels: &[FacetPanel]) -> Markup {
    html! {
        form.filter-form method="get" action=(action) {
            div.search-box {
                label for="q" { "Search" }
                input id="q" type="search" name="q" value=(text.unwrap_or_default());
            }
            @for panel in panels {
                fieldset.facet data-param=(panel.param) {
                    legend { (panel.label) }
                    @for option in &panel.options {
                        label.facet-option {
                            input type="checkbox" name=(panel.param) value=(option.slug) checked[option.selected];
                            " " (option.name)
                        }
                    }
                }
            }
            button type="submit" { "Apply filters" }
        }
    }
}

fn active_filters(path: &str, active: &[ActiveFilter]) -> Markup {
    html! {
        @if !active.is_empty() {
            ul.active-filters {
                @for filter in active {
                    li {
                        span.filter-label { (filter.label) ": " }
                        (filter.display)
                        " "
                        a.remove-filter href=(with_query(path, &filter.remove_query)) aria-label="Remove filter" { "×" }
                    }
                }
                li { a.clear-filters href=(path) { "Clear all" } }
            }
        }
    }
}

fn pagination<T>(path: &str, results: &SearchResults<T>) -> Markup {
    let window = &results.window;
    html! {
        nav.pagination {
            @if window.has_previous() {
                a.previous href=(with_query(path, &results.page_query(window.number - 1))) { "Previous" }
            }
            span.current { "Page " (window.number) " of " (window.num_pages) }
            @if window.has_next() {
                a.next href=(with_query(path, &results.page_query(window.number + 1))) { "Next" }
            }
        }
    }
}

fn result_summary<T>(results: &SearchResults<T>) -> Markup {
    let window = &results.window;
    html! {
        p.result-count {
            @if window.total == 0 {
                "No results match your filters."
            } @else {
                "Showing " (window.start_index()) "–" (window.end_index()) " of " (window.total)
            }
        }
    }
}

/// The part of the listing replaced in place by filter requests.
pub fn program_results(results: &SearchResults<Program>) -> Markup {
    html! {
        div #results {
            (active_filters(PROGRAMS_PATH, &results.active))
            (result_summary(results))
            ul.program-list {
                @for program in &results.items {
                    li.program-card {
                        @if let Some(logo) = &program.profile.logo_image {
                            img.logo src=(logo) alt="" loading="lazy";
                        }
                        h3 { a href=(format!("{PROGRAMS_PATH}/{}", program.slug)) { (program.title) } }
                        @if let Some(city) = &program.profile.city {
                            p.city { (city) }
                        }
                        @if let Some(summary) = &program.profile.program_summary {
                            p.summary { (summary) }
                        }
                    }
                }
            }
            (pagination(PROGRAMS_PATH, results))
        }
    }
}

pub fn program_search_page(
    chrome: &SiteChrome,
    index: &Page,
    results: &SearchResults<Program>,
) -> Markup {
    let content = html! {
        section.directory {
            h1 { (index.title) }
            @if !index.intro.is_empty() {
                p.intro { (index.intro) }
            }
            div.directory-layout {
                aside.filters {
                    (filter_form(PROGRAMS_PATH, results.selection.text.as_deref(), &results.panels))
                }
                (program_results(results))
            }
        }
    };
    layout(chrome, &index.title, content)
}

pub fn resource_results(results: &SearchResults<Resource>) -> Markup {
    html! {
        div #results {
            (active_filters(RESOURCES_PATH, &results.active))
            (result_summary(results))
            ul.resource-list {
                @for resource in &results.items {
                    li.resource-card {
                        @if let Some(image) = &resource.image {
                            img src=(image) alt=(resource.name) loading="lazy";
                        }
                        h3 {
                            @if let Some(link) = &resource.link {
                                a href=(link) target="_blank" rel="noopener" { (resource.name) }
                            } @else {
                                (resource.name)
                            }
                        }
                        @if !resource.author.is_empty() {
                            p.author { "by " (resource.author) }
                        }
                        @if !resource.age_group.is_empty() {
                            p.age-group { "Ages: " (resource.age_group) }
                        }
                    }
                }
            }
            (pagination(RESOURCES_PATH, results))
        }
    }
}

pub fn resource_search_page(
    chrome: &SiteChrome,
    index: &Page,
    results: &SearchResults<Resource>,
) -> Markup {
    let content = html! {
        section.directory {
            h1 { (index.title) }
            @if !index.intro.is_empty() {
                p.intro { (index.intro) }
            }
            div.directory-layout {
                aside.filters {
                    (filter_form(RESOURCES_PATH, results.selection.text.as_deref(), &results.panels))
                }
                (resource_results(results))
            }
        }
    };
    layout(chrome, &index.title, content)
}

pub fn program_detail_page(chrome: &SiteChrome, detail: &ProgramDetail) -> Markup {
    let program = &detail.program;
    let profile = &program.profile;
    let content = html! {
        article.program-detail {
            @if let Some(logo) = &profile.logo_image {
                img.logo src=(logo) alt=(program.title);
            }
            h1 { (program.title) }
            @if let Some(provider) = &profile.provider {
                p.provider { (provider) }
            }
            @if let Some(summary) = &profile.program_summary {
                p.summary { (summary) }
            }
            table.essential-info {
                @for (label, value) in detail.essential_info() {
                    tr {
                        th scope="row" { (label) }
                        td { (value) }
                    }
                }
            }
            @if let Some(overview) = &profile.program_overview {
                section.overview {
                    h2 { "Overview" }
                    (PreEscaped(overview))
                }
            }
            @if let Some(details) = &profile.application_details {
                section.application {
                    h2 { "How to apply" }
                    p { (details) }
                }
            }
            ul.links {
                @if let Some(website) = &profile.website {
                    li { a href=(website) target="_blank" rel="noopener" { "Website" } }
                }
                @if let Some(email) = &profile.email {
                    li { a href=(format!("mailto:{email}")) { (email) } }
                }
                @if let Some(phone) = &profile.phone {
                    li { (phone) }
                }
            }
            p { a href=(PROGRAMS_PATH) { "Back to all programs" } }
        }
    };
    layout(chrome, &program.title, content)
}
