use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::domain::{Program, Resource};
use super::facets::{
    FacetDefinition, FilterSelection, Multiplicity, PROGRAM_FACETS, RESOURCE_FACETS,
    TEXT_QUERY_PARAM,
};
use super::pagination::{PageWindow, Paginator};
use super::query::FacetQuery;
use super::repository::DirectoryStore;
use super::taxonomy::{TaxonomyKind, TaxonomyTerm};
use crate::pages::domain::{Page, PageKind};
use crate::pages::repository::PageStore;
use crate::store::{Slice, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetOption {
    pub name: String,
    pub slug: String,
    pub selected: bool,
}

/// A facet as rendered in the filter sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetPanel {
    pub param: &'static str,
    pub label: &'static str,
    pub multiplicity: Multiplicity,
    pub options: Vec<FacetOption>,
}

/// One selected value with the query string that removes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveFilter {
    pub param: &'static str,
    pub label: &'static str,
    pub value: String,
    pub display: String,
    pub remove_query: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResults<T> {
    pub items: Vec<T>,
    pub window: PageWindow,
    pub panels: Vec<FacetPanel>,
    pub selection: FilterSelection,
    pub active: Vec<ActiveFilter>,
}

impl<T> SearchResults<T> {
    /// Selected values keyed by parameter in facet order, with `q` last when present.
    pub fn selected_filters(&self) -> Vec<(&'static str, Vec<String>)> {
        let mut selected: Vec<(&'static str, Vec<String>)> = self
            .selection
            .facets
            .iter()
            .map(|facet| (facet.param, facet.values.clone()))
            .collect();
        if let Some(text) = &self.selection.text {
            selected.push((TEXT_QUERY_PARAM, vec![text.clone()]));
        }
        selected
    }

    pub fn page_query(&self, page: u64) -> String {
        self.selection.with_page(page)
    }
}

/// A program together with the taxonomy terms it is tagged with.
#[derive(Debug, Clone, Serialize)]
pub struct ProgramDetail {
    pub program: Program,
    pub terms: Vec<TaxonomyTerm>,
}

impl ProgramDetail {
    /// Comma-joined term names of one kind, or "Varies/N/A" when untagged.
    pub fn names(&self, kind: TaxonomyKind) -> String {
        let names: Vec<&str> = self
            .terms
            .iter()
            .filter(|term| term.kind == kind)
            .map(|term| term.name.as_str())
            .collect();
        if names.is_empty() {
            "Varies/N/A".to_string()
        } else {
            names.join(", ")
        }
    }

    pub fn essential_info(&self) -> Vec<(&'static str, String)> {
        ESSENTIAL_INFO
            .iter()
            .map(|(label, value)| (*label, value(self)))
            .collect()
    }
}

fn or_default(value: &Option<String>, fallback: &str) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

pub type InfoAccessor = fn(&ProgramDetail) -> String;

/// Rows of the "essential info" table on a program page.
pub static ESSENTIAL_INFO: [(&str, InfoAccessor); 15] = [
    ("Program type", |d| d.names(TaxonomyKind::ProgramType)),
    ("Program delivery", |d| d.names(TaxonomyKind::ProgramDelivery)),
    ("Location", |d| d.names(TaxonomyKind::ProgramLocation)),
    ("NYC Neighborhood", |d| d.names(TaxonomyKind::NycNeighborhood)),
    ("Topics", |d| d.names(TaxonomyKind::FocusTopic)),
    ("Session Starts", |d| d.names(TaxonomyKind::SessionStart)),
    ("Session length", |d| d.names(TaxonomyKind::SessionLength)),
    ("Ages", |d| d.names(TaxonomyKind::AgeGroup)),
    ("Gender", |d| d.names(TaxonomyKind::GenderFilter)),
    ("Selective", |d| {
        d.program.profile.application_selective.label().to_string()
    }),
    ("Application Deadline", |d| {
        d.program
            .profile
            .application_deadline
            .map(|date| date.format("%B %d, %Y").to_string())
            .unwrap_or_else(|| "Rolling/N/A".to_string())
    }),
    ("Cost", |d| or_default(&d.program.profile.cost, "Varies/N/A")),
    ("Scholarships/Financial Aid", |d| {
        or_default(&d.program.profile.scholarship_fin_aid, "Contact for details")
    }),
    ("Accreditation", |d| {
        or_default(&d.program.profile.accreditation, "N/A")
    }),
    ("Years in Business", |d| {
        or_default(&d.program.profile.years_in_business, "N/A")
    }),
];

/// Read-only faceted search over live programs and resources.
pub struct DirectoryService {
    store: Arc<dyn DirectoryStore>,
    pages: Arc<dyn PageStore>,
    paginator: Paginator,
}

impl DirectoryService {
    pub fn new(store: Arc<dyn DirectoryStore>, pages: Arc<dyn PageStore>) -> Self {
        Self {
            store,
            pages,
            paginator: Paginator::default(),
        }
    }

    pub fn with_paginator(mut self, paginator: Paginator) -> Self {
        self.paginator = paginator;
        self
    }

    pub fn store(&self) -> &Arc<dyn DirectoryStore> {
        &self.store
    }

    /// First live program index page, if any.
    pub async fn program_index(&self) -> Result<Option<Page>, StoreError> {
        self.first_live(PageKind::ProgramIndex).await
    }

    pub async fn resource_index(&self) -> Result<Option<Page>, StoreError> {
        self.first_live(PageKind::ResourceIndex).await
    }

    async fn first_live(&self, kind: PageKind) -> Result<Option<Page>, StoreError> {
        Ok(self
            .pages
            .pages_of_kind(kind)
            .await?
            .into_iter()
            .find(|page| page.live))
    }

    pub async fn search_programs(
        &self,
        index: &Page,
        raw_query: Option<&str>,
    ) -> Result<SearchResults<Program>, StoreError> {
        let selection = FilterSelection::parse(raw_query, &PROGRAM_FACETS);
        let query = FacetQuery::from_selection(&selection).under(index.id);

        let total = self.store.count_programs(&query).await?;
        let window = self.paginator.window(total, selection.page.as_deref());
        let items = self
            .store
            .search_programs(&query, Slice::window(window.offset(), window.limit()))
            .await?;
        debug!(
            index = %index.id,
            total,
            page = window.number,
            facets = selection.facets.len(),
            "program search"
        );

        let (panels, active) = self.describe(&PROGRAM_FACETS, &selection).await?;
        Ok(SearchResults {
            items,
            window,
            panels,
            selection,
            active,
        })
    }

    pub async fn search_resources(
        &self,
        raw_query: Option<&str>,
    ) -> Result<SearchResults<Resource>, StoreError> {
        let selection = FilterSelection::parse(raw_query, &RESOURCE_FACETS);
        let query = FacetQuery::from_selection(&selection);

        let total = self.store.count_resources(&query).await?;
        let window = self.paginator.window(total, selection.page.as_deref());
        let items = self
            .store
            .search_resources(&query, Slice::window(window.offset(), window.limit()))
            .await?;
        debug!(total, page = window.number, "resource search");

        let (panels, active) = self.describe(&RESOURCE_FACETS, &selection).await?;
        Ok(SearchResults {
            items,
            window,
            panels,
            selection,
            active,
        })
    }

    /// Live program by slug with its terms resolved.
    pub async fn program_detail(&self, slug: &str) -> Result<Option<ProgramDetail>, StoreError> {
        let Some(program) = self.store.program_by_slug(slug).await? else {
            return Ok(None);
        };
        if !program.live {
            return Ok(None);
        }
        let ids: Vec<_> = program.terms.iter().copied().collect();
        let terms = self.store.terms_by_ids(&ids).await?;
        Ok(Some(ProgramDetail { program, terms }))
    }

    async fn describe(
        &self,
        table: &'static [FacetDefinition],
        selection: &FilterSelection,
    ) -> Result<(Vec<FacetPanel>, Vec<ActiveFilter>), StoreError> {
        let mut panels = Vec::with_capacity(table.len());
        let mut names: BTreeMap<(&'static str, String), String> = BTreeMap::new();

        for definition in table {
            let chosen = selection.values_for(definition.param);
            let options = self
                .store
                .terms(definition.kind)
                .await?
                .into_iter()
                .map(|term| {
                    let selected = chosen.contains(&term.slug);
                    if selected {
                        names.insert((definition.param, term.slug.clone()), term.name.clone());
                    }
                    FacetOption {
                        name: term.name,
                        slug: term.slug,
                        selected,
                    }
                })
                .collect();
            panels.push(FacetPanel {
                param: definition.param,
                label: definition.label,
                multiplicity: definition.multiplicity,
                options,
            });
        }

        let mut active = Vec::new();
        for facet in &selection.facets {
            for value in &facet.values {
                let display = names
                    .get(&(facet.param, value.clone()))
                    .cloned()
                    .unwrap_or_else(|| value.clone());
                active.push(ActiveFilter {
                    param: facet.param,
                    label: facet.label,
                    value: value.clone(),
                    display,
                    remove_query: selection.without(facet.param, value),
                });
            }
        }
        if let Some(text) = &selection.text {
            active.push(ActiveFilter {
                param: TEXT_QUERY_PARAM,
                label: "search",
                value: text.clone(),
                display: format!("\u{201c}{text}\u{201d}"),
                remove_query: selection.without_text(),
            });
        }

        Ok((panels, active))
    }
}
