use std::collections::BTreeSet;

use serde::Deserialize;

use super::facets::FilterSelection;
use super::taxonomy::{TaxonomyKind, TaxonomyTerm, TermId};
use crate::pages::PageId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusScope {
    #[default]
    LiveOnly,
    DraftOnly,
    All,
}

impl StatusScope {
    pub fn admits(self, live: bool) -> bool {
        match self {
            Self::LiveOnly => live,
            Self::DraftOnly => !live,
            Self::All => true,
        }
    }
}

/// Records must carry at least one term of `kind` whose slug is listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetClause {
    pub kind: TaxonomyKind,
    pub slugs: Vec<String>,
}

/// Store-agnostic description of a directory listing: text tokens and facet clauses
/// are all required (AND); slugs inside one clause are alternatives (OR).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetQuery {
    pub status: StatusScope,
    pub parent: Option<PageId>,
    pub text_tokens: Vec<String>,
    pub clauses: Vec<FacetClause>,
}

impl FacetQuery {
    pub fn live() -> Self {
        Self::default()
    }

    pub fn from_selection(selection: &FilterSelection) -> Self {
        let mut query = Self::live();
        if let Some(text) = &selection.text {
            query = query.with_text(text);
        }
        query.clauses = selection
            .facets
            .iter()
            .map(|facet| FacetClause {
                kind: facet.kind,
                slugs: facet.values.clone(),
            })
            .collect();
        query
    }

    pub fn with_status(mut self, status: StatusScope) -> Self {
        self.status = status;
        self
    }

    pub fn under(mut self, parent: PageId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text_tokens = text
            .split_whitespace()
            .map(|token| token.to_lowercase())
            .collect();
        self
    }

    pub fn matches_text(&self, title: &str) -> bool {
        if self.text_tokens.is_empty() {
            return true;
        }
        let haystack = title.to_lowercase();
        self.text_tokens
            .iter()
            .all(|token| haystack.contains(token.as_str()))
    }

    /// Evaluates the facet clauses against a record's terms.
    pub fn matches_terms<'a, F>(&self, terms: &BTreeSet<TermId>, lookup: F) -> bool
    where
        F: Fn(TermId) -> Option<&'a TaxonomyTerm>,
    {
        self.clauses.iter().all(|clause| {
            terms.iter().filter_map(|id| lookup(*id)).any(|term| {
                term.kind == clause.kind && clause.slugs.iter().any(|slug| *slug == term.slug)
            })
        })
    }
}
