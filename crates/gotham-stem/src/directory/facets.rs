//! Static facet tables and query-string parsing for the directory search views.

use serde::Serialize;
use url::form_urlencoded;

use super::taxonomy::TaxonomyKind;

pub const TEXT_QUERY_PARAM: &str = "q";
pub const PAGE_PARAM: &str = "page";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Multiplicity {
    Single,
    Multi,
}

/// One filter axis: request parameter, heading, and the taxonomy it matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FacetDefinition {
    pub param: &'static str,
    pub label: &'static str,
    pub kind: TaxonomyKind,
    pub multiplicity: Multiplicity,
}

const fn multi(param: &'static str, label: &'static str, kind: TaxonomyKind) -> FacetDefinition {
    FacetDefinition {
        param,
        label,
        kind,
        multiplicity: Multiplicity::Multi,
    }
}

pub static PROGRAM_FACETS: [FacetDefinition; 11] = [
    multi("program_types", "type of program", TaxonomyKind::ProgramType),
    multi(
        "program_delivery",
        "program delivery",
        TaxonomyKind::ProgramDelivery,
    ),
    multi("focus_topics", "topics", TaxonomyKind::FocusTopic),
    multi("locations", "location", TaxonomyKind::ProgramLocation),
    multi(
        "nyc_neighborhood",
        "nyc neighborhood",
        TaxonomyKind::NycNeighborhood,
    ),
    multi("session_start", "session start", TaxonomyKind::SessionStart),
    multi("session_length", "session length", TaxonomyKind::SessionLength),
    multi("age_groups", "ages", TaxonomyKind::AgeGroup),
    multi("gender", "gender", TaxonomyKind::GenderFilter),
    multi("fees_category", "fees", TaxonomyKind::FeesCategory),
    multi("selectivity", "selective", TaxonomyKind::Selectivity),
];

pub static RESOURCE_FACETS: [FacetDefinition; 2] = [
    multi("categories", "category", TaxonomyKind::ResourceCategory),
    multi(
        "academic_stages",
        "academic stage",
        TaxonomyKind::ResourceAcademicStage,
    ),
];

/// Values chosen for one facet, in request order with duplicates removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedFacet {
    pub param: &'static str,
    pub label: &'static str,
    pub kind: TaxonomyKind,
    pub values: Vec<String>,
}

/// Everything a visitor selected on a search page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSelection {
    pub text: Option<String>,
    pub facets: Vec<SelectedFacet>,
    pub page: Option<String>,
}

impl FilterSelection {
    /// Parses a raw query string against a facet table.
    ///
    /// Repeated keys and comma-separated values both select several slugs; blank values
    /// are dropped and a facet left with nothing is treated as absent.
    pub fn parse(raw_query: Option<&str>, table: &'static [FacetDefinition]) -> Self {
        let pairs: Vec<(String, String)> = raw_query
            .map(|raw| {
                form_urlencoded::parse(raw.trim_start_matches('?').as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default();
        Self::from_pairs(&pairs, table)
    }

    pub fn from_pairs(pairs: &[(String, String)], table: &'static [FacetDefinition]) -> Self {
        let text = pairs
            .iter()
            .find(|(key, _)| key == TEXT_QUERY_PARAM)
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let page = pairs
            .iter()
            .find(|(key, _)| key == PAGE_PARAM)
            .map(|(_, value)| value.clone());

        let facets = table
            .iter()
            .filter_map(|definition| {
                let mut values: Vec<String> = Vec::new();
                for (_, raw) in pairs.iter().filter(|(key, _)| key == definition.param) {
                    for value in raw.split(',').map(str::trim).filter(|v| !v.is_empty()) {
                        if !values.iter().any(|existing| existing == value) {
                            values.push(value.to_string());
                        }
                    }
                }

                if definition.multiplicity == Multiplicity::Single {
                    values.truncate(1);
                }

                (!values.is_empty()).then(|| SelectedFacet {
                    param: definition.param,
                    label: definition.label,
                    kind: definition.kind,
                    values,
                })
            })
            .collect();

        Self { text, facets, page }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.facets.is_empty()
    }

    pub fn values_for(&self, param: &str) -> &[String] {
        self.facets
            .iter()
            .find(|facet| facet.param == param)
            .map(|facet| facet.values.as_slice())
            .unwrap_or(&[])
    }

    /// Query string for the current selection without page number.
    pub fn to_query_string(&self) -> String {
        self.encode(|_, _| true)
    }

    /// Query string for a "remove this filter" link.
    pub fn without(&self, param: &str, value: &str) -> String {
        self.encode(|facet_param, facet_value| !(facet_param == param && facet_value == value))
    }

    /// Query string for a link that drops the text query only.
    pub fn without_text(&self) -> String {
        let mut stripped = self.clone();
        stripped.text = None;
        stripped.to_query_string()
    }

    /// Query string selecting a specific page of the current results.
    pub fn with_page(&self, page: u64) -> String {
        let base = self.to_query_string();
        let mut serializer = form_urlencoded::Serializer::for_suffix(base, 0);
        serializer.append_pair(PAGE_PARAM, &page.to_string());
        serializer.finish()
    }

    fn encode(&self, keep: impl Fn(&str, &str) -> bool) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        if let Some(text) = &self.text {
            serializer.append_pair(TEXT_QUERY_PARAM, text);
        }
        for facet in &self.facets {
            for value in &facet.values {
                if keep(facet.param, value) {
                    serializer.append_pair(facet.param, value);
                }
            }
        }
        serializer.finish()
    }
}
