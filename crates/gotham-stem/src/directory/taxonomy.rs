use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermId(pub i64);

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which directory collection a taxonomy classifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxonomyOwner {
    Programs,
    Resources,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxonomyKind {
    ProgramType,
    ProgramDelivery,
    ProgramLocation,
    NycNeighborhood,
    SessionStart,
    SessionLength,
    FeesCategory,
    GenderFilter,
    FocusTopic,
    AgeGroup,
    Selectivity,
    ResourceCategory,
    ResourceAcademicStage,
}

impl TaxonomyKind {
    pub const fn ordered() -> [Self; 13] {
        [
            Self::ProgramType,
            Self::ProgramDelivery,
            Self::ProgramLocation,
            Self::NycNeighborhood,
            Self::SessionStart,
            Self::SessionLength,
            Self::FeesCategory,
            Self::GenderFilter,
            Self::FocusTopic,
            Self::AgeGroup,
            Self::Selectivity,
            Self::ResourceCategory,
            Self::ResourceAcademicStage,
        ]
    }

    /// Stable key used in storage and admin URLs.
    pub const fn key(self) -> &'static str {
        match self {
            Self::ProgramType => "program_type",
            Self::ProgramDelivery => "program_delivery",
            Self::ProgramLocation => "program_location",
            Self::NycNeighborhood => "nyc_neighborhood",
            Self::SessionStart => "session_start",
            Self::SessionLength => "session_length",
            Self::FeesCategory => "fees_category",
            Self::GenderFilter => "gender_filter",
            Self::FocusTopic => "focus_topic",
            Self::AgeGroup => "age_group",
            Self::Selectivity => "selectivity",
            Self::ResourceCategory => "resource_category",
            Self::ResourceAcademicStage => "resource_academic_stage",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ProgramType => "Program Type",
            Self::ProgramDelivery => "Program Delivery Method",
            Self::ProgramLocation => "Location Type",
            Self::NycNeighborhood => "NYC Neighborhood",
            Self::SessionStart => "Session Start Month",
            Self::SessionLength => "Session Length",
            Self::FeesCategory => "Fees Category",
            Self::GenderFilter => "Gender Filter",
            Self::FocusTopic => "Focus/Topic",
            Self::AgeGroup => "Age Group",
            Self::Selectivity => "Program Selectivity",
            Self::ResourceCategory => "Resource Category",
            Self::ResourceAcademicStage => "Academic Stage",
        }
    }

    pub const fn plural_label(self) -> &'static str {
        match self {
            Self::ProgramType => "Program Types",
            Self::ProgramDelivery => "Program Delivery Methods",
            Self::ProgramLocation => "Location Types",
            Self::NycNeighborhood => "NYC Neighborhoods",
            Self::SessionStart => "Session Start Months",
            Self::SessionLength => "Session Lengths",
            Self::FeesCategory => "Fees Categories",
            Self::GenderFilter => "Gender Filters",
            Self::FocusTopic => "Focus/Topics",
            Self::AgeGroup => "Age Groups",
            Self::Selectivity => "Program Selectivity",
            Self::ResourceCategory => "Resource Categories",
            Self::ResourceAcademicStage => "Academic Stages",
        }
    }

    pub const fn owner(self) -> TaxonomyOwner {
        match self {
            Self::ResourceCategory | Self::ResourceAcademicStage => TaxonomyOwner::Resources,
            _ => TaxonomyOwner::Programs,
        }
    }
}

impl fmt::Display for TaxonomyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown taxonomy '{0}'")]
pub struct UnknownTaxonomy(pub String);

impl FromStr for TaxonomyKind {
    type Err = UnknownTaxonomy;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim().to_ascii_lowercase().replace('-', "_");
        Self::ordered()
            .into_iter()
            .find(|kind| kind.key() == wanted)
            .ok_or_else(|| UnknownTaxonomy(raw.to_string()))
    }
}

/// A named, sluggable classification value referenced by programs or resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyTerm {
    pub id: TermId,
    pub kind: TaxonomyKind,
    pub name: String,
    pub slug: String,
}

/// Term ready for insertion; the slug is already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTerm {
    pub kind: TaxonomyKind,
    pub name: String,
    pub slug: String,
}

/// Editor-supplied changes to an existing term.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TermPatch {
    #[serde(default)]
    pub name: Option<String>,
    /// Regenerate the slug from the (possibly new) name.
    #[serde(default)]
    pub reset_slug: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TermValidationError {
    #[error("name must not be blank")]
    BlankName,
    #[error("name '{0}' does not produce a usable slug")]
    UnsluggableName(String),
}

impl TaxonomyTerm {
    /// Resolves a new term, generating the slug from the name when none is given.
    pub fn draft(
        kind: TaxonomyKind,
        name: &str,
        slug: Option<&str>,
    ) -> Result<NewTerm, TermValidationError> {
        let name = clean_name(name)?;
        let slug = match slug.map(slugify).filter(|slug| !slug.is_empty()) {
            Some(slug) => slug,
            None => slug_for(&name)?,
        };
        Ok(NewTerm { kind, name, slug })
    }

    /// Applies an edit; the slug only changes when the editor explicitly resets it.
    pub fn apply(&self, patch: &TermPatch) -> Result<TaxonomyTerm, TermValidationError> {
        let name = match &patch.name {
            Some(name) => clean_name(name)?,
            None => self.name.clone(),
        };
        let slug = if patch.reset_slug || self.slug.is_empty() {
            slug_for(&name)?
        } else {
            self.slug.clone()
        };

        Ok(TaxonomyTerm {
            id: self.id,
            kind: self.kind,
            name,
            slug,
        })
    }
}

fn clean_name(raw: &str) -> Result<String, TermValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(TermValidationError::BlankName);
    }
    Ok(name.to_string())
}

fn slug_for(name: &str) -> Result<String, TermValidationError> {
    let slug = slugify(name);
    if slug.is_empty() {
        return Err(TermValidationError::UnsluggableName(name.to_string()));
    }
    Ok(slug)
}

/// Lowercase ASCII slug: word characters survive, whitespace and hyphen runs
/// collapse to one hyphen, everything else is dropped.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_separator = false;

    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(ch.to_ascii_lowercase());
        } else if ch.is_whitespace() || ch == '-' {
            pending_separator = true;
        }
    }

    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}
