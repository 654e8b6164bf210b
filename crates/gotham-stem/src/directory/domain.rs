use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::taxonomy::{slugify, TermId};
use crate::pages::PageId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgramId(pub i64);

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub i64);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selective {
    Yes,
    No,
    #[default]
    Varies,
}

impl Selective {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
            Self::Varies => "Varies/N/A",
        }
    }
}

fn default_country() -> String {
    "USA".to_string()
}

/// Fixed descriptive attributes of a program listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default)]
    pub logo_image: Option<String>,
    #[serde(default)]
    pub accreditation: Option<String>,
    #[serde(default)]
    pub application_deadline: Option<NaiveDate>,
    #[serde(default)]
    pub application_details: Option<String>,
    #[serde(default)]
    pub application_selective: Selective,
    #[serde(default)]
    pub attached_files: Option<String>,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub contact_private_email: Option<String>,
    #[serde(default)]
    pub contact_private_phone: Option<String>,
    #[serde(default)]
    pub cost: Option<String>,
    #[serde(default)]
    pub event_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub event_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub last_updated: Option<NaiveDate>,
    #[serde(default)]
    pub is_exceptional: bool,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub facebook: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub youtube: Option<String>,
    #[serde(default)]
    pub press_links: Option<String>,
    #[serde(default)]
    pub program_summary: Option<String>,
    /// Trusted rich text authored in the editor.
    #[serde(default)]
    pub program_overview: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub referred_by: Option<String>,
    #[serde(default)]
    pub scholarship_fin_aid: Option<String>,
    #[serde(default)]
    pub scholarship_fin_aid_details: Option<String>,
    #[serde(default)]
    pub scholarship_details: Option<String>,
    #[serde(default)]
    pub years_in_business: Option<String>,
    #[serde(default)]
    pub staff_details: Option<String>,
    #[serde(default)]
    pub my_notes: Option<String>,
}

impl Default for ProgramProfile {
    fn default() -> Self {
        Self {
            name: None,
            email: None,
            phone: None,
            address: None,
            city: None,
            state: None,
            zip_code: None,
            country: default_country(),
            logo_image: None,
            accreditation: None,
            application_deadline: None,
            application_details: None,
            application_selective: Selective::default(),
            attached_files: None,
            contact_person: None,
            contact_private_email: None,
            contact_private_phone: None,
            cost: None,
            event_start_date: None,
            event_end_date: None,
            last_updated: None,
            is_exceptional: false,
            website: None,
            facebook: None,
            twitter: None,
            instagram: None,
            youtube: None,
            press_links: None,
            program_summary: None,
            program_overview: None,
            provider: None,
            referred_by: None,
            scholarship_fin_aid: None,
            scholarship_fin_aid_details: None,
            scholarship_details: None,
            years_in_business: None,
            staff_details: None,
            my_notes: None,
        }
    }
}

/// A directory entry listed under a program index page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub id: ProgramId,
    pub parent_id: PageId,
    pub title: String,
    pub slug: String,
    pub live: bool,
    pub first_published_at: Option<DateTime<Utc>>,
    pub last_published_at: Option<DateTime<Utc>>,
    pub profile: ProgramProfile,
    pub terms: BTreeSet<TermId>,
}

impl Program {
    pub fn status_label(&self) -> &'static str {
        if self.live {
            "Live"
        } else {
            "Draft"
        }
    }

    /// Flips the live flag, stamping publication times on every transition to live.
    pub fn set_live(&mut self, live: bool, now: DateTime<Utc>) {
        if live && !self.live {
            self.first_published_at.get_or_insert(now);
            self.last_published_at = Some(now);
        }
        self.live = live;
    }
}

/// Program ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProgram {
    pub parent_id: PageId,
    pub title: String,
    pub slug: String,
    pub live: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub profile: ProgramProfile,
    pub terms: BTreeSet<TermId>,
}

/// Editor payload for creating or replacing a program.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgramDraft {
    pub parent_id: PageId,
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub live: bool,
    #[serde(default)]
    pub profile: ProgramProfile,
    #[serde(default)]
    pub terms: Vec<TermId>,
}

impl ProgramDraft {
    pub fn resolved_slug(&self) -> String {
        self.slug
            .as_deref()
            .map(slugify)
            .filter(|slug| !slug.is_empty())
            .unwrap_or_else(|| slugify(&self.title))
    }
}

/// A library entry shown on the resources page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,
    pub author: String,
    pub link: Option<String>,
    pub image: Option<String>,
    pub age_group: String,
    pub live: bool,
    pub terms: BTreeSet<TermId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResource {
    pub name: String,
    pub author: String,
    pub link: Option<String>,
    pub image: Option<String>,
    pub age_group: String,
    pub live: bool,
    pub terms: BTreeSet<TermId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDraft {
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub age_group: String,
    #[serde(default = "default_live")]
    pub live: bool,
    #[serde(default)]
    pub terms: Vec<TermId>,
}

fn default_live() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn program() -> Program {
        Program {
            id: ProgramId(1),
            parent_id: PageId(2),
            title: "Robotics Lab".to_string(),
            slug: "robotics-lab".to_string(),
            live: false,
            first_published_at: None,
            last_published_at: None,
            profile: ProgramProfile::default(),
            terms: BTreeSet::new(),
        }
    }

    #[test]
    fn publishing_stamps_first_and_last_times() {
        let first = Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2025, 3, 2, 9, 0, 0).unwrap();
        let mut program = program();

        program.set_live(true, first);
        program.set_live(false, second);
        program.set_live(true, second);

        assert_eq!(program.first_published_at, Some(first));
        assert_eq!(program.last_published_at, Some(second));
        assert_eq!(program.status_label(), "Live");
    }

    #[test]
    fn profile_defaults_country_and_selectivity() {
        let profile: ProgramProfile = serde_json::from_str("{}").expect("empty profile parses");
        assert_eq!(profile.country, "USA");
        assert_eq!(profile.application_selective, Selective::Varies);
    }

    #[test]
    fn draft_slug_falls_back_to_title() {
        let draft: ProgramDraft = serde_json::from_value(serde_json::json!({
            "parent_id": 4,
            "title": "Girls Who Code Club",
        }))
        .expect("draft parses");
        assert_eq!(draft.resolved_slug(), "girls-who-code-club");
    }
}
