use serde::{Deserialize, Serialize};
use std::fmt;

use crate::directory::taxonomy::slugify;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(pub i64);

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Typed node of the page tree. Each kind lists the parents and children it accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    Root,
    Home,
    About,
    Guidance,
    ProgramIndex,
    ResourceIndex,
    NewsletterIndex,
    Newsletter,
    Contact,
    PrivacyPolicy,
    TermsAndServices,
}

const HOME_CHILDREN: &[PageKind] = &[
    PageKind::About,
    PageKind::Guidance,
    PageKind::ProgramIndex,
    PageKind::ResourceIndex,
    PageKind::NewsletterIndex,
    PageKind::Contact,
    PageKind::PrivacyPolicy,
    PageKind::TermsAndServices,
];

impl PageKind {
    pub const fn ordered() -> [Self; 11] {
        [
            Self::Root,
            Self::Home,
            Self::About,
            Self::Guidance,
            Self::ProgramIndex,
            Self::ResourceIndex,
            Self::NewsletterIndex,
            Self::Newsletter,
            Self::Contact,
            Self::PrivacyPolicy,
            Self::TermsAndServices,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Home => "home",
            Self::About => "about",
            Self::Guidance => "guidance",
            Self::ProgramIndex => "program_index",
            Self::ResourceIndex => "resource_index",
            Self::NewsletterIndex => "newsletter_index",
            Self::Newsletter => "newsletter",
            Self::Contact => "contact",
            Self::PrivacyPolicy => "privacy_policy",
            Self::TermsAndServices => "terms_and_services",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Root => "Root",
            Self::Home => "Gotham Homepage",
            Self::About => "About",
            Self::Guidance => "Guidance",
            Self::ProgramIndex => "Programs",
            Self::ResourceIndex => "Resources",
            Self::NewsletterIndex => "Newsletter Index",
            Self::Newsletter => "Newsletter",
            Self::Contact => "Contact",
            Self::PrivacyPolicy => "Privacy Policy",
            Self::TermsAndServices => "Terms and Services",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ordered().into_iter().find(|kind| kind.key() == key)
    }

    pub const fn parent_kinds(self) -> &'static [PageKind] {
        match self {
            Self::Root => &[],
            Self::Home => &[PageKind::Root],
            Self::Newsletter => &[PageKind::NewsletterIndex],
            _ => &[PageKind::Home],
        }
    }

    pub const fn child_kinds(self) -> &'static [PageKind] {
        match self {
            Self::Root => &[PageKind::Home],
            Self::Home => HOME_CHILDREN,
            Self::NewsletterIndex => &[PageKind::Newsletter],
            _ => &[],
        }
    }

    /// Program records may only be filed under program index pages.
    pub const fn accepts_programs(self) -> bool {
        matches!(self, Self::ProgramIndex)
    }

    /// Kinds rendered by the generic static page view.
    pub const fn is_static(self) -> bool {
        matches!(
            self,
            Self::About | Self::Guidance | Self::PrivacyPolicy | Self::TermsAndServices
        )
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Typed body block. Paragraph and raw HTML content is authored by trusted editors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Heading { text: String },
    Paragraph { html: String },
    Image { src: String, alt: String },
    Button { text: String, url: String },
    RawHtml { html: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub parent_id: Option<PageId>,
    pub kind: PageKind,
    pub title: String,
    pub slug: String,
    pub live: bool,
    pub show_in_menu: bool,
    pub hero_image: Option<String>,
    pub intro: String,
    pub body: Vec<ContentBlock>,
    pub featured: Vec<PageId>,
}

/// Maximum number of featured pages shown on the home page.
pub const MAX_FEATURED: usize = 3;

/// Page ready for insertion below an existing parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPage {
    pub parent_id: PageId,
    pub kind: PageKind,
    pub title: String,
    pub slug: String,
    pub live: bool,
    pub show_in_menu: bool,
    pub hero_image: Option<String>,
    pub intro: String,
    pub body: Vec<ContentBlock>,
    pub featured: Vec<PageId>,
}

/// Editor payload for creating a page.
#[derive(Debug, Clone, Deserialize)]
pub struct PageDraft {
    pub parent_id: PageId,
    pub kind: PageKind,
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub live: bool,
    #[serde(default)]
    pub show_in_menu: bool,
    #[serde(default)]
    pub hero_image: Option<String>,
    #[serde(default)]
    pub intro: String,
    #[serde(default)]
    pub body: Vec<ContentBlock>,
    #[serde(default)]
    pub featured: Vec<PageId>,
}

/// Editor payload for updating a page; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PagePatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub live: Option<bool>,
    #[serde(default)]
    pub show_in_menu: Option<bool>,
    #[serde(default)]
    pub hero_image: Option<String>,
    #[serde(default)]
    pub intro: Option<String>,
    #[serde(default)]
    pub body: Option<Vec<ContentBlock>>,
    #[serde(default)]
    pub featured: Option<Vec<PageId>>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("title must not be blank")]
    BlankTitle,
    #[error("title '{0}' does not produce a usable slug")]
    UnsluggableTitle(String),
    #[error("a {child} page cannot be created under a {parent} page")]
    IllegalPlacement { parent: PageKind, child: PageKind },
    #[error("at most 3 featured pages are allowed")]
    TooManyFeatured,
}

/// Checks both sides of the parent/child rule.
pub fn validate_placement(parent: PageKind, child: PageKind) -> Result<(), TreeError> {
    if parent.child_kinds().contains(&child) && child.parent_kinds().contains(&parent) {
        Ok(())
    } else {
        Err(TreeError::IllegalPlacement { parent, child })
    }
}

impl PageDraft {
    pub fn resolve(self, parent: &Page) -> Result<NewPage, TreeError> {
        validate_placement(parent.kind, self.kind)?;

        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(TreeError::BlankTitle);
        }
        let slug = self
            .slug
            .as_deref()
            .map(slugify)
            .filter(|slug| !slug.is_empty())
            .unwrap_or_else(|| slugify(&title));
        if slug.is_empty() {
            return Err(TreeError::UnsluggableTitle(title));
        }
        if self.featured.len() > MAX_FEATURED {
            return Err(TreeError::TooManyFeatured);
        }

        Ok(NewPage {
            parent_id: parent.id,
            kind: self.kind,
            title,
            slug,
            live: self.live,
            show_in_menu: self.show_in_menu,
            hero_image: self.hero_image,
            intro: self.intro,
            body: self.body,
            featured: self.featured,
        })
    }
}

impl Page {
    pub fn apply(&self, patch: PagePatch) -> Result<Page, TreeError> {
        let mut page = self.clone();
        if let Some(title) = patch.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(TreeError::BlankTitle);
            }
            page.title = title;
        }
        if let Some(featured) = patch.featured {
            if featured.len() > MAX_FEATURED {
                return Err(TreeError::TooManyFeatured);
            }
            page.featured = featured;
        }
        if let Some(live) = patch.live {
            page.live = live;
        }
        if let Some(show_in_menu) = patch.show_in_menu {
            page.show_in_menu = show_in_menu;
        }
        if let Some(hero_image) = patch.hero_image {
            page.hero_image = Some(hero_image).filter(|value| !value.is_empty());
        }
        if let Some(intro) = patch.intro {
            page.intro = intro;
        }
        if let Some(body) = patch.body {
            page.body = body;
        }
        Ok(page)
    }

    /// Public URL of the page on the site.
    pub fn href(&self) -> String {
        match self.kind {
            PageKind::Root | PageKind::Home => "/".to_string(),
            PageKind::ProgramIndex => "/programs".to_string(),
            PageKind::ResourceIndex => "/resources".to_string(),
            PageKind::Contact => "/contact".to_string(),
            PageKind::Newsletter => format!("/newsletters/{}", self.slug),
            _ => format!("/pages/{}", self.slug),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(id: i64, kind: PageKind) -> Page {
        Page {
            id: PageId(id),
            parent_id: None,
            kind,
            title: kind.label().to_string(),
            slug: kind.key().to_string(),
            live: true,
            show_in_menu: false,
            hero_image: None,
            intro: String::new(),
            body: Vec::new(),
            featured: Vec::new(),
        }
    }

    fn draft(kind: PageKind, title: &str) -> PageDraft {
        serde_json::from_value(serde_json::json!({
            "parent_id": 1,
            "kind": kind.key(),
            "title": title,
        }))
        .expect("draft parses")
    }

    #[test]
    fn home_children_follow_tree_rules() {
        for child in HOME_CHILDREN {
            assert!(validate_placement(PageKind::Home, *child).is_ok());
        }
        assert!(validate_placement(PageKind::Root, PageKind::Home).is_ok());
        assert!(validate_placement(PageKind::NewsletterIndex, PageKind::Newsletter).is_ok());
    }

    #[test]
    fn illegal_placements_are_rejected() {
        assert_eq!(
            validate_placement(PageKind::Home, PageKind::Newsletter),
            Err(TreeError::IllegalPlacement {
                parent: PageKind::Home,
                child: PageKind::Newsletter,
            })
        );
        assert!(validate_placement(PageKind::Root, PageKind::About).is_err());
        assert!(validate_placement(PageKind::ProgramIndex, PageKind::About).is_err());
        assert!(validate_placement(PageKind::Home, PageKind::Home).is_err());
    }

    #[test]
    fn only_program_indexes_accept_programs() {
        let accepting: Vec<PageKind> = PageKind::ordered()
            .into_iter()
            .filter(|kind| kind.accepts_programs())
            .collect();
        assert_eq!(accepting, [PageKind::ProgramIndex]);
    }

    #[test]
    fn draft_resolves_slug_from_title() {
        let parent = page(1, PageKind::Home);
        let resolved = draft(PageKind::About, "  About Gotham STEM ")
            .resolve(&parent)
            .expect("valid draft");
        assert_eq!(resolved.title, "About Gotham STEM");
        assert_eq!(resolved.slug, "about-gotham-stem");
        assert_eq!(resolved.parent_id, PageId(1));
    }

    #[test]
    fn draft_rejects_blank_titles() {
        let parent = page(1, PageKind::Home);
        assert_eq!(
            draft(PageKind::About, "  ").resolve(&parent),
            Err(TreeError::BlankTitle)
        );
    }

    #[test]
    fn patch_caps_featured_pages() {
        let home = page(2, PageKind::Home);
        let patch = PagePatch {
            featured: Some(vec![PageId(3), PageId(4), PageId(5), PageId(6)]),
            ..PagePatch::default()
        };
        assert_eq!(home.apply(patch), Err(TreeError::TooManyFeatured));
    }

    #[test]
    fn hrefs_follow_site_routes() {
        assert_eq!(page(2, PageKind::Home).href(), "/");
        assert_eq!(page(3, PageKind::ProgramIndex).href(), "/programs");
        assert_eq!(page(4, PageKind::About).href(), "/pages/about");
        assert_eq!(page(5, PageKind::Newsletter).href(), "/newsletters/newsletter");
    }
}
