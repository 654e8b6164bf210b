//! Sample content for running the site without a database and for tests.

use std::collections::BTreeSet;

use chrono::{NaiveDate, TimeZone, Utc};

use crate::directory::domain::{NewProgram, NewResource, Program, ProgramProfile, Resource, Selective};
use crate::directory::repository::DirectoryStore;
use crate::directory::taxonomy::{slugify, NewTerm, TaxonomyKind, TaxonomyTerm, TermId};
use crate::pages::domain::{ContentBlock, NewPage, Page, PageKind};
use crate::pages::repository::PageStore;
use crate::store::StoreError;

use TaxonomyKind::{
    AgeGroup, FeesCategory, FocusTopic, NycNeighborhood, ProgramDelivery, ProgramType, Selectivity,
};

/// Handles to the seeded records.
#[derive(Debug, Clone)]
pub struct DemoSite {
    pub home: Page,
    pub about: Page,
    pub programs_page: Page,
    pub resources_page: Page,
    pub contact_page: Page,
    pub newsletters_page: Page,
    pub newsletter_issue: Page,
    pub terms: Vec<TaxonomyTerm>,
    pub programs: Vec<Program>,
    pub resources: Vec<Resource>,
}

impl DemoSite {
    /// Id of a seeded term by kind and slug.
    pub fn term(&self, kind: TaxonomyKind, slug: &str) -> Option<TermId> {
        self.terms
            .iter()
            .find(|term| term.kind == kind && term.slug == slug)
            .map(|term| term.id)
    }
}

const TERMS: &[(TaxonomyKind, &[&str])] = &[
    (TaxonomyKind::ProgramType, &["Camp", "Class", "Competition"]),
    (TaxonomyKind::ProgramDelivery, &["In Person", "Online"]),
    (TaxonomyKind::FocusTopic, &["Robotics", "Coding", "Biology"]),
    (TaxonomyKind::AgeGroup, &["Middle School", "High School"]),
    (TaxonomyKind::NycNeighborhood, &["Harlem", "Astoria"]),
    (TaxonomyKind::FeesCategory, &["Free", "Paid"]),
    (TaxonomyKind::Selectivity, &["Open", "Selective"]),
    (TaxonomyKind::SessionLength, &["One Week", "Semester"]),
    (TaxonomyKind::ResourceCategory, &["Books", "Websites"]),
    (
        TaxonomyKind::ResourceAcademicStage,
        &["Elementary", "High School"],
    ),
];

struct ProgramSeed {
    title: &'static str,
    live: bool,
    city: &'static str,
    tags: &'static [(TaxonomyKind, &'static str)],
}

const PROGRAMS: &[ProgramSeed] = &[
    ProgramSeed {
        title: "Robotics Summer Camp",
        live: true,
        city: "New York",
        tags: &[(ProgramType, "camp"), (ProgramDelivery, "in-person"), (FocusTopic, "robotics"), (AgeGroup, "high-school"), (NycNeighborhood, "harlem"), (FeesCategory, "paid"), (Selectivity, "selective")],
    },
    ProgramSeed {
        title: "Intro to Python",
        live: true,
        city: "New York",
        tags: &[(ProgramType, "class"), (ProgramDelivery, "online"), (FocusTopic, "coding"), (AgeGroup, "middle-school"), (FeesCategory, "free"), (Selectivity, "open")],
    },
    ProgramSeed {
        title: "Marine Biology Lab",
        live: true,
        city: "Queens",
        tags: &[(ProgramType, "class"), (ProgramDelivery, "in-person"), (FocusTopic, "biology"), (AgeGroup, "high-school"), (NycNeighborhood, "astoria"), (FeesCategory, "free"), (Selectivity, "open")],
    },
    ProgramSeed {
        title: "Code Olympiad",
        live: true,
        city: "New York",
        tags: &[(ProgramType, "competition"), (ProgramDelivery, "online"), (FocusTopic, "coding"), (AgeGroup, "high-school"), (FeesCategory, "free"), (Selectivity, "selective")],
    },
    ProgramSeed {
        title: "Drone Builders",
        live: true,
        city: "Queens",
        tags: &[(ProgramType, "camp"), (ProgramDelivery, "in-person"), (FocusTopic, "robotics"), (AgeGroup, "middle-school"), (NycNeighborhood, "astoria"), (FeesCategory, "paid"), (Selectivity, "open")],
    },
    ProgramSeed {
        title: "Web Design Workshop",
        live: true,
        city: "New York",
        tags: &[(ProgramType, "class"), (ProgramDelivery, "online"), (FocusTopic, "coding"), (AgeGroup, "high-school"), (FeesCategory, "paid"), (Selectivity, "open")],
    },
    ProgramSeed {
        title: "Young Naturalists",
        live: true,
        city: "New York",
        tags: &[(ProgramType, "camp"), (ProgramDelivery, "in-person"), (FocusTopic, "biology"), (AgeGroup, "middle-school"), (NycNeighborhood, "harlem"), (FeesCategory, "free"), (Selectivity, "open")],
    },
    ProgramSeed {
        title: "Science Fair Prep",
        live: true,
        city: "New York",
        tags: &[(ProgramType, "competition"), (ProgramDelivery, "in-person"), (FocusTopic, "biology"), (AgeGroup, "high-school"), (FeesCategory, "paid"), (Selectivity, "selective")],
    },
    ProgramSeed {
        title: "Game Dev Club",
        live: true,
        city: "New York",
        tags: &[(ProgramType, "class"), (ProgramDelivery, "in-person"), (FocusTopic, "coding"), (AgeGroup, "middle-school"), (NycNeighborhood, "harlem"), (FeesCategory, "free"), (Selectivity, "open")],
    },
    ProgramSeed {
        title: "Rocketry Camp",
        live: true,
        city: "New York",
        tags: &[(ProgramType, "camp"), (ProgramDelivery, "in-person"), (FocusTopic, "robotics"), (AgeGroup, "high-school"), (FeesCategory, "paid"), (Selectivity, "open")],
    },
    ProgramSeed {
        title: "App Inventors",
        live: true,
        city: "New York",
        tags: &[(ProgramType, "class"), (ProgramDelivery, "online"), (FocusTopic, "coding"), (AgeGroup, "middle-school"), (FeesCategory, "paid"), (Selectivity, "open")],
    },
    ProgramSeed {
        title: "Data Science Bootcamp",
        live: true,
        city: "New York",
        tags: &[(ProgramType, "camp"), (ProgramDelivery, "online"), (FocusTopic, "coding"), (AgeGroup, "high-school"), (FeesCategory, "paid"), (Selectivity, "selective")],
    },
    ProgramSeed {
        title: "Quantum Computing Preview",
        live: false,
        city: "New York",
        tags: &[(ProgramType, "class"), (ProgramDelivery, "online"), (FocusTopic, "coding"), (AgeGroup, "high-school")],
    },
];

struct ResourceSeed {
    name: &'static str,
    author: &'static str,
    link: &'static str,
    age_group: &'static str,
    live: bool,
    tags: &'static [(TaxonomyKind, &'static str)],
}

const RESOURCES: &[ResourceSeed] = &[
    ResourceSeed {
        name: "Rosie Revere, Engineer",
        author: "Andrea Beaty",
        link: "https://www.andreabeaty.com/",
        age_group: "5-7",
        live: true,
        tags: &[(TaxonomyKind::ResourceCategory, "books"), (TaxonomyKind::ResourceAcademicStage, "elementary")],
    },
    ResourceSeed {
        name: "Khan Academy",
        author: "Khan Academy",
        link: "https://www.khanacademy.org/",
        age_group: "All ages",
        live: true,
        tags: &[(TaxonomyKind::ResourceCategory, "websites"), (TaxonomyKind::ResourceAcademicStage, "elementary"), (TaxonomyKind::ResourceAcademicStage, "high-school")],
    },
    ResourceSeed {
        name: "The Code Book",
        author: "Simon Singh",
        link: "https://simonsingh.net/books/the-code-book/",
        age_group: "14+",
        live: true,
        tags: &[(TaxonomyKind::ResourceCategory, "books"), (TaxonomyKind::ResourceAcademicStage, "high-school")],
    },
    ResourceSeed {
        name: "Retired Reading List",
        author: "Gotham STEM",
        link: "https://gothamstem.org/",
        age_group: "All ages",
        live: false,
        tags: &[(TaxonomyKind::ResourceCategory, "books")],
    },
];

fn new_page(parent: &Page, kind: PageKind, title: &str, show_in_menu: bool) -> NewPage {
    NewPage {
        parent_id: parent.id,
        kind,
        title: title.to_string(),
        slug: slugify(title),
        live: true,
        show_in_menu,
        hero_image: None,
        intro: String::new(),
        body: Vec::new(),
        featured: Vec::new(),
    }
}

/// Seeds a small but complete site: page tree, taxonomy, programs and resources.
pub async fn seed_demo_site(
    pages: &dyn PageStore,
    directory: &dyn DirectoryStore,
) -> Result<DemoSite, StoreError> {
    let root = pages.root().await?;
    let mut home = pages
        .insert_page(NewPage {
            intro: "<p>Find STEM programs for New York City students.</p>".to_string(),
            body: vec![ContentBlock::Button {
                text: "Browse programs".to_string(),
                url: "/programs".to_string(),
            }],
            ..new_page(&root, PageKind::Home, "Home", false)
        })
        .await?;

    let about = pages
        .insert_page(NewPage {
            intro: "Who we are.".to_string(),
            body: vec![
                ContentBlock::Heading {
                    text: "Our mission".to_string(),
                },
                ContentBlock::Paragraph {
                    html: "<p>Connecting students with science, technology, engineering and math.</p>"
                        .to_string(),
                },
            ],
            ..new_page(&home, PageKind::About, "About", true)
        })
        .await?;
    let programs_page = pages
        .insert_page(new_page(&home, PageKind::ProgramIndex, "Programs", true))
        .await?;
    let resources_page = pages
        .insert_page(new_page(&home, PageKind::ResourceIndex, "Resources", true))
        .await?;
    let contact_page = pages
        .insert_page(new_page(&home, PageKind::Contact, "Contact", true))
        .await?;
    pages
        .insert_page(new_page(&home, PageKind::PrivacyPolicy, "Privacy Policy", false))
        .await?;
    let newsletters_page = pages
        .insert_page(new_page(&home, PageKind::NewsletterIndex, "Newsletters", false))
        .await?;
    let newsletter_issue = pages
        .insert_page(NewPage {
            hero_image: Some("/media/images/spring.png".to_string()),
            body: vec![
                ContentBlock::Paragraph {
                    html: "<p>Summer camp applications are open.</p>".to_string(),
                },
                ContentBlock::Button {
                    text: "See camps".to_string(),
                    url: "/programs?program_types=camp".to_string(),
                },
            ],
            ..new_page(&newsletters_page, PageKind::Newsletter, "Spring Update", false)
        })
        .await?;

    home.featured = vec![about.id, programs_page.id, resources_page.id];
    let home = pages.update_page(home).await?;

    let mut terms = Vec::new();
    for (kind, names) in TERMS {
        for name in names.iter() {
            let term = directory
                .insert_term(NewTerm {
                    kind: *kind,
                    name: (*name).to_string(),
                    slug: slugify(name),
                })
                .await?;
            terms.push(term);
        }
    }
    let lookup = |tags: &[(TaxonomyKind, &str)]| -> BTreeSet<TermId> {
        tags.iter()
            .filter_map(|(kind, slug)| {
                terms
                    .iter()
                    .find(|term| term.kind == *kind && term.slug == *slug)
                    .map(|term| term.id)
            })
            .collect()
    };

    let published = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).single();
    let mut programs = Vec::new();
    for (index, seed) in PROGRAMS.iter().enumerate() {
        let mut profile = ProgramProfile {
            city: Some(seed.city.to_string()),
            state: Some("NY".to_string()),
            ..ProgramProfile::default()
        };
        if index == 0 {
            profile.cost = Some("$500 per week".to_string());
            profile.application_deadline = NaiveDate::from_ymd_opt(2026, 3, 15);
            profile.application_selective = Selective::Yes;
            profile.website = Some("https://example.org/robotics".to_string());
            profile.program_summary = Some("Build and program competition robots.".to_string());
        }
        let program = directory
            .insert_program(NewProgram {
                parent_id: programs_page.id,
                title: seed.title.to_string(),
                slug: slugify(seed.title),
                live: seed.live,
                published_at: if seed.live { published } else { None },
                profile,
                terms: lookup(seed.tags),
            })
            .await?;
        programs.push(program);
    }

    let mut resources = Vec::new();
    for seed in RESOURCES {
        let resource = directory
            .insert_resource(NewResource {
                name: seed.name.to_string(),
                author: seed.author.to_string(),
                link: Some(seed.link.to_string()),
                image: None,
                age_group: seed.age_group.to_string(),
                live: seed.live,
                terms: lookup(seed.tags),
            })
            .await?;
        resources.push(resource);
    }

    Ok(DemoSite {
        home,
        about,
        programs_page,
        resources_page,
        contact_page,
        newsletters_page,
        newsletter_issue,
        terms,
        programs,
        resources,
    })
}
