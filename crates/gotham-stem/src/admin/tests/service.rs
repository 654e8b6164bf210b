use super::common::*;
use chrono::{TimeZone, Utc};

use crate::admin::{AdminError, ProgramListing, TermInput};
use crate::directory::domain::{ProgramDraft, ProgramProfile};
use crate::directory::taxonomy::{TaxonomyKind, TermPatch};
use crate::pages::domain::{PageDraft, PageKind};

fn term_input(name: &str) -> TermInput {
    TermInput {
        name: name.to_string(),
        slug: None,
    }
}

fn program_draft(parent: crate::pages::PageId, title: &str) -> ProgramDraft {
    ProgramDraft {
        parent_id: parent,
        title: title.to_string(),
        slug: None,
        live: true,
        profile: ProgramProfile::default(),
        terms: Vec::new(),
    }
}

fn page_draft(parent: crate::pages::PageId, kind: PageKind, title: &str) -> PageDraft {
    PageDraft {
        parent_id: parent,
        kind,
        title: title.to_string(),
        slug: None,
        live: true,
        show_in_menu: false,
        hero_image: None,
        intro: String::new(),
        body: Vec::new(),
        featured: Vec::new(),
    }
}

#[tokio::test]
async fn term_slugs_change_only_on_explicit_reset() {
    let (store, _) = seeded().await;
    let admin = admin_service(&store);

    let term = admin
        .create_term(TaxonomyKind::FocusTopic, term_input("Marine Science"))
        .await
        .expect("create term");
    assert_eq!(term.slug, "marine-science");

    let renamed = admin
        .update_term(
            TaxonomyKind::FocusTopic,
            term.id,
            TermPatch {
                name: Some("Ocean Science".to_string()),
                reset_slug: false,
            },
        )
        .await
        .expect("rename");
    assert_eq!(renamed.name, "Ocean Science");
    assert_eq!(renamed.slug, "marine-science");

    let reset = admin
        .update_term(
            TaxonomyKind::FocusTopic,
            term.id,
            TermPatch {
                name: None,
                reset_slug: true,
            },
        )
        .await
        .expect("reset slug");
    assert_eq!(reset.slug, "ocean-science");
}

#[tokio::test]
async fn duplicate_terms_conflict_and_kinds_are_checked() {
    let (store, demo) = seeded().await;
    let admin = admin_service(&store);

    let duplicate = admin
        .create_term(TaxonomyKind::ProgramType, term_input("Camp"))
        .await;
    assert!(matches!(duplicate, Err(AdminError::Conflict(_))));

    let camp = demo
        .term(TaxonomyKind::ProgramType, "camp")
        .expect("seeded term");
    let wrong_kind = admin.delete_term(TaxonomyKind::AgeGroup, camp).await;
    assert!(matches!(wrong_kind, Err(AdminError::NotFound(_))));

    let filtered = admin
        .list_terms(TaxonomyKind::ProgramType, Some("CL"))
        .await
        .expect("list");
    assert_eq!(
        filtered.iter().map(|term| term.name.as_str()).collect::<Vec<_>>(),
        vec!["Class"]
    );
}

#[tokio::test]
async fn programs_must_live_under_a_program_index() {
    let (store, demo) = seeded().await;
    let admin = admin_service(&store);
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();

    let misplaced = admin
        .create_program(program_draft(demo.about.id, "Chess Club"), now)
        .await;
    assert!(matches!(misplaced, Err(AdminError::Validation(_))));

    let created = admin
        .create_program(program_draft(demo.programs_page.id, "Chess Club"), now)
        .await
        .expect("create program");
    assert_eq!(created.slug, "chess-club");
    assert_eq!(created.first_published_at, Some(now));
    assert_eq!(created.last_published_at, Some(now));

    let duplicate = admin
        .create_program(program_draft(demo.programs_page.id, "Chess  Club"), now)
        .await;
    assert!(matches!(duplicate, Err(AdminError::Conflict(_))));
}

#[tokio::test]
async fn program_terms_must_exist_and_belong_to_programs() {
    let (store, demo) = seeded().await;
    let admin = admin_service(&store);
    let now = Utc::now();

    let mut with_resource_term = program_draft(demo.programs_page.id, "Book Club");
    with_resource_term.terms = vec![demo
        .term(TaxonomyKind::ResourceCategory, "books")
        .expect("seeded term")];
    let rejected = admin.create_program(with_resource_term, now).await;
    assert!(matches!(rejected, Err(AdminError::Validation(_))));

    let mut with_unknown_term = program_draft(demo.programs_page.id, "Book Club");
    with_unknown_term.terms = vec![crate::directory::TermId(999_999)];
    let rejected = admin.create_program(with_unknown_term, now).await;
    assert!(matches!(rejected, Err(AdminError::Validation(message)) if message.contains("999999")));
}

#[tokio::test]
async fn publishing_keeps_first_publication_and_slug() {
    let (store, demo) = seeded().await;
    let admin = admin_service(&store);
    let first = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let later = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();

    let mut draft = program_draft(demo.programs_page.id, "Astronomy Nights");
    draft.live = false;
    let program = admin.create_program(draft, first).await.expect("create");
    assert_eq!(program.first_published_at, None);

    let live = admin
        .set_program_live(program.id, true, first)
        .await
        .expect("publish");
    admin
        .set_program_live(live.id, false, first)
        .await
        .expect("unpublish");
    let republished = admin
        .set_program_live(live.id, true, later)
        .await
        .expect("republish");
    assert_eq!(republished.first_published_at, Some(first));
    assert_eq!(republished.last_published_at, Some(later));

    let retitled = admin
        .update_program(
            program.id,
            program_draft(demo.programs_page.id, "Astronomy After Dark"),
            later,
        )
        .await
        .expect("update");
    assert_eq!(retitled.title, "Astronomy After Dark");
    assert_eq!(retitled.slug, "astronomy-nights");
}

#[tokio::test]
async fn program_listing_filters_by_status() {
    let (store, _) = seeded().await;
    let admin = admin_service(&store);

    let drafts = admin
        .list_programs(&ProgramListing::parse(Some("status=draft")))
        .await
        .expect("list");
    assert_eq!(drafts.total, 1);
    assert_eq!(drafts.items[0].title, "Quantum Computing Preview");

    let everything = admin
        .list_programs(&ProgramListing::parse(None))
        .await
        .expect("list");
    assert_eq!(everything.total, 13);
}

#[tokio::test]
async fn page_creation_follows_tree_rules() {
    let (store, demo) = seeded().await;
    let admin = admin_service(&store);

    let illegal = admin
        .create_page(page_draft(demo.home.id, PageKind::Newsletter, "Loose Issue"))
        .await;
    assert!(matches!(illegal, Err(AdminError::Validation(_))));

    let guidance = admin
        .create_page(page_draft(demo.home.id, PageKind::Guidance, "For Parents"))
        .await
        .expect("create page");
    assert_eq!(guidance.slug, "for-parents");

    let sibling = admin
        .create_page(page_draft(demo.home.id, PageKind::About, "For Parents"))
        .await;
    assert!(matches!(sibling, Err(AdminError::Conflict(_))));

    let children = admin
        .page_children(Some(demo.home.id))
        .await
        .expect("children");
    assert_eq!(children.last().map(|page| page.id), Some(guidance.id));
}
