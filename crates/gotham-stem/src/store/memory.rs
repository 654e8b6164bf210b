use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{Slice, StoreError};
use crate::directory::domain::{NewProgram, NewResource, Program, ProgramId, Resource, ResourceId};
use crate::directory::query::FacetQuery;
use crate::directory::repository::DirectoryStore;
use crate::directory::taxonomy::{NewTerm, TaxonomyKind, TaxonomyTerm, TermId};
use crate::newsletter::domain::{Recipient, RecipientId, RecipientStore};
use crate::pages::domain::{NewPage, Page, PageId, PageKind};
use crate::pages::repository::PageStore;

/// Mutex-guarded store used by the development server and the test suites.
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug)]
struct MemoryState {
    next_id: i64,
    root: PageId,
    terms: BTreeMap<TermId, TaxonomyTerm>,
    programs: BTreeMap<ProgramId, Program>,
    resources: BTreeMap<ResourceId, Resource>,
    pages: BTreeMap<PageId, Page>,
    recipients: BTreeMap<RecipientId, Recipient>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn check_term_unique(&self, candidate: &TaxonomyTerm) -> Result<(), StoreError> {
        for term in self.terms.values() {
            if term.id == candidate.id || term.kind != candidate.kind {
                continue;
            }
            if term.name == candidate.name {
                return Err(StoreError::Conflict("taxonomy_terms_kind_name_key".into()));
            }
            if term.slug == candidate.slug {
                return Err(StoreError::Conflict("taxonomy_terms_kind_slug_key".into()));
            }
        }
        Ok(())
    }

    fn check_terms_exist(&self, terms: &BTreeSet<TermId>) -> Result<(), StoreError> {
        if terms.iter().all(|id| self.terms.contains_key(id)) {
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }

    fn check_program_slug(&self, id: Option<ProgramId>, slug: &str) -> Result<(), StoreError> {
        let taken = self
            .programs
            .values()
            .any(|program| Some(program.id) != id && program.slug == slug);
        if taken {
            Err(StoreError::Conflict("programs_slug_key".into()))
        } else {
            Ok(())
        }
    }

    fn check_sibling_slug(
        &self,
        id: Option<PageId>,
        parent: Option<PageId>,
        slug: &str,
    ) -> Result<(), StoreError> {
        let taken = self
            .pages
            .values()
            .any(|page| Some(page.id) != id && page.parent_id == parent && page.slug == slug);
        if taken {
            Err(StoreError::Conflict("pages_parent_id_slug_key".into()))
        } else {
            Ok(())
        }
    }

    fn matching_programs(&self, query: &FacetQuery) -> Vec<Program> {
        self.programs
            .values()
            .filter(|program| query.status.admits(program.live))
            .filter(|program| query.parent.map_or(true, |parent| program.parent_id == parent))
            .filter(|program| query.matches_text(&program.title))
            .filter(|program| query.matches_terms(&program.terms, |id| self.terms.get(&id)))
            .cloned()
            .collect()
    }

    fn matching_resources(&self, query: &FacetQuery) -> Vec<Resource> {
        self.resources
            .values()
            .filter(|resource| query.status.admits(resource.live))
            .filter(|resource| query.matches_text(&resource.name))
            .filter(|resource| query.matches_terms(&resource.terms, |id| self.terms.get(&id)))
            .cloned()
            .collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let root = PageId(1);
        let mut pages = BTreeMap::new();
        pages.insert(
            root,
            Page {
                id: root,
                parent_id: None,
                kind: PageKind::Root,
                title: "Root".to_string(),
                slug: "root".to_string(),
                live: true,
                show_in_menu: false,
                hero_image: None,
                intro: String::new(),
                body: Vec::new(),
                featured: Vec::new(),
            },
        );

        Self {
            state: Mutex::new(MemoryState {
                next_id: 2,
                root,
                terms: BTreeMap::new(),
                programs: BTreeMap::new(),
                resources: BTreeMap::new(),
                pages,
                recipients: BTreeMap::new(),
            }),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().expect("memory store mutex poisoned")
    }
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn insert_term(&self, term: NewTerm) -> Result<TaxonomyTerm, StoreError> {
        let mut state = self.state();
        let mut stored = TaxonomyTerm {
            id: TermId(0),
            kind: term.kind,
            name: term.name,
            slug: term.slug,
        };
        state.check_term_unique(&stored)?;
        stored.id = TermId(state.next_id());
        state.terms.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_term(&self, term: TaxonomyTerm) -> Result<TaxonomyTerm, StoreError> {
        let mut state = self.state();
        if !state.terms.contains_key(&term.id) {
            return Err(StoreError::NotFound);
        }
        state.check_term_unique(&term)?;
        state.terms.insert(term.id, term.clone());
        Ok(term)
    }

    async fn delete_term(&self, id: TermId) -> Result<(), StoreError> {
        let mut state = self.state();
        state.terms.remove(&id).ok_or(StoreError::NotFound)?;
        for program in state.programs.values_mut() {
            program.terms.remove(&id);
        }
        for resource in state.resources.values_mut() {
            resource.terms.remove(&id);
        }
        Ok(())
    }

    async fn fetch_term(&self, id: TermId) -> Result<Option<TaxonomyTerm>, StoreError> {
        Ok(self.state().terms.get(&id).cloned())
    }

    async fn terms(&self, kind: TaxonomyKind) -> Result<Vec<TaxonomyTerm>, StoreError> {
        let mut terms: Vec<TaxonomyTerm> = self
            .state()
            .terms
            .values()
            .filter(|term| term.kind == kind)
            .cloned()
            .collect();
        terms.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(terms)
    }

    async fn terms_by_ids(&self, ids: &[TermId]) -> Result<Vec<TaxonomyTerm>, StoreError> {
        let state = self.state();
        let mut terms: Vec<TaxonomyTerm> = ids
            .iter()
            .filter_map(|id| state.terms.get(id).cloned())
            .collect();
        terms.sort_by(|left, right| left.name.cmp(&right.name));
        terms.dedup_by_key(|term| term.id);
        Ok(terms)
    }

    async fn insert_program(&self, program: NewProgram) -> Result<Program, StoreError> {
        let mut state = self.state();
        if !state.pages.contains_key(&program.parent_id) {
            return Err(StoreError::NotFound);
        }
        state.check_terms_exist(&program.terms)?;
        state.check_program_slug(None, &program.slug)?;

        let stored = Program {
            id: ProgramId(state.next_id()),
            parent_id: program.parent_id,
            title: program.title,
            slug: program.slug,
            live: program.live,
            first_published_at: program.published_at,
            last_published_at: program.published_at,
            profile: program.profile,
            terms: program.terms,
        };
        state.programs.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_program(&self, program: Program) -> Result<Program, StoreError> {
        let mut state = self.state();
        if !state.programs.contains_key(&program.id) {
            return Err(StoreError::NotFound);
        }
        if !state.pages.contains_key(&program.parent_id) {
            return Err(StoreError::NotFound);
        }
        state.check_terms_exist(&program.terms)?;
        state.check_program_slug(Some(program.id), &program.slug)?;
        state.programs.insert(program.id, program.clone());
        Ok(program)
    }

    async fn delete_program(&self, id: ProgramId) -> Result<(), StoreError> {
        self.state()
            .programs
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn fetch_program(&self, id: ProgramId) -> Result<Option<Program>, StoreError> {
        Ok(self.state().programs.get(&id).cloned())
    }

    async fn program_by_slug(&self, slug: &str) -> Result<Option<Program>, StoreError> {
        Ok(self
            .state()
            .programs
            .values()
            .find(|program| program.slug == slug)
            .cloned())
    }

    async fn count_programs(&self, query: &FacetQuery) -> Result<u64, StoreError> {
        Ok(self.state().matching_programs(query).len() as u64)
    }

    async fn search_programs(
        &self,
        query: &FacetQuery,
        slice: Slice,
    ) -> Result<Vec<Program>, StoreError> {
        Ok(slice.apply(self.state().matching_programs(query)))
    }

    async fn insert_resource(&self, resource: NewResource) -> Result<Resource, StoreError> {
        let mut state = self.state();
        state.check_terms_exist(&resource.terms)?;
        let stored = Resource {
            id: ResourceId(state.next_id()),
            name: resource.name,
            author: resource.author,
            link: resource.link,
            image: resource.image,
            age_group: resource.age_group,
            live: resource.live,
            terms: resource.terms,
        };
        state.resources.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_resource(&self, resource: Resource) -> Result<Resource, StoreError> {
        let mut state = self.state();
        if !state.resources.contains_key(&resource.id) {
            return Err(StoreError::NotFound);
        }
        state.check_terms_exist(&resource.terms)?;
        state.resources.insert(resource.id, resource.clone());
        Ok(resource)
    }

    async fn delete_resource(&self, id: ResourceId) -> Result<(), StoreError> {
        self.state()
            .resources
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn fetch_resource(&self, id: ResourceId) -> Result<Option<Resource>, StoreError> {
        Ok(self.state().resources.get(&id).cloned())
    }

    async fn count_resources(&self, query: &FacetQuery) -> Result<u64, StoreError> {
        Ok(self.state().matching_resources(query).len() as u64)
    }

    async fn search_resources(
        &self,
        query: &FacetQuery,
        slice: Slice,
    ) -> Result<Vec<Resource>, StoreError> {
        Ok(slice.apply(self.state().matching_resources(query)))
    }
}

#[async_trait]
impl PageStore for MemoryStore {
    async fn root(&self) -> Result<Page, StoreError> {
        let state = self.state();
        state
            .pages
            .get(&state.root)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn insert_page(&self, page: NewPage) -> Result<Page, StoreError> {
        let mut state = self.state();
        if !state.pages.contains_key(&page.parent_id) {
            return Err(StoreError::NotFound);
        }
        state.check_sibling_slug(None, Some(page.parent_id), &page.slug)?;

        let stored = Page {
            id: PageId(state.next_id()),
            parent_id: Some(page.parent_id),
            kind: page.kind,
            title: page.title,
            slug: page.slug,
            live: page.live,
            show_in_menu: page.show_in_menu,
            hero_image: page.hero_image,
            intro: page.intro,
            body: page.body,
            featured: page.featured,
        };
        state.pages.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_page(&self, page: Page) -> Result<Page, StoreError> {
        let mut state = self.state();
        if !state.pages.contains_key(&page.id) {
            return Err(StoreError::NotFound);
        }
        state.check_sibling_slug(Some(page.id), page.parent_id, &page.slug)?;
        state.pages.insert(page.id, page.clone());
        Ok(page)
    }

    async fn fetch_page(&self, id: PageId) -> Result<Option<Page>, StoreError> {
        Ok(self.state().pages.get(&id).cloned())
    }

    async fn children(&self, parent: PageId) -> Result<Vec<Page>, StoreError> {
        Ok(self
            .state()
            .pages
            .values()
            .filter(|page| page.parent_id == Some(parent))
            .cloned()
            .collect())
    }

    async fn pages_of_kind(&self, kind: PageKind) -> Result<Vec<Page>, StoreError> {
        Ok(self
            .state()
            .pages
            .values()
            .filter(|page| page.kind == kind)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RecipientStore for MemoryStore {
    async fn upsert_active(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<(Recipient, bool), StoreError> {
        let mut state = self.state();
        if let Some(existing) = state
            .recipients
            .values_mut()
            .find(|recipient| recipient.email == email)
        {
            existing.active = true;
            existing.modified = now;
            return Ok((existing.clone(), false));
        }

        let recipient = Recipient {
            id: RecipientId(state.next_id()),
            email: email.to_string(),
            active: true,
            created: now,
            modified: now,
        };
        state.recipients.insert(recipient.id, recipient.clone());
        Ok((recipient, true))
    }

    async fn find_recipient(&self, email: &str) -> Result<Option<Recipient>, StoreError> {
        Ok(self
            .state()
            .recipients
            .values()
            .find(|recipient| recipient.email == email)
            .cloned())
    }

    async fn deactivate(&self, email: &str, now: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut state = self.state();
        match state
            .recipients
            .values_mut()
            .find(|recipient| recipient.email == email && recipient.active)
        {
            Some(recipient) => {
                recipient.active = false;
                recipient.modified = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn recipients(&self) -> Result<Vec<Recipient>, StoreError> {
        let mut recipients: Vec<Recipient> = self.state().recipients.values().cloned().collect();
        recipients.sort_by(|left, right| {
            right
                .modified
                .cmp(&left.modified)
                .then(right.id.cmp(&left.id))
        });
        Ok(recipients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::domain::ProgramProfile;

    fn new_term(kind: TaxonomyKind, name: &str) -> NewTerm {
        TaxonomyTerm::draft(kind, name, None).expect("valid term")
    }

    async fn program_index(store: &MemoryStore) -> PageId {
        let root = store.root().await.expect("root exists");
        let home = store
            .insert_page(NewPage {
                parent_id: root.id,
                kind: PageKind::Home,
                title: "Home".into(),
                slug: "home".into(),
                live: true,
                show_in_menu: false,
                hero_image: None,
                intro: String::new(),
                body: Vec::new(),
                featured: Vec::new(),
            })
            .await
            .expect("home inserted");
        store
            .insert_page(NewPage {
                parent_id: home.id,
                kind: PageKind::ProgramIndex,
                title: "Programs".into(),
                slug: "programs".into(),
                live: true,
                show_in_menu: true,
                hero_image: None,
                intro: String::new(),
                body: Vec::new(),
                featured: Vec::new(),
            })
            .await
            .expect("index inserted")
            .id
    }

    #[tokio::test]
    async fn term_names_and_slugs_are_unique_per_kind() {
        let store = MemoryStore::new();
        store
            .insert_term(new_term(TaxonomyKind::ProgramType, "Camp"))
            .await
            .expect("first insert");

        let duplicate = store
            .insert_term(new_term(TaxonomyKind::ProgramType, "Camp"))
            .await;
        assert!(matches!(duplicate, Err(StoreError::Conflict(_))));

        store
            .insert_term(new_term(TaxonomyKind::FocusTopic, "Camp"))
            .await
            .expect("other kinds may reuse names");
    }

    #[tokio::test]
    async fn deleting_a_term_keeps_tagged_programs() {
        let store = MemoryStore::new();
        let parent = program_index(&store).await;
        let camp = store
            .insert_term(new_term(TaxonomyKind::ProgramType, "Camp"))
            .await
            .expect("term inserted");
        let program = store
            .insert_program(NewProgram {
                parent_id: parent,
                title: "Code Camp".into(),
                slug: "code-camp".into(),
                live: true,
                published_at: None,
                profile: ProgramProfile::default(),
                terms: BTreeSet::from([camp.id]),
            })
            .await
            .expect("program inserted");

        store.delete_term(camp.id).await.expect("term deleted");

        let reloaded = store
            .fetch_program(program.id)
            .await
            .expect("fetch succeeds")
            .expect("program survives");
        assert!(reloaded.terms.is_empty());
    }

    #[tokio::test]
    async fn programs_reject_unknown_terms_and_duplicate_slugs() {
        let store = MemoryStore::new();
        let parent = program_index(&store).await;
        let draft = NewProgram {
            parent_id: parent,
            title: "Code Camp".into(),
            slug: "code-camp".into(),
            live: true,
            published_at: None,
            profile: ProgramProfile::default(),
            terms: BTreeSet::from([TermId(999)]),
        };
        assert!(matches!(
            store.insert_program(draft.clone()).await,
            Err(StoreError::NotFound)
        ));

        let valid = NewProgram {
            terms: BTreeSet::new(),
            ..draft
        };
        store
            .insert_program(valid.clone())
            .await
            .expect("inserted");
        assert!(matches!(
            store.insert_program(valid).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn sibling_pages_need_distinct_slugs() {
        let store = MemoryStore::new();
        let parent = program_index(&store).await;
        let home = store
            .fetch_page(parent)
            .await
            .expect("fetch")
            .and_then(|page| page.parent_id)
            .expect("index has a parent");

        let duplicate = store
            .insert_page(NewPage {
                parent_id: home,
                kind: PageKind::About,
                title: "Programs".into(),
                slug: "programs".into(),
                live: true,
                show_in_menu: false,
                hero_image: None,
                intro: String::new(),
                body: Vec::new(),
                featured: Vec::new(),
            })
            .await;
        assert!(matches!(duplicate, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn upsert_creates_once_and_reactivates() {
        let store = MemoryStore::new();
        let now = Utc::now();

        let (first, created) = store
            .upsert_active("ada@example.org", now)
            .await
            .expect("created");
        assert!(created);
        assert!(store
            .deactivate("ada@example.org", now)
            .await
            .expect("deactivated"));
        assert!(!store
            .deactivate("ada@example.org", now)
            .await
            .expect("already inactive"));

        let (second, created) = store
            .upsert_active("ada@example.org", now)
            .await
            .expect("updated");
        assert!(!created);
        assert_eq!(first.id, second.id);
        assert!(second.active);
        assert_eq!(store.recipients().await.expect("listed").len(), 1);
    }
}
