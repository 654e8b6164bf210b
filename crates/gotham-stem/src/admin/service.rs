use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::export::{self, ExportFile};
use crate::directory::domain::{
    NewProgram, NewResource, Program, ProgramDraft, ProgramId, Resource, ResourceDraft, ResourceId,
};
use crate::directory::facets::{FilterSelection, PROGRAM_FACETS, RESOURCE_FACETS};
use crate::directory::query::{FacetQuery, StatusScope};
use crate::directory::repository::DirectoryStore;
use crate::directory::taxonomy::{
    slugify, TaxonomyKind, TaxonomyOwner, TaxonomyTerm, TermId, TermPatch, TermValidationError,
};
use crate::newsletter::domain::{Recipient, RecipientStore};
use crate::pages::domain::{Page, PageDraft, PageId, PagePatch, TreeError};
use crate::pages::repository::PageStore;
use crate::store::{Slice, StoreError};

/// Error raised by editor operations.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("conflicts with an existing record ({0})")]
    Conflict(String),
    #[error(transparent)]
    Store(StoreError),
    #[error("export failed: {0}")]
    Export(#[from] csv::Error),
}

impl From<StoreError> for AdminError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(constraint) => Self::Conflict(constraint),
            StoreError::NotFound => Self::NotFound("record"),
            other => Self::Store(other),
        }
    }
}

impl From<TermValidationError> for AdminError {
    fn from(value: TermValidationError) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<TreeError> for AdminError {
    fn from(value: TreeError) -> Self {
        Self::Validation(value.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TermInput {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

/// Admin program listing: `q`, `status` and the public facet parameters.
#[derive(Debug, Clone)]
pub struct ProgramListing {
    pub selection: FilterSelection,
    pub status: StatusScope,
}

impl ProgramListing {
    pub fn parse(raw_query: Option<&str>) -> Self {
        let selection = FilterSelection::parse(raw_query, &PROGRAM_FACETS);
        let status = raw_query
            .into_iter()
            .flat_map(|raw| url::form_urlencoded::parse(raw.as_bytes()))
            .find(|(key, _)| key == "status")
            .map(|(_, value)| match value.trim() {
                "live" => StatusScope::LiveOnly,
                "draft" => StatusScope::DraftOnly,
                _ => StatusScope::All,
            })
            .unwrap_or(StatusScope::All);
        Self { selection, status }
    }

    fn query(&self) -> FacetQuery {
        FacetQuery::from_selection(&self.selection).with_status(self.status)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Listing<T> {
    pub total: u64,
    pub items: Vec<T>,
}

pub struct AdminService {
    directory: Arc<dyn DirectoryStore>,
    pages: Arc<dyn PageStore>,
    recipients: Arc<dyn RecipientStore>,
}

impl AdminService {
    pub fn new(
        directory: Arc<dyn DirectoryStore>,
        pages: Arc<dyn PageStore>,
        recipients: Arc<dyn RecipientStore>,
    ) -> Self {
        Self {
            directory,
            pages,
            recipients,
        }
    }

    // Taxonomy

    pub async fn list_terms(
        &self,
        kind: TaxonomyKind,
        search: Option<&str>,
    ) -> Result<Vec<TaxonomyTerm>, AdminError> {
        let needle = search
            .map(|value| value.trim().to_lowercase())
            .filter(|value| !value.is_empty());
        let terms = self.directory.terms(kind).await?;
        Ok(match needle {
            Some(needle) => terms
                .into_iter()
                .filter(|term| term.name.to_lowercase().contains(&needle))
                .collect(),
            None => terms,
        })
    }

    pub async fn create_term(
        &self,
        kind: TaxonomyKind,
        input: TermInput,
    ) -> Result<TaxonomyTerm, AdminError> {
        let draft = TaxonomyTerm::draft(kind, &input.name, input.slug.as_deref())?;
        let term = self.directory.insert_term(draft).await?;
        info!(kind = %kind, slug = %term.slug, "taxonomy term created");
        Ok(term)
    }

    pub async fn update_term(
        &self,
        kind: TaxonomyKind,
        id: TermId,
        patch: TermPatch,
    ) -> Result<TaxonomyTerm, AdminError> {
        let current = self.term_of_kind(kind, id).await?;
        let updated = current.apply(&patch)?;
        Ok(self.directory.update_term(updated).await?)
    }

    pub async fn delete_term(&self, kind: TaxonomyKind, id: TermId) -> Result<(), AdminError> {
        self.term_of_kind(kind, id).await?;
        self.directory.delete_term(id).await?;
        info!(kind = %kind, term = %id, "taxonomy term deleted");
        Ok(())
    }

    async fn term_of_kind(&self, kind: TaxonomyKind, id: TermId) -> Result<TaxonomyTerm, AdminError> {
        self.directory
            .fetch_term(id)
            .await?
            .filter(|term| term.kind == kind)
            .ok_or(AdminError::NotFound("term"))
    }

    /// Every id must exist and belong to a taxonomy of `owner`.
    async fn validate_terms(
        &self,
        ids: &[TermId],
        owner: TaxonomyOwner,
    ) -> Result<BTreeSet<TermId>, AdminError> {
        let unique: BTreeSet<TermId> = ids.iter().copied().collect();
        if unique.is_empty() {
            return Ok(unique);
        }
        let wanted: Vec<TermId> = unique.iter().copied().collect();
        let found = self.directory.terms_by_ids(&wanted).await?;
        if found.len() != unique.len() {
            let known: BTreeSet<TermId> = found.iter().map(|term| term.id).collect();
            let missing: Vec<String> = unique
                .difference(&known)
                .map(|id| id.to_string())
                .collect();
            return Err(AdminError::Validation(format!(
                "unknown taxonomy terms: {}",
                missing.join(", ")
            )));
        }
        if let Some(term) = found.iter().find(|term| term.kind.owner() != owner) {
            return Err(AdminError::Validation(format!(
                "term '{}' ({}) cannot be used here",
                term.name,
                term.kind.label()
            )));
        }
        Ok(unique)
    }

    // Programs

    pub async fn list_programs(&self, listing: &ProgramListing) -> Result<Listing<Program>, AdminError> {
        let query = listing.query();
        let total = self.directory.count_programs(&query).await?;
        let items = self.directory.search_programs(&query, Slice::all()).await?;
        Ok(Listing { total, items })
    }

    pub async fn program(&self, id: ProgramId) -> Result<Program, AdminError> {
        self.directory
            .fetch_program(id)
            .await?
            .ok_or(AdminError::NotFound("program"))
    }

    async fn validate_program_parent(&self, parent_id: PageId) -> Result<(), AdminError> {
        let parent = self
            .pages
            .fetch_page(parent_id)
            .await?
            .ok_or_else(|| AdminError::Validation(format!("parent page {parent_id} does not exist")))?;
        if !parent.kind.accepts_programs() {
            return Err(AdminError::Validation(format!(
                "programs cannot be created under a {} page",
                parent.kind
            )));
        }
        Ok(())
    }

    fn program_title(draft: &ProgramDraft) -> Result<(String, String), AdminError> {
        let title = draft.title.trim().to_string();
        if title.is_empty() {
            return Err(AdminError::Validation("title must not be blank".to_string()));
        }
        let slug = draft.resolved_slug();
        if slug.is_empty() {
            return Err(AdminError::Validation(format!(
                "title '{title}' does not produce a usable slug"
            )));
        }
        Ok((title, slug))
    }

    pub async fn create_program(
        &self,
        draft: ProgramDraft,
        now: DateTime<Utc>,
    ) -> Result<Program, AdminError> {
        let (title, slug) = Self::program_title(&draft)?;
        self.validate_program_parent(draft.parent_id).await?;
        let terms = self.validate_terms(&draft.terms, TaxonomyOwner::Programs).await?;

        let program = self
            .directory
            .insert_program(NewProgram {
                parent_id: draft.parent_id,
                title,
                slug,
                live: draft.live,
                published_at: draft.live.then_some(now),
                profile: draft.profile,
                terms,
            })
            .await?;
        info!(program = %program.id, slug = %program.slug, live = program.live, "program created");
        Ok(program)
    }

    /// Replaces a program's content. The slug is kept unless the draft names a new one.
    pub async fn update_program(
        &self,
        id: ProgramId,
        draft: ProgramDraft,
        now: DateTime<Utc>,
    ) -> Result<Program, AdminError> {
        let mut program = self.program(id).await?;
        let (title, _) = Self::program_title(&draft)?;
        if draft.parent_id != program.parent_id {
            self.validate_program_parent(draft.parent_id).await?;
        }
        let terms = self.validate_terms(&draft.terms, TaxonomyOwner::Programs).await?;

        if let Some(slug) = draft.slug.as_deref().map(slugify).filter(|slug| !slug.is_empty()) {
            program.slug = slug;
        }
        program.parent_id = draft.parent_id;
        program.title = title;
        program.profile = draft.profile;
        program.terms = terms;
        program.set_live(draft.live, now);
        Ok(self.directory.update_program(program).await?)
    }

    pub async fn set_program_live(
        &self,
        id: ProgramId,
        live: bool,
        now: DateTime<Utc>,
    ) -> Result<Program, AdminError> {
        let mut program = self.program(id).await?;
        program.set_live(live, now);
        let program = self.directory.update_program(program).await?;
        info!(program = %program.id, live, "program publication changed");
        Ok(program)
    }

    pub async fn delete_program(&self, id: ProgramId) -> Result<(), AdminError> {
        self.program(id).await?;
        self.directory.delete_program(id).await?;
        info!(program = %id, "program deleted");
        Ok(())
    }

    pub async fn export_programs(&self, listing: &ProgramListing) -> Result<ExportFile, AdminError> {
        let programs = self.list_programs(listing).await?.items;
        Ok(export::programs_csv(&programs)?)
    }

    // Resources

    pub async fn list_resources(&self, raw_query: Option<&str>) -> Result<Listing<Resource>, AdminError> {
        let selection = FilterSelection::parse(raw_query, &RESOURCE_FACETS);
        let query = FacetQuery::from_selection(&selection).with_status(StatusScope::All);
        let total = self.directory.count_resources(&query).await?;
        let items = self.directory.search_resources(&query, Slice::all()).await?;
        Ok(Listing { total, items })
    }

    pub async fn resource(&self, id: ResourceId) -> Result<Resource, AdminError> {
        self.directory
            .fetch_resource(id)
            .await?
            .ok_or(AdminError::NotFound("resource"))
    }

    fn resource_name(draft: &ResourceDraft) -> Result<String, AdminError> {
        let name = draft.name.trim().to_string();
        if name.is_empty() {
            return Err(AdminError::Validation("name must not be blank".to_string()));
        }
        Ok(name)
    }

    pub async fn create_resource(&self, draft: ResourceDraft) -> Result<Resource, AdminError> {
        let name = Self::resource_name(&draft)?;
        let terms = self.validate_terms(&draft.terms, TaxonomyOwner::Resources).await?;
        let resource = self
            .directory
            .insert_resource(NewResource {
                name,
                author: draft.author.trim().to_string(),
                link: draft.link,
                image: draft.image,
                age_group: draft.age_group.trim().to_string(),
                live: draft.live,
                terms,
            })
            .await?;
        info!(resource = %resource.id, "resource created");
        Ok(resource)
    }

    pub async fn update_resource(
        &self,
        id: ResourceId,
        draft: ResourceDraft,
    ) -> Result<Resource, AdminError> {
        let mut resource = self.resource(id).await?;
        resource.name = Self::resource_name(&draft)?;
        resource.terms = self.validate_terms(&draft.terms, TaxonomyOwner::Resources).await?;
        resource.author = draft.author.trim().to_string();
        resource.link = draft.link;
        resource.image = draft.image;
        resource.age_group = draft.age_group.trim().to_string();
        resource.live = draft.live;
        Ok(self.directory.update_resource(resource).await?)
    }

    pub async fn delete_resource(&self, id: ResourceId) -> Result<(), AdminError> {
        self.resource(id).await?;
        self.directory.delete_resource(id).await?;
        info!(resource = %id, "resource deleted");
        Ok(())
    }

    pub async fn export_resources(&self, raw_query: Option<&str>) -> Result<ExportFile, AdminError> {
        let resources = self.list_resources(raw_query).await?.items;
        Ok(export::resources_csv(&resources)?)
    }

    // Pages

    pub async fn page(&self, id: PageId) -> Result<Page, AdminError> {
        self.pages
            .fetch_page(id)
            .await?
            .ok_or(AdminError::NotFound("page"))
    }

    async fn validate_featured(&self, featured: &[PageId]) -> Result<(), AdminError> {
        for id in featured {
            if self.pages.fetch_page(*id).await?.is_none() {
                return Err(AdminError::Validation(format!(
                    "featured page {id} does not exist"
                )));
            }
        }
        Ok(())
    }

    pub async fn create_page(&self, draft: PageDraft) -> Result<Page, AdminError> {
        let parent = self
            .pages
            .fetch_page(draft.parent_id)
            .await?
            .ok_or(AdminError::NotFound("parent page"))?;
        let new_page = draft.resolve(&parent)?;
        self.validate_featured(&new_page.featured).await?;
        let page = self.pages.insert_page(new_page).await?;
        info!(page = %page.id, kind = %page.kind, slug = %page.slug, "page created");
        Ok(page)
    }

    pub async fn update_page(&self, id: PageId, patch: PagePatch) -> Result<Page, AdminError> {
        let current = self.page(id).await?;
        if let Some(featured) = &patch.featured {
            self.validate_featured(featured).await?;
        }
        let updated = current.apply(patch)?;
        Ok(self.pages.update_page(updated).await?)
    }

    /// Children of a page; `None` lists the top of the tree.
    pub async fn page_children(&self, parent: Option<PageId>) -> Result<Vec<Page>, AdminError> {
        let parent = match parent {
            Some(id) => self.page(id).await?,
            None => self.pages.root().await?,
        };
        Ok(self.pages.children(parent.id).await?)
    }

    // Recipients

    pub async fn recipients(&self) -> Result<Vec<Recipient>, AdminError> {
        Ok(self.recipients.recipients().await?)
    }

    pub async fn export_recipients(&self) -> Result<ExportFile, AdminError> {
        let recipients = self.recipients().await?;
        Ok(export::recipients_csv(&recipients)?)
    }
}
