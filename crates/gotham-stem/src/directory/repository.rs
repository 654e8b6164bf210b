use async_trait::async_trait;

use super::domain::{NewProgram, NewResource, Program, ProgramId, Resource, ResourceId};
use super::query::FacetQuery;
use super::taxonomy::{NewTerm, TaxonomyKind, TaxonomyTerm, TermId};
use crate::store::{Slice, StoreError};

/// Storage abstraction for taxonomy terms, programs and resources.
///
/// Listing methods return records in creation order. Deleting a term removes its
/// association rows but never the tagged records.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn insert_term(&self, term: NewTerm) -> Result<TaxonomyTerm, StoreError>;
    async fn update_term(&self, term: TaxonomyTerm) -> Result<TaxonomyTerm, StoreError>;
    async fn delete_term(&self, id: TermId) -> Result<(), StoreError>;
    async fn fetch_term(&self, id: TermId) -> Result<Option<TaxonomyTerm>, StoreError>;
    /// Terms of one kind ordered by name.
    async fn terms(&self, kind: TaxonomyKind) -> Result<Vec<TaxonomyTerm>, StoreError>;
    async fn terms_by_ids(&self, ids: &[TermId]) -> Result<Vec<TaxonomyTerm>, StoreError>;

    async fn insert_program(&self, program: NewProgram) -> Result<Program, StoreError>;
    async fn update_program(&self, program: Program) -> Result<Program, StoreError>;
    async fn delete_program(&self, id: ProgramId) -> Result<(), StoreError>;
    async fn fetch_program(&self, id: ProgramId) -> Result<Option<Program>, StoreError>;
    async fn program_by_slug(&self, slug: &str) -> Result<Option<Program>, StoreError>;
    async fn count_programs(&self, query: &FacetQuery) -> Result<u64, StoreError>;
    async fn search_programs(
        &self,
        query: &FacetQuery,
        slice: Slice,
    ) -> Result<Vec<Program>, StoreError>;

    async fn insert_resource(&self, resource: NewResource) -> Result<Resource, StoreError>;
    async fn update_resource(&self, resource: Resource) -> Result<Resource, StoreError>;
    async fn delete_resource(&self, id: ResourceId) -> Result<(), StoreError>;
    async fn fetch_resource(&self, id: ResourceId) -> Result<Option<Resource>, StoreError>;
    async fn count_resources(&self, query: &FacetQuery) -> Result<u64, StoreError>;
    async fn search_resources(
        &self,
        query: &FacetQuery,
        slice: Slice,
    ) -> Result<Vec<Resource>, StoreError>;
}
