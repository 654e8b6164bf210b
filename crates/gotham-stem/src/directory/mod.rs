//! Program and resource directory: taxonomy, faceted search, and listing pages.

pub mod domain;
pub mod facets;
pub mod pagination;
pub mod query;
pub mod repository;
pub mod router;
pub mod service;
pub mod taxonomy;
pub mod views;

#[cfg(test)]
mod tests;

pub use domain::{
    NewProgram, NewResource, Program, ProgramDraft, ProgramId, ProgramProfile, Resource,
    ResourceDraft, ResourceId, Selective,
};
pub use facets::{FacetDefinition, FilterSelection, Multiplicity, PROGRAM_FACETS, RESOURCE_FACETS};
pub use pagination::{PageWindow, Paginator};
pub use query::{FacetQuery, StatusScope};
pub use repository::DirectoryStore;
pub use router::directory_router;
pub use service::{DirectoryService, ProgramDetail, SearchResults, ESSENTIAL_INFO};
pub use taxonomy::{TaxonomyKind, TaxonomyOwner, TaxonomyTerm, TermId};
