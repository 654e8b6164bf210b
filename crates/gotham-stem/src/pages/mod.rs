//! Page tree, site chrome, and the public content routes.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use domain::{
    validate_placement, ContentBlock, NewPage, Page, PageDraft, PageId, PageKind, PagePatch,
    TreeError, MAX_FEATURED,
};
pub use repository::PageStore;
pub use router::{pages_router, SiteState};
pub use service::{FeaturedCard, NavLink, SiteChrome, SiteService};
